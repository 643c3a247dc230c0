//! Configuration of the `hive-payment` binary.
//!
//! Command line arguments are parsed with clap; everything else comes from a
//! JSON file. Secrets in the file may reference environment variables:
//!
//! ```json
//! {
//!   "network": "test",
//!   "signer": "$HIVE_PAYMENT_PRIVATE_KEY",
//!   "rate_limit": 20,
//!   "timeout_secs": 120,
//!   "poll_interval_secs": 5,
//!   "max_block_range": 1000
//! }
//! ```

use clap::{Parser, Subcommand};
use hive_payment_eip155::EvmPrivateKey;
use hive_payment_types::config::LiteralOrEnv;
use hive_payment_types::networks::Network;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Extra time the binary waits for `pay` beyond the receipt timeout, so that the
/// chain client reports its own timeout first.
pub const PAY_TIMEOUT_MARGIN: Duration = Duration::from_secs(30);

/// CLI arguments of the `hive-payment` binary.
#[derive(Parser, Debug)]
#[command(name = "hive-payment")]
#[command(about = "Pay hive node orders on Elastos Smart Chain")]
pub struct CliArgs {
    /// Path to the JSON configuration file
    #[arg(long, short, env = "CONFIG", default_value = "config.json")]
    pub config: PathBuf,
    /// Use the test network regardless of the configuration file
    #[arg(long)]
    pub testnet: bool,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Print the paying account
    Account,
    /// Pay an order and print the order id assigned by the contract
    Pay {
        /// Amount in ELA, for example 2.5
        #[arg(long)]
        amount: String,
        /// Hive node wallet address
        #[arg(long)]
        to: String,
        /// Proof returned by the hive node when placing the order
        #[arg(long)]
        memo: String,
    },
    /// List orders paid by the account
    Orders,
    /// Show one order by id
    Order {
        #[arg(long)]
        id: u64,
    },
    /// Show the account's order at an index
    OrderAt {
        #[arg(long)]
        index: u64,
    },
    /// Count orders paid by the account
    OrderCount,
    /// Show the platform fee
    PlatformFee,
    /// Print OrderPay events as they are mined
    Watch,
}

/// Settings loaded from the configuration file.
#[derive(Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    network: Network,
    signer: LiteralOrEnv<EvmPrivateKey>,
    #[serde(default)]
    rate_limit: Option<u32>,
    #[serde(default = "config_defaults::default_timeout_secs")]
    timeout_secs: u64,
    #[serde(default = "config_defaults::default_poll_interval_secs")]
    poll_interval_secs: u64,
    #[serde(default = "config_defaults::default_max_block_range")]
    max_block_range: u64,
}

mod config_defaults {
    pub fn default_timeout_secs() -> u64 {
        120
    }
    pub fn default_poll_interval_secs() -> u64 {
        5
    }
    pub fn default_max_block_range() -> u64 {
        crate::watch::DEFAULT_MAX_BLOCK_RANGE
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("network", &self.network)
            .field("signer", &"<redacted>")
            .field("rate_limit", &self.rate_limit)
            .field("timeout_secs", &self.timeout_secs)
            .field("poll_interval_secs", &self.poll_interval_secs)
            .field("max_block_range", &self.max_block_range)
            .finish()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {0}: {1}")]
    FileRead(PathBuf, std::io::Error),
    #[error("Failed to parse config file: {0}")]
    JsonParse(#[from] serde_json::Error),
}

impl Config {
    /// The network to pay on. `testnet` forces the test network.
    pub fn network(&self, testnet: bool) -> Network {
        if testnet { Network::Test } else { self.network }
    }

    pub fn signer(&self) -> &EvmPrivateKey {
        self.signer.inner()
    }

    pub fn rate_limit(&self) -> Option<u32> {
        self.rate_limit
    }

    /// How long the chain client waits for a payment receipt.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// How long the binary waits for `pay` before giving up.
    /// Always longer than [`Config::timeout`].
    pub fn pay_timeout(&self) -> Duration {
        self.timeout() + PAY_TIMEOUT_MARGIN
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    /// Blocks covered by one `OrderPay` log request.
    pub fn max_block_range(&self) -> u64 {
        self.max_block_range
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let path = path
            .canonicalize()
            .map_err(|e| ConfigError::FileRead(path.to_path_buf(), e))?;
        Self::load_from_path(path)
    }

    fn load_from_path(path: PathBuf) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(&path).map_err(|e| ConfigError::FileRead(path, e))?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(content)?)
    }
}
