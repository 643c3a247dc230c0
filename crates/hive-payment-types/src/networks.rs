//! The two networks the payment contract is deployed on.
//!
//! Hive node payments target exactly one contract on one of two Elastos Smart
//! Chain networks. The network is picked once, when a payment client is built,
//! and its [`NetworkProfile`] is never mutated afterwards.
//!
//! # Example
//!
//! ```
//! use hive_payment_types::networks::{Network, NetworkProfile};
//!
//! let profile = Network::from_testnet(true).profile();
//! assert_eq!(profile.chain_reference, 21);
//! assert_eq!(*profile, NetworkProfile::test());
//! ```

use alloy_primitives::{Address, address};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;
use url::Url;

use crate::config::RpcConfig;

/// Network selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    /// Elastos Smart Chain mainnet.
    #[default]
    Production,
    /// Elastos Smart Chain testnet.
    Test,
}

impl Network {
    /// Maps the boolean test-mode flag onto a network.
    pub fn from_testnet(testnet: bool) -> Self {
        if testnet {
            Network::Test
        } else {
            Network::Production
        }
    }

    /// The immutable profile of this network.
    pub fn profile(&self) -> &'static NetworkProfile {
        match self {
            Network::Production => &PRODUCTION,
            Network::Test => &TEST,
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Network::Production => write!(f, "production"),
            Network::Test => write!(f, "test"),
        }
    }
}

/// Everything needed to reach the payment contract on one network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkProfile {
    pub network: Network,
    /// EIP-155 chain id the contract is deployed on.
    pub chain_reference: u64,
    /// JSON-RPC endpoints keyed by chain id.
    pub rpc_endpoints: BTreeMap<u64, Url>,
    /// Bridge used by remote wallets to relay session traffic.
    pub session_bridge_url: Url,
    /// Address of the payment contract.
    pub contract_address: Address,
}

impl NetworkProfile {
    pub fn production() -> Self {
        PRODUCTION.clone()
    }

    pub fn test() -> Self {
        TEST.clone()
    }

    /// RPC configuration for the profile's own chain.
    pub fn rpc(&self, rate_limit: Option<u32>) -> Vec<RpcConfig> {
        self.rpc_endpoints
            .get(&self.chain_reference)
            .map(|url| RpcConfig::new(url.clone()).with_rate_limit(rate_limit))
            .into_iter()
            .collect()
    }
}

const SESSION_BRIDGE: &str = "https://walletconnect.elastos.net/v2";

static PRODUCTION: LazyLock<NetworkProfile> = LazyLock::new(|| NetworkProfile {
    network: Network::Production,
    chain_reference: 20,
    rpc_endpoints: BTreeMap::from([(20, parse_url("https://api.elastos.io/eth"))]),
    session_bridge_url: parse_url(SESSION_BRIDGE),
    contract_address: address!("0x59E9f4ff80f3B3A4810b5264EB713DC04F9DFC31"),
});

static TEST: LazyLock<NetworkProfile> = LazyLock::new(|| NetworkProfile {
    network: Network::Test,
    chain_reference: 21,
    rpc_endpoints: BTreeMap::from([(21, parse_url("https://api-testnet.elastos.io/eth"))]),
    session_bridge_url: parse_url(SESSION_BRIDGE),
    contract_address: address!("0x81897263EC51A2314d256703b2B9f57664B772a9"),
});

fn parse_url(s: &str) -> Url {
    Url::parse(s).expect("valid built-in url")
}
