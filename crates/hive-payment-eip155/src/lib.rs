//! EIP-155 (EVM) support for hive node payments.
//!
//! This crate binds the payment core from `hive-payment-types` to an EVM chain:
//!
//! - [`contract`] - Solidity bindings of the payment contract and [`PaymentContractHandle`],
//!   which encodes calls and decodes results and events on top of any
//!   [`ChainClient`](hive_payment_types::chain::ChainClient)
//! - [`chain`] - The alloy-backed [`Eip155ChainClient`] and wire types
//! - [`transport`] - [`LocalWalletTransport`], a session transport backed by a local private key
//!
//! # Example
//!
//! ```ignore
//! use hive_payment_eip155::{LocalWalletTransport, EvmPrivateKey};
//! use hive_payment_types::networks::Network;
//!
//! let key: EvmPrivateKey = std::env::var("HIVE_PAYMENT_PRIVATE_KEY")?.parse()?;
//! let transport = LocalWalletTransport::new(Network::Test.profile().clone(), key)?;
//! ```

pub mod chain;
pub mod contract;
pub mod transport;

pub use chain::*;
pub use contract::{EncodingError, PaymentContract, PaymentContractHandle};
pub use transport::*;
