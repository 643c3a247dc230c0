//! EVM chain access for hive node payments.
//!
//! - [`provider`] - [`Eip155ChainClient`], an alloy provider implementing
//!   [`ChainClient`](hive_payment_types::chain::ChainClient)
//! - [`types`] - Wire format types like [`ChecksummedAddress`] and [`OrderRecord`]

pub mod provider;
pub use provider::*;

pub mod types;
pub use types::*;
