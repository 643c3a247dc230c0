//! Paying hive node orders on Elastos Smart Chain.
//!
//! A hive node sells storage plans. Placing an order returns a proof; the buyer
//! then pays the order on the payment contract, and the contract assigns an order
//! id that the hive node uses to settle the order.
//!
//! This crate does the paying part on behalf of a connected wallet:
//!
//! - [`session`] - [`SessionManager`], the wallet session lifecycle (connect,
//!   account and chain changes, errors, disconnect)
//! - [`payment`] - [`TransactionOrchestrator`], which derives the transaction
//!   parameters, submits the payment and waits for the order id
//! - [`query`] - [`OrderQuery`], read-only views of paid orders
//! - [`watch`] - [`OrderPayWatcher`], a poller for `OrderPay` events
//! - [`client`] - [`PaymentClient`], all of the above behind one type
//! - [`config`] - CLI arguments and configuration file of the binary
//! - [`util`] - Signal handling and telemetry for the binary
//!
//! Exactly one payment contract is targeted, on either the production or the
//! test network, chosen once when the client is built.
//!
//! The chain itself is reached through the capability traits of
//! `hive-payment-types`; `hive-payment-eip155` provides the alloy-backed
//! implementations.

pub mod client;
pub mod config;
pub mod payment;
pub mod query;
pub mod session;
pub mod util;
pub mod watch;

#[cfg(test)]
mod test_support;

pub use client::PaymentClient;
pub use payment::{
    OrderId, PaymentContext, PaymentError, SubmissionObserver, SubmissionProgress,
    TransactionOrchestrator,
};
pub use query::{OrderQuery, QueryError};
pub use session::{ConnectionState, SessionError, SessionManager, WalletSession};
pub use watch::OrderPayWatcher;
