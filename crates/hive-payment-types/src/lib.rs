#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! Core types for paying hive node orders on-chain.
//!
//! This crate holds everything the payment core needs that does not depend on a
//! particular chain client implementation. Concrete EVM support lives in
//! `hive-payment-eip155`; the session manager and transaction orchestrator live
//! in the `hive-payment` crate.
//!
//! # Modules
//!
//! - [`chain`] - The [`ChainClient`](chain::ChainClient) capability and the submission lifecycle
//! - [`session`] - The [`SessionTransport`](session::SessionTransport) capability and wallet session notifications
//! - [`networks`] - The two known payment networks (production and test)
//! - [`config`] - RPC configuration and environment variable resolution
//! - [`util`] - Helper types (payment amounts)

pub mod chain;
pub mod config;
pub mod networks;
pub mod session;
pub mod util;
