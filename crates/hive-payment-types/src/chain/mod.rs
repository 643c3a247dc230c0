//! Chain client capability used by the payment core.
//!
//! The payment core never speaks JSON-RPC itself. Everything that touches the
//! network goes through a [`ChainClient`]: read calls, gas estimation, gas price,
//! log queries and transaction submission. This keeps the session manager and the
//! transaction orchestrator testable against in-process fakes.
//!
//! # Submission lifecycle
//!
//! [`ChainClient::send_transaction`] does not wait for the transaction to be mined.
//! It hands back a [`Submission`], a stream of [`SubmissionEvent`]s emitted as the
//! transaction progresses:
//!
//! - [`SubmissionEvent::TransactionHash`] - the node accepted the transaction
//! - [`SubmissionEvent::Receipt`] - the transaction was mined (terminal)
//! - [`SubmissionEvent::Confirmation`] - additional confirmations after the receipt
//! - [`SubmissionEvent::Error`] - the transaction was rejected, reverted or dropped (terminal)

mod submission;

pub use submission::*;

use alloy_primitives::{Address, Bytes, Log, U256};

/// Boxed error type carried by transport failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors reported by a [`ChainClient`].
#[derive(Debug, thiserror::Error)]
pub enum ChainClientError {
    /// The underlying RPC transport failed.
    #[error(transparent)]
    Transport(BoxError),
    /// The transaction was mined but reverted.
    #[error("transaction {0} reverted")]
    Reverted(String),
    #[error("{0}")]
    Custom(String),
}

impl ChainClientError {
    pub fn transport<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        ChainClientError::Transport(Box::new(error))
    }
}

/// A read call or a gas estimation request against the chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallRequest {
    /// Sender address. Read calls may leave it empty.
    pub from: Option<Address>,
    /// Target contract.
    pub to: Address,
    /// ABI-encoded call data.
    pub data: Bytes,
    /// Native value attached to the call, in wei.
    pub value: U256,
}

impl CallRequest {
    /// A read-only call with no sender and no value.
    pub fn read(to: Address, data: Bytes) -> Self {
        Self {
            from: None,
            to,
            data,
            value: U256::ZERO,
        }
    }
}

/// Fully derived parameters of a payment transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionParams {
    /// Paying account.
    pub from: Address,
    /// Payment contract address.
    pub to: Address,
    /// ABI-encoded `payOrder` call.
    pub data: Bytes,
    /// Payment amount in wei.
    pub value: U256,
    /// Gas limit, already multiplied by the safety factor.
    pub gas_limit: u64,
    /// Gas price in wei.
    pub gas_price: u128,
}

/// Block range and address filter for log queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogFilter {
    pub address: Address,
    pub from_block: u64,
    pub to_block: u64,
}

/// Network operations the payment core consumes.
///
/// Implementations are expected to be cheap to share behind an [`Arc`](std::sync::Arc).
#[async_trait::async_trait]
pub trait ChainClient: Send + Sync {
    /// Accounts the connected wallet exposes, in wallet order.
    async fn accounts(&self) -> Result<Vec<Address>, ChainClientError>;

    /// Chain id reported by the node.
    async fn chain_id(&self) -> Result<u64, ChainClientError>;

    /// Latest block number.
    async fn block_number(&self) -> Result<u64, ChainClientError>;

    /// Executes a read-only call and returns the raw return data.
    async fn call(&self, request: &CallRequest) -> Result<Bytes, ChainClientError>;

    /// Estimates the gas a call would consume.
    async fn estimate_gas(&self, request: &CallRequest) -> Result<u64, ChainClientError>;

    /// Current gas price in wei.
    async fn gas_price(&self) -> Result<u128, ChainClientError>;

    /// Submits a transaction and returns its lifecycle notifications.
    async fn send_transaction(
        &self,
        params: TransactionParams,
    ) -> Result<Submission, ChainClientError>;

    /// Logs emitted by `filter.address` within the block range.
    async fn get_logs(&self, filter: &LogFilter) -> Result<Vec<Log>, ChainClientError>;
}
