use alloy_primitives::{Address, Log, TxHash};
use tokio::sync::mpsc;

use crate::chain::ChainClientError;

/// A mined transaction receipt, reduced to what payment settlement needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentReceipt {
    pub transaction_hash: TxHash,
    pub block_number: Option<u64>,
    /// `true` when the transaction executed successfully.
    pub status: bool,
    /// Logs emitted by the transaction, in emission order.
    pub logs: Vec<Log>,
}

impl PaymentReceipt {
    /// Logs emitted by the given contract.
    pub fn logs_from(&self, address: Address) -> impl Iterator<Item = &Log> {
        self.logs.iter().filter(move |log| log.address == address)
    }
}

/// A notification about a submitted transaction.
#[derive(Debug)]
pub enum SubmissionEvent {
    /// The node accepted the transaction and assigned it a hash.
    TransactionHash(TxHash),
    /// The transaction was mined.
    Receipt(PaymentReceipt),
    /// The mined transaction gained another confirmation.
    Confirmation {
        confirmations: u64,
        receipt: PaymentReceipt,
    },
    /// The transaction was rejected, reverted or dropped.
    Error(ChainClientError),
}

impl SubmissionEvent {
    /// Short name used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            SubmissionEvent::TransactionHash(_) => "transaction_hash",
            SubmissionEvent::Receipt(_) => "receipt",
            SubmissionEvent::Confirmation { .. } => "confirmation",
            SubmissionEvent::Error(_) => "error",
        }
    }

    /// Whether this event settles a payment.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SubmissionEvent::Receipt(_) | SubmissionEvent::Error(_)
        )
    }
}

/// Receiving half of a transaction submission.
///
/// Yields [`SubmissionEvent`]s in the order the chain client emitted them and
/// ends once the emitting side is dropped.
#[derive(Debug)]
pub struct Submission {
    events: mpsc::UnboundedReceiver<SubmissionEvent>,
}

/// Emitting half of a transaction submission, held by the chain client.
#[derive(Debug, Clone)]
pub struct SubmissionSender {
    events: mpsc::UnboundedSender<SubmissionEvent>,
}

impl Submission {
    pub fn channel() -> (SubmissionSender, Submission) {
        let (tx, rx) = mpsc::unbounded_channel();
        (SubmissionSender { events: tx }, Submission { events: rx })
    }

    /// Waits for the next notification. `None` once the sender is gone.
    pub async fn next(&mut self) -> Option<SubmissionEvent> {
        self.events.recv().await
    }
}

impl SubmissionSender {
    /// Emits a notification. Returns `false` when nobody listens anymore.
    pub fn emit(&self, event: SubmissionEvent) -> bool {
        self.events.send(event).is_ok()
    }
}
