//! Paying an order on the payment contract.
//!
//! [`TransactionOrchestrator::pay_order`] turns a human request (amount in ELA,
//! recipient, order proof) into a contract transaction:
//!
//! 1. encode `payOrder(to, memo)` and convert the amount to wei,
//! 2. estimate gas and read the gas price,
//! 3. submit with a gas limit of three times the estimate,
//! 4. follow the submission until the transaction is mined or fails.
//!
//! The call settles exactly once: with the order id the contract assigned,
//! or with the first error. A transaction hash alone never settles it.

use alloy_primitives::{Address, TxHash, U256};
use hive_payment_eip155::PaymentContractHandle;
use hive_payment_eip155::contract::{EncodedPayment, EncodingError};
use hive_payment_types::chain::{
    CallRequest, ChainClient, ChainClientError, PaymentReceipt, Submission, SubmissionEvent,
    TransactionParams,
};
use hive_payment_types::session::SessionTransport;
use std::sync::Arc;

use crate::session::{SessionError, SessionManager};

/// Identifier the contract assigns to a paid order.
pub type OrderId = U256;

/// Safety factor applied to the gas estimate.
pub const GAS_LIMIT_MULTIPLIER: u64 = 3;

/// Progress of a submitted payment that does not settle it.
#[derive(Debug, Clone, Copy)]
pub enum SubmissionProgress<'a> {
    /// The node accepted the transaction.
    TransactionHash(TxHash),
    /// The mined transaction gained a confirmation.
    Confirmation {
        confirmations: u64,
        receipt: &'a PaymentReceipt,
    },
}

/// Hook notified about intermediate submission progress.
pub trait SubmissionObserver: Send + Sync {
    fn observe(&self, progress: SubmissionProgress<'_>);
}

impl<F> SubmissionObserver for F
where
    F: Fn(SubmissionProgress<'_>) + Send + Sync,
{
    fn observe(&self, progress: SubmissionProgress<'_>) {
        self(progress)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum GasEstimationError {
    #[error("Failed to estimate gas: {0}")]
    Estimate(#[source] ChainClientError),
    #[error("Failed to get gas price: {0}")]
    GasPrice(#[source] ChainClientError),
    #[error("Gas estimate {0} is too large")]
    Overflow(u64),
}

#[derive(Debug, thiserror::Error)]
pub enum SubmissionError {
    /// The node refused the transaction outright.
    #[error("Transaction rejected: {0}")]
    Rejected(#[source] ChainClientError),
    /// The submitted transaction failed.
    #[error("Transaction failed: {source}")]
    Failed {
        tx_hash: Option<TxHash>,
        #[source]
        source: ChainClientError,
    },
    /// The transaction was mined but did not execute successfully.
    #[error("Transaction {0} failed on chain")]
    Reverted(TxHash),
    #[error("Transaction {0} did not emit an OrderPay event")]
    MissingOrderId(TxHash),
    /// The submission ended without a receipt or an error.
    #[error("Transaction submission dropped before settling")]
    Dropped,
}

#[derive(Debug, thiserror::Error)]
pub enum PaymentError {
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Encoding(#[from] EncodingError),
    #[error(transparent)]
    GasEstimation(#[from] GasEstimationError),
    #[error(transparent)]
    Submission(#[from] SubmissionError),
}

/// What a payment needs from the wallet session, borrowed for one call.
pub struct PaymentContext<'a, C> {
    pub account: Option<Address>,
    pub contract: Option<&'a PaymentContractHandle<C>>,
}

impl<C> Clone for PaymentContext<'_, C> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<C> Copy for PaymentContext<'_, C> {}

impl<'a, C> PaymentContext<'a, C> {
    pub fn new(account: Option<Address>, contract: Option<&'a PaymentContractHandle<C>>) -> Self {
        Self { account, contract }
    }

    /// Active account and contract, or [`SessionError::NotConnected`].
    pub fn require(&self) -> Result<(Address, &'a PaymentContractHandle<C>), SessionError> {
        match (self.account, self.contract) {
            (Some(account), Some(contract)) => Ok((account, contract)),
            _ => Err(SessionError::NotConnected),
        }
    }
}

impl<'a, T: SessionTransport> From<&'a SessionManager<T>> for PaymentContext<'a, T::Client> {
    fn from(session: &'a SessionManager<T>) -> Self {
        PaymentContext::new(session.account_address(), session.contract_handle().ok())
    }
}

/// Derives, submits and follows payment transactions.
#[derive(Clone, Default)]
pub struct TransactionOrchestrator {
    observer: Option<Arc<dyn SubmissionObserver>>,
}

impl std::fmt::Debug for TransactionOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransactionOrchestrator")
            .field("observer", &self.observer.is_some())
            .finish()
    }
}

impl TransactionOrchestrator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_observer(mut self, observer: impl SubmissionObserver + 'static) -> Self {
        self.observer = Some(Arc::new(observer));
        self
    }

    /// Pays `amount` ELA to `to` for the order proven by `memo`.
    ///
    /// Returns the order id the contract assigned to the payment.
    #[tracing::instrument(name = "hive.pay_order", skip_all, fields(to = %to, amount = %amount))]
    pub async fn pay_order<C: ChainClient>(
        &self,
        context: PaymentContext<'_, C>,
        amount: &str,
        to: &str,
        memo: &str,
    ) -> Result<OrderId, PaymentError> {
        let (account, contract) = context.require()?;
        let payment = contract.encode_pay_order(amount, to, memo)?;
        tracing::info!(
            account = %account,
            to = %to,
            amount = %amount,
            value = %payment.value,
            "Paying order"
        );
        let params = self
            .transaction_params(contract.client().as_ref(), account, payment)
            .await?;
        let submission = contract
            .client()
            .send_transaction(params)
            .await
            .map_err(SubmissionError::Rejected)?;
        let order_id = self.settle(contract, submission).await?;
        tracing::info!(account = %account, order_id = %order_id, "Order paid");
        Ok(order_id)
    }

    /// Estimates gas and reads the gas price for `payment`.
    pub async fn transaction_params<C: ChainClient + ?Sized>(
        &self,
        client: &C,
        from: Address,
        payment: EncodedPayment,
    ) -> Result<TransactionParams, GasEstimationError> {
        let request = CallRequest {
            from: Some(from),
            to: payment.contract,
            data: payment.data,
            value: payment.value,
        };
        let estimate = client
            .estimate_gas(&request)
            .await
            .map_err(GasEstimationError::Estimate)?;
        let gas_price = client
            .gas_price()
            .await
            .map_err(GasEstimationError::GasPrice)?;
        let gas_limit = estimate
            .checked_mul(GAS_LIMIT_MULTIPLIER)
            .ok_or(GasEstimationError::Overflow(estimate))?;
        tracing::debug!(estimate, gas_limit, gas_price, "Derived transaction parameters");
        Ok(TransactionParams {
            from,
            to: request.to,
            data: request.data,
            value: request.value,
            gas_limit,
            gas_price,
        })
    }

    async fn settle<C>(
        &self,
        contract: &PaymentContractHandle<C>,
        mut submission: Submission,
    ) -> Result<OrderId, SubmissionError> {
        let mut tx_hash = None;
        while let Some(event) = submission.next().await {
            match event {
                SubmissionEvent::TransactionHash(hash) => {
                    tracing::info!(tx_hash = %hash, "Payment transaction sent");
                    tx_hash = Some(hash);
                    self.notify(SubmissionProgress::TransactionHash(hash));
                }
                SubmissionEvent::Confirmation {
                    confirmations,
                    receipt,
                } => {
                    tracing::debug!(tx_hash = %receipt.transaction_hash, confirmations, "Payment confirmation");
                    self.notify(SubmissionProgress::Confirmation {
                        confirmations,
                        receipt: &receipt,
                    });
                }
                SubmissionEvent::Receipt(receipt) => {
                    tracing::info!(
                        tx_hash = %receipt.transaction_hash,
                        block = ?receipt.block_number,
                        status = receipt.status,
                        "Payment transaction mined"
                    );
                    if !receipt.status {
                        return Err(SubmissionError::Reverted(receipt.transaction_hash));
                    }
                    return contract
                        .order_id_from_receipt(&receipt)
                        .ok_or(SubmissionError::MissingOrderId(receipt.transaction_hash));
                }
                SubmissionEvent::Error(source) => {
                    tracing::warn!(tx_hash = ?tx_hash, error = %source, "Payment transaction failed");
                    return Err(SubmissionError::Failed { tx_hash, source });
                }
            }
        }
        Err(SubmissionError::Dropped)
    }

    fn notify(&self, progress: SubmissionProgress<'_>) {
        if let Some(observer) = &self.observer {
            observer.observe(progress);
        }
    }
}
