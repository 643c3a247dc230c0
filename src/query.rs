//! Read-only views of the payment contract.

use alloy_primitives::U256;
use hive_payment_eip155::chain::{OrderRecord, PlatformFee};
use hive_payment_eip155::contract::ContractCallError;
use hive_payment_types::chain::ChainClient;

use crate::payment::{OrderId, PaymentContext};
use crate::session::SessionError;

#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Contract(#[from] ContractCallError),
}

/// Order queries scoped to the active account of a session.
pub struct OrderQuery<'a, C> {
    context: PaymentContext<'a, C>,
}

impl<'a, C: ChainClient> OrderQuery<'a, C> {
    pub fn new(context: PaymentContext<'a, C>) -> Self {
        Self { context }
    }

    /// Orders paid by the active account.
    pub async fn orders(&self) -> Result<Vec<OrderRecord>, QueryError> {
        let (account, contract) = self.context.require()?;
        Ok(contract.get_orders(account).await?)
    }

    /// The active account's order at `index`, in payment order.
    pub async fn order_by_index(&self, index: U256) -> Result<OrderRecord, QueryError> {
        let (account, contract) = self.context.require()?;
        Ok(contract.get_order_by_index(account, index).await?)
    }

    /// How many orders the active account has paid.
    pub async fn order_count(&self) -> Result<U256, QueryError> {
        let (account, contract) = self.context.require()?;
        Ok(contract.get_order_count(account).await?)
    }

    pub async fn order(&self, order_id: OrderId) -> Result<OrderRecord, QueryError> {
        let contract = self.context.contract.ok_or(SessionError::NotConnected)?;
        Ok(contract.get_order(order_id).await?)
    }

    pub async fn platform_fee(&self) -> Result<PlatformFee, QueryError> {
        let contract = self.context.contract.ok_or(SessionError::NotConnected)?;
        Ok(contract.get_platform_fee().await?)
    }
}
