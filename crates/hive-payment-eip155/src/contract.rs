//! Bindings for the hive node payment contract.
//!
//! [`PaymentContractHandle`] pairs the contract address of the selected network
//! with a [`ChainClient`]. It encodes `payOrder` calls, runs the read methods and
//! decodes `OrderPay` events, without knowing how the client reaches the chain.

use alloy_primitives::{Address, Bytes, Log, U256, hex};
use alloy_sol_types::{SolCall, SolEvent, sol};
use hive_payment_types::chain::{CallRequest, ChainClient, ChainClientError, LogFilter, PaymentReceipt};
use hive_payment_types::util::{PaymentAmount, PaymentAmountParseError};
use std::str::FromStr;
use std::sync::Arc;

use crate::chain::{OrderRecord, PlatformFee};

sol! {
    #[allow(missing_docs)]
    #[derive(Debug, PartialEq, Eq)]
    interface PaymentContract {
        struct Order {
            uint256 orderId;
            address payer;
            address payee;
            string memo;
            uint256 amount;
        }

        event OrderPay(uint256 indexed orderId, address indexed payer, address indexed payee, uint256 amount, string memo);

        function payOrder(address to, string memo) external payable returns (uint256);
        function getOrders(address account) external view returns (Order[] memory);
        function getOrderCount(address account) external view returns (uint256);
        function getOrderByIndex(address account, uint256 index) external view returns (Order memory);
        function getOrder(uint256 orderId) external view returns (Order memory);
        function getPlatformFee() external view returns (address platformAddress, uint256 platformFeeRate);
    }
}

impl From<PaymentContract::Order> for OrderRecord {
    fn from(order: PaymentContract::Order) -> Self {
        OrderRecord {
            order_id: order.orderId,
            payer: order.payer.into(),
            payee: order.payee.into(),
            memo: order.memo,
            amount: order.amount,
        }
    }
}

impl From<PaymentContract::OrderPay> for OrderRecord {
    fn from(event: PaymentContract::OrderPay) -> Self {
        OrderRecord {
            order_id: event.orderId,
            payer: event.payer.into(),
            payee: event.payee.into(),
            memo: event.memo,
            amount: event.amount,
        }
    }
}

/// Inputs of a payment that could not be turned into a transaction.
#[derive(Debug, thiserror::Error)]
pub enum EncodingError {
    #[error("Invalid recipient address {0}: {1}")]
    InvalidAddress(String, hex::FromHexError),
    #[error("Invalid payment amount: {0}")]
    InvalidAmount(#[from] PaymentAmountParseError),
}

/// A read method that failed.
#[derive(Debug, thiserror::Error)]
pub enum ContractCallError {
    #[error(transparent)]
    Chain(#[from] ChainClientError),
    #[error("Failed to decode result of {method}: {source}")]
    Decode {
        method: &'static str,
        source: alloy_sol_types::Error,
    },
}

/// A `payOrder` call ready to be estimated and sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedPayment {
    /// Contract address the call goes to.
    pub contract: Address,
    /// ABI-encoded call data.
    pub data: Bytes,
    /// Amount attached to the call, in wei.
    pub value: U256,
}

/// The payment contract on one network, reached through a chain client.
#[derive(Debug)]
pub struct PaymentContractHandle<C> {
    address: Address,
    client: Arc<C>,
}

impl<C> Clone for PaymentContractHandle<C> {
    fn clone(&self) -> Self {
        Self {
            address: self.address,
            client: Arc::clone(&self.client),
        }
    }
}

impl<C> PaymentContractHandle<C> {
    pub fn new(address: Address, client: Arc<C>) -> Self {
        Self { address, client }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn client(&self) -> &Arc<C> {
        &self.client
    }

    /// Encodes `payOrder(to, memo)` carrying `amount` ELA.
    ///
    /// `amount` is a decimal string in whole ELA and is converted to wei exactly.
    pub fn encode_pay_order(
        &self,
        amount: &str,
        to: &str,
        memo: &str,
    ) -> Result<EncodedPayment, EncodingError> {
        let value = PaymentAmount::parse(amount)?.to_wei()?;
        let to = Address::from_str(to.trim())
            .map_err(|e| EncodingError::InvalidAddress(to.to_string(), e))?;
        let call = PaymentContract::payOrderCall {
            to,
            memo: memo.to_string(),
        };
        Ok(EncodedPayment {
            contract: self.address,
            data: call.abi_encode().into(),
            value,
        })
    }

    /// Decodes an `OrderPay` event emitted by this contract.
    ///
    /// Returns `None` for logs of other contracts or other events.
    pub fn decode_order_pay(&self, log: &Log) -> Option<OrderRecord> {
        if log.address != self.address {
            return None;
        }
        PaymentContract::OrderPay::decode_log_data(&log.data)
            .ok()
            .map(OrderRecord::from)
    }

    /// Order id assigned by the contract to the payment in `receipt`.
    pub fn order_id_from_receipt(&self, receipt: &PaymentReceipt) -> Option<U256> {
        receipt
            .logs_from(self.address)
            .find_map(|log| self.decode_order_pay(log))
            .map(|order| order.order_id)
    }
}

impl<C: ChainClient> PaymentContractHandle<C> {
    async fn read<T: SolCall>(&self, call: T) -> Result<T::Return, ContractCallError> {
        let request = CallRequest::read(self.address, call.abi_encode().into());
        let output = self.client.call(&request).await?;
        T::abi_decode_returns(&output).map_err(|source| ContractCallError::Decode {
            method: T::SIGNATURE,
            source,
        })
    }

    /// All orders paid by `account`.
    pub async fn get_orders(&self, account: Address) -> Result<Vec<OrderRecord>, ContractCallError> {
        let orders = self.read(PaymentContract::getOrdersCall { account }).await?;
        Ok(orders.into_iter().map(OrderRecord::from).collect())
    }

    pub async fn get_order_count(&self, account: Address) -> Result<U256, ContractCallError> {
        self.read(PaymentContract::getOrderCountCall { account }).await
    }

    pub async fn get_order_by_index(
        &self,
        account: Address,
        index: U256,
    ) -> Result<OrderRecord, ContractCallError> {
        let order = self
            .read(PaymentContract::getOrderByIndexCall { account, index })
            .await?;
        Ok(order.into())
    }

    pub async fn get_order(&self, order_id: U256) -> Result<OrderRecord, ContractCallError> {
        let order = self.read(PaymentContract::getOrderCall { orderId: order_id }).await?;
        Ok(order.into())
    }

    pub async fn get_platform_fee(&self) -> Result<PlatformFee, ContractCallError> {
        let fee = self.read(PaymentContract::getPlatformFeeCall {}).await?;
        Ok(PlatformFee {
            platform_address: fee.platformAddress.into(),
            platform_fee_rate: fee.platformFeeRate,
        })
    }

    /// `OrderPay` events emitted between `from_block` and `to_block`, inclusive.
    pub async fn order_pay_events(
        &self,
        from_block: u64,
        to_block: u64,
    ) -> Result<Vec<OrderRecord>, ContractCallError> {
        let filter = LogFilter {
            address: self.address,
            from_block,
            to_block,
        };
        let logs = self.client.get_logs(&filter).await?;
        Ok(logs.iter().filter_map(|log| self.decode_order_pay(log)).collect())
    }
}
