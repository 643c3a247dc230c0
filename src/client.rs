//! One-stop client for paying hive node orders.
//!
//! ```ignore
//! use hive_payment::PaymentClient;
//!
//! let mut client = PaymentClient::new(true, transport);
//! client.initialize().await?;
//! let order_id = client.pay_order("2.5", hive_node_wallet, order_proof).await?;
//! let orders = client.orders().await?;
//! ```

use alloy_primitives::{Address, U256};
use hive_payment_eip155::chain::{OrderRecord, PlatformFee};
use hive_payment_types::networks::Network;
use hive_payment_types::session::SessionTransport;

use crate::payment::{OrderId, PaymentContext, PaymentError, SubmissionObserver, TransactionOrchestrator};
use crate::query::{OrderQuery, QueryError};
use crate::session::{SessionError, SessionManager};
use crate::watch::OrderPayWatcher;

/// Wallet session, payment orchestration and order queries for one network.
#[derive(Debug)]
pub struct PaymentClient<T: SessionTransport> {
    session: SessionManager<T>,
    orchestrator: TransactionOrchestrator,
}

impl<T: SessionTransport> PaymentClient<T> {
    /// Builds a client for the test network when `testnet` is set, production otherwise.
    pub fn new(testnet: bool, transport: T) -> Self {
        Self::with_network(Network::from_testnet(testnet), transport)
    }

    pub fn with_network(network: Network, transport: T) -> Self {
        Self {
            session: SessionManager::new(network.profile().clone(), transport),
            orchestrator: TransactionOrchestrator::new(),
        }
    }

    /// Notifies `observer` about submission progress of every payment.
    pub fn with_observer(mut self, observer: impl SubmissionObserver + 'static) -> Self {
        self.orchestrator = self.orchestrator.with_observer(observer);
        self
    }

    pub async fn initialize(&mut self) -> Result<(), SessionError> {
        self.session.initialize().await
    }

    pub fn session(&self) -> &SessionManager<T> {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut SessionManager<T> {
        &mut self.session
    }

    pub fn account_address(&self) -> Option<Address> {
        self.session.account_address()
    }

    /// Pays `amount` ELA to the hive node wallet `to`, proving the order with `memo`.
    ///
    /// Wallet notifications received so far are applied first, so the payment
    /// goes out from the account the wallet reported last.
    pub async fn pay_order(
        &mut self,
        amount: &str,
        to: &str,
        memo: &str,
    ) -> Result<OrderId, PaymentError> {
        self.session.process_pending_events().await;
        let context = PaymentContext::from(&self.session);
        self.orchestrator.pay_order(context, amount, to, memo).await
    }

    pub fn query(&self) -> OrderQuery<'_, T::Client> {
        OrderQuery::new(PaymentContext::from(&self.session))
    }

    pub async fn orders(&self) -> Result<Vec<OrderRecord>, QueryError> {
        self.query().orders().await
    }

    pub async fn order_by_index(&self, index: U256) -> Result<OrderRecord, QueryError> {
        self.query().order_by_index(index).await
    }

    pub async fn order_count(&self) -> Result<U256, QueryError> {
        self.query().order_count().await
    }

    pub async fn order(&self, order_id: OrderId) -> Result<OrderRecord, QueryError> {
        self.query().order(order_id).await
    }

    pub async fn platform_fee(&self) -> Result<PlatformFee, QueryError> {
        self.query().platform_fee().await
    }

    /// A watcher for `OrderPay` events on the connected contract.
    pub fn watcher(&self) -> Result<OrderPayWatcher<T::Client>, SessionError> {
        Ok(OrderPayWatcher::new(self.session.contract_handle()?.clone()))
    }

    pub async fn close(&mut self) {
        self.session.close().await
    }
}
