//! In-process fakes of the chain client and the session transport.

use alloy_primitives::{Address, Bytes, Log, TxHash, U256};
use alloy_sol_types::SolEvent;
use hive_payment_eip155::PaymentContract;
use hive_payment_types::chain::{
    CallRequest, ChainClient, ChainClientError, LogFilter, PaymentReceipt, Submission,
    SubmissionEvent, SubmissionSender, TransactionParams,
};
use hive_payment_types::networks::NetworkProfile;
use hive_payment_types::session::{SessionEvent, SessionEvents, SessionTransport, SessionTransportError};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

pub fn account(n: u8) -> Address {
    Address::repeat_byte(n)
}

pub fn encoded_order(id: u64) -> PaymentContract::Order {
    PaymentContract::Order {
        orderId: U256::from(id),
        payer: account(1),
        payee: account(2),
        memo: format!("proof-{id}"),
        amount: U256::from(id),
    }
}

/// An `OrderPay` log emitted by the test network's contract.
pub fn order_pay_log(order_id: u64) -> Log {
    let event = PaymentContract::OrderPay {
        orderId: U256::from(order_id),
        payer: account(1),
        payee: account(2),
        amount: U256::from(1u64),
        memo: "proof".into(),
    };
    Log {
        address: NetworkProfile::test().contract_address,
        data: event.encode_log_data(),
    }
}

pub fn order_pay_receipt(tx_hash: TxHash, order_id: u64) -> PaymentReceipt {
    PaymentReceipt {
        transaction_hash: tx_hash,
        block_number: Some(1),
        status: true,
        logs: vec![order_pay_log(order_id)],
    }
}

fn failure(message: &Option<String>) -> Result<(), ChainClientError> {
    match message {
        Some(message) => Err(ChainClientError::Custom(message.clone())),
        None => Ok(()),
    }
}

/// A scripted [`ChainClient`].
#[derive(Debug, Default)]
pub struct FakeChainClient {
    accounts: Vec<Address>,
    accounts_error: Option<String>,
    estimate: u64,
    estimate_error: Option<String>,
    gas_price: u128,
    gas_price_error: Option<String>,
    send_error: Option<String>,
    call_output: Bytes,
    call_error: Option<String>,
    block: u64,
    logs: Vec<Log>,
    script: Mutex<Vec<SubmissionEvent>>,
    hold_open: bool,
    held: Mutex<Vec<SubmissionSender>>,
    sent: Mutex<Vec<TransactionParams>>,
    calls: Mutex<Vec<CallRequest>>,
    log_filters: Mutex<Vec<LogFilter>>,
    estimates: Mutex<Vec<CallRequest>>,
    trail: Mutex<Vec<&'static str>>,
}

impl FakeChainClient {
    pub fn new(accounts: Vec<Address>) -> Self {
        Self {
            accounts,
            estimate: 21_000,
            gas_price: 1,
            ..Default::default()
        }
    }

    pub fn failing_accounts(mut self, message: &str) -> Self {
        self.accounts_error = Some(message.to_string());
        self
    }

    pub fn with_estimate(mut self, estimate: u64) -> Self {
        self.estimate = estimate;
        self
    }

    pub fn failing_estimate(mut self, message: &str) -> Self {
        self.estimate_error = Some(message.to_string());
        self
    }

    pub fn with_gas_price(mut self, gas_price: u128) -> Self {
        self.gas_price = gas_price;
        self
    }

    pub fn failing_gas_price(mut self, message: &str) -> Self {
        self.gas_price_error = Some(message.to_string());
        self
    }

    pub fn rejecting(mut self, message: &str) -> Self {
        self.send_error = Some(message.to_string());
        self
    }

    /// Events emitted by the next submission, in order.
    pub fn with_submission(self, events: Vec<SubmissionEvent>) -> Self {
        *self.script.lock().unwrap() = events;
        self
    }

    /// Keeps submissions open after the scripted events.
    pub fn hold_open(mut self) -> Self {
        self.hold_open = true;
        self
    }

    pub fn with_call_output(mut self, output: Vec<u8>) -> Self {
        self.call_output = output.into();
        self
    }

    pub fn failing_calls(mut self, message: &str) -> Self {
        self.call_error = Some(message.to_string());
        self
    }

    pub fn at_block(mut self, block: u64) -> Self {
        self.block = block;
        self
    }

    pub fn with_logs(mut self, logs: Vec<Log>) -> Self {
        self.logs = logs;
        self
    }

    pub fn sent(&self) -> Vec<TransactionParams> {
        self.sent.lock().unwrap().clone()
    }

    pub fn calls(&self) -> Vec<CallRequest> {
        self.calls.lock().unwrap().clone()
    }

    pub fn log_filters(&self) -> Vec<LogFilter> {
        self.log_filters.lock().unwrap().clone()
    }

    pub fn estimate_calls(&self) -> usize {
        self.estimates.lock().unwrap().len()
    }

    /// Requests passed to `estimate_gas`, in order.
    pub fn estimates(&self) -> Vec<CallRequest> {
        self.estimates.lock().unwrap().clone()
    }

    /// Names of the fee and submission methods, in the order they were called.
    pub fn trail(&self) -> Vec<&'static str> {
        self.trail.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl ChainClient for FakeChainClient {
    async fn accounts(&self) -> Result<Vec<Address>, ChainClientError> {
        failure(&self.accounts_error)?;
        Ok(self.accounts.clone())
    }

    async fn chain_id(&self) -> Result<u64, ChainClientError> {
        Ok(NetworkProfile::test().chain_reference)
    }

    async fn block_number(&self) -> Result<u64, ChainClientError> {
        Ok(self.block)
    }

    async fn call(&self, request: &CallRequest) -> Result<Bytes, ChainClientError> {
        self.calls.lock().unwrap().push(request.clone());
        failure(&self.call_error)?;
        Ok(self.call_output.clone())
    }

    async fn estimate_gas(&self, request: &CallRequest) -> Result<u64, ChainClientError> {
        self.trail.lock().unwrap().push("estimate_gas");
        self.estimates.lock().unwrap().push(request.clone());
        failure(&self.estimate_error)?;
        Ok(self.estimate)
    }

    async fn gas_price(&self) -> Result<u128, ChainClientError> {
        self.trail.lock().unwrap().push("gas_price");
        failure(&self.gas_price_error)?;
        Ok(self.gas_price)
    }

    async fn send_transaction(
        &self,
        params: TransactionParams,
    ) -> Result<Submission, ChainClientError> {
        self.trail.lock().unwrap().push("send_transaction");
        failure(&self.send_error)?;
        self.sent.lock().unwrap().push(params);
        let (sender, submission) = Submission::channel();
        for event in self.script.lock().unwrap().drain(..) {
            sender.emit(event);
        }
        if self.hold_open {
            self.held.lock().unwrap().push(sender);
        }
        Ok(submission)
    }

    async fn get_logs(&self, filter: &LogFilter) -> Result<Vec<Log>, ChainClientError> {
        self.log_filters.lock().unwrap().push(*filter);
        Ok(self.logs.clone())
    }
}

/// A [`SessionTransport`] handing out a [`FakeChainClient`].
#[derive(Debug)]
pub struct FakeTransport {
    client: Arc<FakeChainClient>,
    subscribers: Mutex<Vec<mpsc::UnboundedSender<SessionEvent>>>,
    enable_error: Option<String>,
    disconnect_error: Option<String>,
    enable_calls: AtomicUsize,
    disconnect_calls: AtomicUsize,
}

impl FakeTransport {
    pub fn new(client: FakeChainClient) -> Self {
        Self {
            client: Arc::new(client),
            subscribers: Mutex::new(Vec::new()),
            enable_error: None,
            disconnect_error: None,
            enable_calls: AtomicUsize::new(0),
            disconnect_calls: AtomicUsize::new(0),
        }
    }

    pub fn failing_enable(mut self, message: &str) -> Self {
        self.enable_error = Some(message.to_string());
        self
    }

    pub fn failing_disconnect(mut self, message: &str) -> Self {
        self.disconnect_error = Some(message.to_string());
        self
    }

    pub fn client(&self) -> Arc<FakeChainClient> {
        Arc::clone(&self.client)
    }

    pub fn emit(&self, event: SessionEvent) {
        for subscriber in self.subscribers.lock().unwrap().iter() {
            let _ = subscriber.send(event.clone());
        }
    }

    pub fn enable_calls(&self) -> usize {
        self.enable_calls.load(Ordering::SeqCst)
    }

    pub fn disconnect_calls(&self) -> usize {
        self.disconnect_calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl SessionTransport for FakeTransport {
    type Client = FakeChainClient;

    fn subscribe(&self) -> SessionEvents {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.lock().unwrap().push(tx);
        rx
    }

    async fn enable(&self) -> Result<(), SessionTransportError> {
        self.enable_calls.fetch_add(1, Ordering::SeqCst);
        match &self.enable_error {
            Some(message) => Err(SessionTransportError::Custom(message.clone())),
            None => Ok(()),
        }
    }

    fn chain_client(&self) -> Result<Arc<Self::Client>, SessionTransportError> {
        Ok(self.client())
    }

    async fn disconnect(&self) -> Result<(), SessionTransportError> {
        self.disconnect_calls.fetch_add(1, Ordering::SeqCst);
        match &self.disconnect_error {
            Some(message) => Err(SessionTransportError::Custom(message.clone())),
            None => Ok(()),
        }
    }
}
