//! Polling watcher for `OrderPay` events.

use hive_payment_eip155::PaymentContractHandle;
use hive_payment_eip155::chain::OrderRecord;
use hive_payment_eip155::contract::ContractCallError;
use hive_payment_types::chain::ChainClient;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

/// Default delay between two polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Default number of blocks covered by one `eth_getLogs` request.
/// Public RPC endpoints reject wider ranges.
pub const DEFAULT_MAX_BLOCK_RANGE: u64 = 1000;

/// Follows `OrderPay` events emitted by the payment contract.
///
/// The first poll starts at the current head; later polls pick up right after
/// the last block scanned, so every block is scanned once. A poll covers at most
/// `max_block_range` blocks, so a backlog drains over several polls.
#[derive(Debug)]
pub struct OrderPayWatcher<C> {
    contract: PaymentContractHandle<C>,
    poll_interval: Duration,
    max_block_range: u64,
    next_block: Option<u64>,
}

impl<C: ChainClient> OrderPayWatcher<C> {
    pub fn new(contract: PaymentContractHandle<C>) -> Self {
        Self {
            contract,
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_block_range: DEFAULT_MAX_BLOCK_RANGE,
            next_block: None,
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Caps the blocks covered by one poll. Zero is treated as one.
    pub fn with_max_block_range(mut self, max_block_range: u64) -> Self {
        self.max_block_range = max_block_range.max(1);
        self
    }

    /// Starts scanning at `block` instead of the current head.
    pub fn starting_at(mut self, block: u64) -> Self {
        self.next_block = Some(block);
        self
    }

    /// The first block the next poll will scan.
    pub fn next_block(&self) -> Option<u64> {
        self.next_block
    }

    /// Scans the next range of blocks mined since the previous poll.
    pub async fn poll_once(&mut self) -> Result<Vec<OrderRecord>, ContractCallError> {
        let head = self.contract.client().block_number().await?;
        let from = self.next_block.unwrap_or(head);
        if from > head {
            return Ok(Vec::new());
        }
        let to = head.min(from.saturating_add(self.max_block_range - 1));
        let events = self.contract.order_pay_events(from, to).await?;
        tracing::debug!(from, to, head, events = events.len(), "Scanned for OrderPay events");
        self.next_block = Some(to + 1);
        Ok(events)
    }

    /// Polls until `cancellation_token` fires, handing every event to `on_event`.
    ///
    /// Poll failures are logged and retried on the next tick.
    pub async fn run<F>(mut self, cancellation_token: CancellationToken, mut on_event: F)
    where
        F: FnMut(OrderRecord),
    {
        let mut interval = tokio::time::interval(self.poll_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tracing::info!(
            contract = %self.contract.address(),
            interval = ?self.poll_interval,
            "Watching OrderPay events"
        );
        loop {
            tokio::select! {
                _ = cancellation_token.cancelled() => break,
                _ = interval.tick() => {
                    match self.poll_once().await {
                        Ok(events) => {
                            for event in events {
                                tracing::info!(
                                    order_id = %event.order_id,
                                    payer = %event.payer,
                                    payee = %event.payee,
                                    amount = %event.amount,
                                    "OrderPay"
                                );
                                on_event(event);
                            }
                        }
                        Err(e) => tracing::warn!(error = %e, "Failed to poll OrderPay events"),
                    }
                }
            }
        }
        tracing::info!("Stopped watching OrderPay events");
    }
}
