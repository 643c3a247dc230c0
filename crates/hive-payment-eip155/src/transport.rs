//! A wallet session held in-process.
//!
//! [`LocalWalletTransport`] stands in for a remote wallet: the signing key is
//! loaded from configuration, opening the session needs no user approval, and
//! session notifications can be injected with [`LocalWalletTransport::emit`].

use alloy_primitives::{Address, B256};
use alloy_signer_local::PrivateKeySigner;
use hive_payment_types::chain::BoxError;
use hive_payment_types::networks::NetworkProfile;
use hive_payment_types::session::{SessionEvent, SessionEvents, SessionTransport, SessionTransportError};
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

use crate::chain::Eip155ChainClient;

/// A validated EVM private key (32 bytes).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EvmPrivateKey(B256);

impl EvmPrivateKey {
    pub fn as_bytes(&self) -> &[u8; 32] {
        self.0.as_ref()
    }

    pub fn signer(&self) -> Result<PrivateKeySigner, BoxError> {
        PrivateKeySigner::from_bytes(&self.0).map_err(|e| BoxError::from(e.to_string()))
    }
}

impl FromStr for EvmPrivateKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        B256::from_str(s.trim())
            .map(Self)
            .map_err(|e| format!("Invalid evm private key: {}", e))
    }
}

/// Session transport signing with a key held by this process.
#[derive(Debug)]
pub struct LocalWalletTransport {
    profile: NetworkProfile,
    signer: PrivateKeySigner,
    rate_limit: Option<u32>,
    receipt_timeout: Option<Duration>,
    subscribers: Mutex<Vec<mpsc::UnboundedSender<SessionEvent>>>,
    open: AtomicBool,
}

impl LocalWalletTransport {
    pub fn new(profile: NetworkProfile, key: EvmPrivateKey) -> Result<Self, SessionTransportError> {
        let signer = key
            .signer()
            .map_err(SessionTransportError::Open)?;
        Ok(Self {
            profile,
            signer,
            rate_limit: None,
            receipt_timeout: None,
            subscribers: Mutex::new(Vec::new()),
            open: AtomicBool::new(false),
        })
    }

    /// Requests per second allowed against the network's RPC endpoint.
    pub fn with_rate_limit(mut self, rate_limit: Option<u32>) -> Self {
        self.rate_limit = rate_limit;
        self
    }

    pub fn with_receipt_timeout(mut self, receipt_timeout: Duration) -> Self {
        self.receipt_timeout = Some(receipt_timeout);
        self
    }

    /// The account this transport signs for.
    pub fn address(&self) -> Address {
        self.signer.address()
    }

    pub fn profile(&self) -> &NetworkProfile {
        &self.profile
    }

    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    /// Delivers `event` to every live subscriber.
    pub fn emit(&self, event: SessionEvent) {
        let mut subscribers = self
            .subscribers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        subscribers.retain(|subscriber| subscriber.send(event.clone()).is_ok());
    }
}

#[async_trait::async_trait]
impl SessionTransport for LocalWalletTransport {
    type Client = Eip155ChainClient;

    fn subscribe(&self) -> SessionEvents {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(tx);
        rx
    }

    async fn enable(&self) -> Result<(), SessionTransportError> {
        self.open.store(true, Ordering::SeqCst);
        tracing::info!(
            network = %self.profile.network,
            account = %self.address(),
            "Local wallet session opened"
        );
        self.emit(SessionEvent::ChainChanged(self.profile.chain_reference));
        Ok(())
    }

    fn chain_client(&self) -> Result<Arc<Self::Client>, SessionTransportError> {
        if !self.is_open() {
            return Err(SessionTransportError::Closed);
        }
        let rpc = self.profile.rpc(self.rate_limit);
        let client = Eip155ChainClient::new(self.profile.chain_reference, &rpc, self.signer.clone())
            .map_err(|e| SessionTransportError::Open(BoxError::from(e)))?;
        let client = match self.receipt_timeout {
            Some(timeout) => client.with_receipt_timeout(timeout),
            None => client,
        };
        Ok(Arc::new(client))
    }

    async fn disconnect(&self) -> Result<(), SessionTransportError> {
        if !self.open.swap(false, Ordering::SeqCst) {
            return Err(SessionTransportError::Closed);
        }
        self.emit(SessionEvent::Disconnect {
            code: 1000,
            reason: "session closed".to_string(),
        });
        self.subscribers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clear();
        tracing::info!(network = %self.profile.network, "Local wallet session closed");
        Ok(())
    }
}
