//! Wallet session transport capability.
//!
//! A [`SessionTransport`] is the connection between this library and the user's
//! wallet. Opening it may involve an out-of-band approval step (a QR code scanned
//! by a mobile wallet, for instance) that is entirely the transport's business.
//! Once open, the transport produces a [`ChainClient`] that signs through the
//! wallet, and reports wallet-side changes as [`SessionEvent`]s.

use alloy_primitives::Address;
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::chain::{BoxError, ChainClient};

/// A wallet-side notification delivered during the lifetime of a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// The wallet switched accounts. The list may be empty.
    AccountsChanged(Vec<Address>),
    /// The wallet switched to another chain.
    ChainChanged(u64),
    /// The wallet or the transport reported an error.
    Error(String),
    /// The session was closed by the wallet or the transport.
    Disconnect { code: u16, reason: String },
}

impl SessionEvent {
    /// Short name used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            SessionEvent::AccountsChanged(_) => "accounts_changed",
            SessionEvent::ChainChanged(_) => "chain_changed",
            SessionEvent::Error(_) => "error",
            SessionEvent::Disconnect { .. } => "disconnect",
        }
    }
}

/// Receiving end of the session notifications.
pub type SessionEvents = mpsc::UnboundedReceiver<SessionEvent>;

/// Errors reported by a [`SessionTransport`].
#[derive(Debug, thiserror::Error)]
pub enum SessionTransportError {
    /// The session could not be opened.
    #[error("Failed to open wallet session: {0}")]
    Open(BoxError),
    /// The session is already closed.
    #[error("Wallet session is closed")]
    Closed,
    #[error("{0}")]
    Custom(String),
}

/// Wallet session transport.
#[async_trait::async_trait]
pub trait SessionTransport: Send + Sync {
    /// Chain client that signs through this session.
    type Client: ChainClient + 'static;

    /// Registers a new listener for session notifications.
    fn subscribe(&self) -> SessionEvents;

    /// Opens the session. May wait on user approval.
    async fn enable(&self) -> Result<(), SessionTransportError>;

    /// Builds the chain client bound to the open session.
    fn chain_client(&self) -> Result<Arc<Self::Client>, SessionTransportError>;

    /// Closes the session.
    async fn disconnect(&self) -> Result<(), SessionTransportError>;
}
