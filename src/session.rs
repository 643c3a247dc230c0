//! Wallet session lifecycle.
//!
//! [`SessionManager`] owns the connection to the user's wallet. It opens the
//! session through a [`SessionTransport`], keeps track of the active account and
//! chain as the wallet reports changes, and hands out the chain client and the
//! payment contract handle while the session is connected.
//!
//! ```text
//! Uninitialized -> Connecting -> Connected -> Disconnected
//!                      |             |
//!                      +-> Errored   +-- accounts / chain / error (stay Connected)
//! ```
//!
//! A session that ended, either by disconnecting or by failing to initialize,
//! is never reopened. Build a new manager instead.

use alloy_primitives::Address;
use hive_payment_eip155::PaymentContractHandle;
use hive_payment_types::chain::{ChainClient, ChainClientError};
use hive_payment_types::networks::NetworkProfile;
use hive_payment_types::session::{
    SessionEvent, SessionEvents, SessionTransport, SessionTransportError,
};
use std::fmt;
use std::sync::Arc;
use tokio::sync::mpsc::error::TryRecvError;

/// Connection state of a wallet session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Uninitialized,
    Connecting,
    Connected,
    Disconnected,
    Errored,
}

impl ConnectionState {
    /// Whether the session can no longer be used.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ConnectionState::Disconnected | ConnectionState::Errored)
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConnectionState::Uninitialized => "uninitialized",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Errored => "errored",
        };
        f.write_str(s)
    }
}

/// What is known about the wallet on the other end of the session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WalletSession {
    pub active_account: Option<Address>,
    pub active_chain_id: Option<u64>,
    pub state: ConnectionState,
    pub last_error: Option<String>,
}

/// Why a session could not be opened.
#[derive(Debug, thiserror::Error)]
pub enum SessionInitError {
    #[error(transparent)]
    Transport(#[from] SessionTransportError),
    #[error(transparent)]
    Chain(#[from] ChainClientError),
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Failed to initialize wallet session: {0}")]
    Init(#[source] SessionInitError),
    #[error("Wallet session is not connected")]
    NotConnected,
    #[error("Wallet session is {0} and cannot be reused")]
    Terminated(ConnectionState),
}

/// Owner of the wallet session and the resources bound to it.
pub struct SessionManager<T: SessionTransport> {
    profile: NetworkProfile,
    transport: T,
    events: Option<SessionEvents>,
    session: WalletSession,
    client: Option<Arc<T::Client>>,
    contract: Option<PaymentContractHandle<T::Client>>,
}

impl<T: SessionTransport> fmt::Debug for SessionManager<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionManager")
            .field("network", &self.profile.network)
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}

impl<T: SessionTransport> SessionManager<T> {
    pub fn new(profile: NetworkProfile, transport: T) -> Self {
        Self {
            profile,
            transport,
            events: None,
            session: WalletSession::default(),
            client: None,
            contract: None,
        }
    }

    /// Opens the wallet session and binds the payment contract to it.
    ///
    /// Does nothing when already connected. Fails with [`SessionError::Terminated`]
    /// once the session has ended.
    pub async fn initialize(&mut self) -> Result<(), SessionError> {
        match self.session.state {
            ConnectionState::Connected => return Ok(()),
            state if state.is_terminal() => return Err(SessionError::Terminated(state)),
            _ => {}
        }
        self.session.state = ConnectionState::Connecting;
        tracing::info!(network = %self.profile.network, "Opening wallet session");
        match self.connect().await {
            Ok(()) => {
                self.session.state = ConnectionState::Connected;
                tracing::info!(
                    network = %self.profile.network,
                    account = ?self.session.active_account,
                    contract = %self.profile.contract_address,
                    "Wallet session connected"
                );
                self.process_pending_events().await;
                Ok(())
            }
            Err(e) => {
                tracing::error!(network = %self.profile.network, error = %e, "Wallet session failed to open");
                self.session.state = ConnectionState::Errored;
                self.session.last_error = Some(e.to_string());
                self.events = None;
                self.client = None;
                self.contract = None;
                Err(SessionError::Init(e))
            }
        }
    }

    async fn connect(&mut self) -> Result<(), SessionInitError> {
        self.events = Some(self.transport.subscribe());
        self.transport.enable().await?;
        let client = self.transport.chain_client()?;
        let accounts = client.accounts().await?;
        self.session.active_account = accounts.first().copied();
        if self.session.active_account.is_none() {
            tracing::warn!("Wallet exposes no account");
        }
        self.contract = Some(PaymentContractHandle::new(
            self.profile.contract_address,
            Arc::clone(&client),
        ));
        self.client = Some(client);
        Ok(())
    }

    pub fn profile(&self) -> &NetworkProfile {
        &self.profile
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn session(&self) -> &WalletSession {
        &self.session
    }

    pub fn state(&self) -> ConnectionState {
        self.session.state
    }

    pub fn account_address(&self) -> Option<Address> {
        self.session.active_account
    }

    pub fn chain_id(&self) -> Option<u64> {
        self.session.active_chain_id
    }

    pub fn last_error(&self) -> Option<&str> {
        self.session.last_error.as_deref()
    }

    /// The chain the wallet reports when it differs from the payment network.
    pub fn chain_mismatch(&self) -> Option<u64> {
        self.session
            .active_chain_id
            .filter(|chain_id| *chain_id != self.profile.chain_reference)
    }

    pub fn chain_client(&self) -> Result<&Arc<T::Client>, SessionError> {
        match (self.session.state, &self.client) {
            (ConnectionState::Connected, Some(client)) => Ok(client),
            _ => Err(SessionError::NotConnected),
        }
    }

    pub fn contract_handle(&self) -> Result<&PaymentContractHandle<T::Client>, SessionError> {
        match (self.session.state, &self.contract) {
            (ConnectionState::Connected, Some(contract)) => Ok(contract),
            _ => Err(SessionError::NotConnected),
        }
    }

    /// Applies every notification already queued. Returns how many were applied.
    pub async fn process_pending_events(&mut self) -> usize {
        let mut applied = 0;
        loop {
            let Some(events) = self.events.as_mut() else {
                break;
            };
            match events.try_recv() {
                Ok(event) => {
                    self.apply(event).await;
                    applied += 1;
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        applied
    }

    /// Waits for the next notification and applies it.
    ///
    /// Returns `None` once the transport stops sending notifications.
    pub async fn next_event(&mut self) -> Option<SessionEvent> {
        let event = self.events.as_mut()?.recv().await?;
        self.apply(event.clone()).await;
        Some(event)
    }

    /// Updates the session after a wallet notification.
    pub async fn apply(&mut self, event: SessionEvent) {
        tracing::debug!(event = event.kind(), "Session notification");
        match event {
            SessionEvent::AccountsChanged(accounts) => match accounts.first() {
                Some(account) => {
                    tracing::info!(account = %account, "Active account changed");
                    self.session.active_account = Some(*account);
                }
                None => {
                    tracing::debug!("Ignoring empty account list");
                }
            },
            SessionEvent::ChainChanged(chain_id) => {
                self.session.active_chain_id = Some(chain_id);
                if chain_id != self.profile.chain_reference {
                    tracing::warn!(
                        chain_id,
                        expected = self.profile.chain_reference,
                        "Wallet switched to a chain other than the payment network"
                    );
                }
            }
            SessionEvent::Error(error) => {
                tracing::warn!(error = %error, "Wallet session reported an error");
                self.session.last_error = Some(error);
            }
            SessionEvent::Disconnect { code, reason } => {
                tracing::info!(code, reason = %reason, "Wallet session disconnected");
                self.teardown().await;
            }
        }
    }

    /// Closes the session. Teardown failures are logged, never returned.
    pub async fn close(&mut self) {
        self.teardown().await;
    }

    async fn teardown(&mut self) {
        if self.session.state == ConnectionState::Disconnected {
            return;
        }
        let was_open = matches!(
            self.session.state,
            ConnectionState::Connected | ConnectionState::Connecting
        );
        if was_open {
            if let Err(e) = self.transport.disconnect().await {
                tracing::warn!(error = %e, "Wallet session teardown failed");
            }
        }
        self.session.state = ConnectionState::Disconnected;
        self.events = None;
        self.client = None;
        self.contract = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{FakeChainClient, FakeTransport, account};

    fn manager(transport: FakeTransport) -> SessionManager<FakeTransport> {
        SessionManager::new(NetworkProfile::test(), transport)
    }

    #[tokio::test]
    async fn test_initialize_connects_first_account() {
        let client = FakeChainClient::new(vec![account(1), account(2)]);
        let mut manager = manager(FakeTransport::new(client));
        manager.initialize().await.unwrap();
        assert_eq!(manager.state(), ConnectionState::Connected);
        assert_eq!(manager.account_address(), Some(account(1)));
        let contract = manager.contract_handle().unwrap();
        assert_eq!(contract.address(), NetworkProfile::test().contract_address);
        assert!(manager.chain_client().is_ok());
    }

    #[tokio::test]
    async fn test_initialize_twice_is_noop() {
        let transport = FakeTransport::new(FakeChainClient::new(vec![account(1)]));
        let mut manager = manager(transport);
        manager.initialize().await.unwrap();
        manager.initialize().await.unwrap();
        assert_eq!(manager.transport().enable_calls(), 1);
    }

    #[tokio::test]
    async fn test_initialize_failure_errors_session() {
        let transport =
            FakeTransport::new(FakeChainClient::new(vec![account(1)])).failing_enable("rejected");
        let mut manager = manager(transport);
        let err = manager.initialize().await.unwrap_err();
        assert!(matches!(err, SessionError::Init(SessionInitError::Transport(_))));
        assert_eq!(manager.state(), ConnectionState::Errored);
        assert!(manager.last_error().unwrap().contains("rejected"));
        assert!(matches!(
            manager.contract_handle(),
            Err(SessionError::NotConnected)
        ));
        assert!(matches!(
            manager.initialize().await,
            Err(SessionError::Terminated(ConnectionState::Errored))
        ));
    }

    #[tokio::test]
    async fn test_account_fetch_failure_errors_session() {
        let client = FakeChainClient::new(vec![account(1)]).failing_accounts("node down");
        let mut manager = manager(FakeTransport::new(client));
        let err = manager.initialize().await.unwrap_err();
        assert!(matches!(err, SessionError::Init(SessionInitError::Chain(_))));
        assert_eq!(manager.state(), ConnectionState::Errored);
    }

    #[tokio::test]
    async fn test_accessors_before_initialize() {
        let manager = manager(FakeTransport::new(FakeChainClient::new(vec![account(1)])));
        assert_eq!(manager.state(), ConnectionState::Uninitialized);
        assert_eq!(manager.account_address(), None);
        assert!(matches!(manager.chain_client(), Err(SessionError::NotConnected)));
    }

    #[tokio::test]
    async fn test_accounts_changed() {
        let transport = FakeTransport::new(FakeChainClient::new(vec![account(1)]));
        let mut manager = manager(transport);
        manager.initialize().await.unwrap();

        manager.transport().emit(SessionEvent::AccountsChanged(vec![]));
        manager.process_pending_events().await;
        assert_eq!(manager.account_address(), Some(account(1)));

        manager
            .transport()
            .emit(SessionEvent::AccountsChanged(vec![account(3), account(4)]));
        manager.process_pending_events().await;
        assert_eq!(manager.account_address(), Some(account(3)));
    }

    #[tokio::test]
    async fn test_chain_changed_is_recorded() {
        let transport = FakeTransport::new(FakeChainClient::new(vec![account(1)]));
        let mut manager = manager(transport);
        manager.initialize().await.unwrap();

        manager.transport().emit(SessionEvent::ChainChanged(21));
        manager.process_pending_events().await;
        assert_eq!(manager.chain_id(), Some(21));
        assert_eq!(manager.chain_mismatch(), None);

        manager.transport().emit(SessionEvent::ChainChanged(1));
        let event = manager.next_event().await;
        assert_eq!(event, Some(SessionEvent::ChainChanged(1)));
        assert_eq!(manager.chain_mismatch(), Some(1));
        assert_eq!(manager.state(), ConnectionState::Connected);
        assert!(manager.contract_handle().is_ok());
    }

    #[tokio::test]
    async fn test_error_event_keeps_session() {
        let transport = FakeTransport::new(FakeChainClient::new(vec![account(1)]));
        let mut manager = manager(transport);
        manager.initialize().await.unwrap();
        manager
            .transport()
            .emit(SessionEvent::Error("bridge hiccup".into()));
        manager.process_pending_events().await;
        assert_eq!(manager.last_error(), Some("bridge hiccup"));
        assert_eq!(manager.state(), ConnectionState::Connected);
    }

    #[tokio::test]
    async fn test_disconnect_with_failing_teardown() {
        let transport = FakeTransport::new(FakeChainClient::new(vec![account(1)]))
            .failing_disconnect("already gone");
        let mut manager = manager(transport);
        manager.initialize().await.unwrap();
        manager.transport().emit(SessionEvent::Disconnect {
            code: 4001,
            reason: "user closed".into(),
        });
        manager.process_pending_events().await;
        assert_eq!(manager.state(), ConnectionState::Disconnected);
        assert_eq!(manager.transport().disconnect_calls(), 1);
        assert!(matches!(
            manager.contract_handle(),
            Err(SessionError::NotConnected)
        ));
        assert!(matches!(
            manager.initialize().await,
            Err(SessionError::Terminated(ConnectionState::Disconnected))
        ));
    }

    #[tokio::test]
    async fn test_close_is_idempotent() {
        let transport = FakeTransport::new(FakeChainClient::new(vec![account(1)]));
        let mut manager = manager(transport);
        manager.initialize().await.unwrap();
        manager.close().await;
        manager.close().await;
        assert_eq!(manager.state(), ConnectionState::Disconnected);
        assert_eq!(manager.transport().disconnect_calls(), 1);
    }
}
