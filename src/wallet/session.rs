// src/wallet/session.rs
//! Wallet session lifecycle.
//!
//! Connecting walks `idle -> connecting -> checking -> done`, or lands in
//! `error` at the first failure. Only one session exists at a time; it is
//! held in memory and dropped on disconnect.

use crate::contracts::diploma_registry::{DiplomaContract, DEFAULT_ADMIN_ROLE};
use crate::error::DiplomaError;
use crate::models::session::{Roles, SessionStatus, WalletSession};
use crate::wallet::discovery::{WalletChoice, WalletProvider, WalletRegistry};
use chrono::Utc;
use ethers_core::types::Address;
use log::{info, warn};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::RwLock;

/// A wallet that granted account access, bound to the diploma contract.
pub struct Connection<C> {
    pub account: Address,
    pub chain_id: u64,
    pub registry: C,
}

/// Opens a wallet: requests account access and reports the wallet's chain.
///
/// Implementations must not call the diploma contract; the session manager
/// validates the chain before any contract read.
pub trait WalletConnector: Send + Sync + 'static {
    type Registry: DiplomaContract;

    fn connect(
        &self,
        wallet: &WalletProvider,
    ) -> impl Future<Output = Result<Connection<Self::Registry>, DiplomaError>> + Send;
}

/// Reads the three role flags concurrently.
pub async fn fetch_roles<C: DiplomaContract>(registry: &C, account: Address) -> Result<Roles, DiplomaError> {
    let (is_minter, is_revoker, is_admin) = futures::try_join!(
        registry.has_minter_role(account),
        registry.has_revoker_role(account),
        registry.has_role(DEFAULT_ADMIN_ROLE, account),
    )?;
    Ok(Roles { is_admin, is_minter, is_revoker })
}

/// The connected session together with its contract handle.
pub struct ActiveSession<C> {
    pub session: WalletSession,
    pub registry: Arc<C>,
}

impl<C> Clone for ActiveSession<C> {
    fn clone(&self) -> Self {
        Self {
            session: self.session.clone(),
            registry: self.registry.clone(),
        }
    }
}

struct SessionState<C> {
    status: SessionStatus,
    active: Option<ActiveSession<C>>,
    /// Bumped whenever the active session is dropped or replaced
    epoch: u64,
}

/// Owns the wallet session.
pub struct SessionManager<K: WalletConnector> {
    connector: K,
    wallets: WalletRegistry,
    expected_chain_id: u64,
    state: RwLock<SessionState<K::Registry>>,
}

impl<K: WalletConnector> SessionManager<K> {
    pub fn new(connector: K, wallets: WalletRegistry, expected_chain_id: u64) -> Self {
        Self {
            connector,
            wallets,
            expected_chain_id,
            state: RwLock::new(SessionState {
                status: SessionStatus::Idle,
                active: None,
                epoch: 0,
            }),
        }
    }

    pub fn wallet_choice(&self) -> WalletChoice {
        self.wallets.choice()
    }

    pub async fn status(&self) -> SessionStatus {
        self.state.read().await.status.clone()
    }

    pub async fn active(&self) -> Option<ActiveSession<K::Registry>> {
        self.state.read().await.active.clone()
    }

    /// Identifies the current session. Work started against one session can
    /// compare epochs to tell whether that session is still the active one.
    pub async fn epoch(&self) -> u64 {
        self.state.read().await.epoch
    }

    /// The active session together with its epoch, read atomically.
    pub async fn snapshot(&self) -> (u64, Option<ActiveSession<K::Registry>>) {
        let state = self.state.read().await;
        (state.epoch, state.active.clone())
    }

    /// Connects the selected wallet, replacing any current session.
    ///
    /// # Arguments
    /// * `wallet` - Provider name, or `None` to use the only detected one
    ///
    /// # Errors
    /// - Selection errors from [`WalletRegistry::select`]; state is untouched
    /// - `AccessRejected` when the wallet refuses account access
    /// - `NetworkMismatch` when the wallet is on the wrong chain; no contract
    ///   call is made in that case
    /// - `Contract` when a role lookup fails
    pub async fn connect(&self, wallet: Option<&str>) -> Result<WalletSession, DiplomaError> {
        let provider = self.wallets.select(wallet)?;
        self.set_status(SessionStatus::Connecting, true).await;

        match self.open(provider).await {
            Ok(active) => {
                let session = active.session.clone();
                let mut state = self.state.write().await;
                state.status = SessionStatus::Done;
                state.active = Some(active);
                state.epoch += 1;
                info!(
                    "Wallet `{}` connected as {:?} (admin: {}, minter: {}, revoker: {})",
                    session.wallet,
                    session.address,
                    session.roles.is_admin,
                    session.roles.is_minter,
                    session.roles.is_revoker
                );
                Ok(session)
            }
            Err(e) => {
                warn!("Wallet `{}` connection failed: {}", provider.name, e);
                self.set_status(SessionStatus::Error(e.to_string()), true).await;
                Err(e)
            }
        }
    }

    async fn open(&self, provider: &WalletProvider) -> Result<ActiveSession<K::Registry>, DiplomaError> {
        let connection = self.connector.connect(provider).await?;
        if connection.chain_id != self.expected_chain_id {
            return Err(DiplomaError::NetworkMismatch {
                expected: self.expected_chain_id,
                actual: connection.chain_id,
            });
        }

        self.set_status(SessionStatus::Checking, false).await;
        let roles = fetch_roles(&connection.registry, connection.account).await?;

        Ok(ActiveSession {
            session: WalletSession {
                wallet: provider.name.clone(),
                address: connection.account,
                chain_id: connection.chain_id,
                roles,
                connected_at: Utc::now(),
            },
            registry: Arc::new(connection.registry),
        })
    }

    /// Drops the session and returns to `idle`.
    pub async fn disconnect(&self) {
        let mut state = self.state.write().await;
        if let Some(active) = state.active.take() {
            info!("Wallet {:?} disconnected", active.session.address);
        }
        state.status = SessionStatus::Idle;
        state.epoch += 1;
    }

    async fn set_status(&self, status: SessionStatus, clear: bool) {
        let mut state = self.state.write().await;
        state.status = status;
        if clear {
            state.active = None;
            state.epoch += 1;
        }
    }
}
