// src/services/diploma_issuer.rs
//! Diploma minting service.
//!
//! Submits `mintDiploma` on behalf of a connected administrator or minter and
//! tracks the resulting transaction until it is confirmed or fails.

use crate::contracts::diploma_registry::DiplomaContract;
use crate::error::DiplomaError;
use crate::models::session::Roles;
use crate::models::transaction::{MintRequest, TxPhase, ValidatedMint};
use ethers_core::types::H256;
use log::{error, info};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{oneshot, Mutex};

/// Holds the phase of the latest mint transaction.
///
/// Every submission bumps a generation counter so that a late confirmation
/// or reset from an older submission never overwrites a newer one.
pub struct TxTracker {
    state: Mutex<(u64, TxPhase)>,
    display_timeout: Duration,
}

impl TxTracker {
    pub fn new(display_timeout: Duration) -> Self {
        Self {
            state: Mutex::new((0, TxPhase::Idle)),
            display_timeout,
        }
    }

    pub async fn phase(&self) -> TxPhase {
        self.state.lock().await.1.clone()
    }

    /// Enters `pending` and returns the new generation.
    ///
    /// # Errors
    /// `TransactionInFlight` if a transaction is already pending.
    pub async fn begin(&self) -> Result<u64, DiplomaError> {
        let mut state = self.state.lock().await;
        if state.1.is_pending() {
            return Err(DiplomaError::TransactionInFlight);
        }
        state.0 += 1;
        state.1 = TxPhase::Pending {
            tx_hash: None,
            message: "Sending transaction…".into(),
        };
        Ok(state.0)
    }

    /// Moves `generation` to `phase` if no newer submission replaced it.
    pub async fn update(&self, generation: u64, phase: TxPhase) {
        let mut state = self.state.lock().await;
        if state.0 == generation {
            state.1 = phase;
        }
    }

    /// Waits out the display timeout, then returns `generation` to `idle`.
    pub async fn expire(&self, generation: u64) {
        tokio::time::sleep(self.display_timeout).await;
        self.update(generation, TxPhase::Idle).await;
    }
}

/// Mint submission service.
#[derive(Clone)]
pub struct DiplomaIssuer {
    tracker: Arc<TxTracker>,
    submit_timeout: Duration,
}

impl DiplomaIssuer {
    /// # Arguments
    /// * `tracker` - Phase holder shared with the status endpoint
    /// * `submit_timeout` - Longest wait for the node to accept a submission
    pub fn new(tracker: Arc<TxTracker>, submit_timeout: Duration) -> Self {
        Self { tracker, submit_timeout }
    }

    pub fn tracker(&self) -> &Arc<TxTracker> {
        &self.tracker
    }

    /// Validates and submits a mint.
    ///
    /// # Arguments
    /// * `registry` - Contract bound to the connected wallet, if any
    /// * `roles` - Role flags of the connected wallet
    /// * `request` - Mint form
    ///
    /// # Returns
    /// Hash of the submitted transaction. Submission and confirmation run in
    /// a spawned task, so the tracker settles even if the caller goes away;
    /// progress is visible through [`TxTracker::phase`].
    ///
    /// # Errors
    /// Checked in order, all before any network call:
    /// - `Unauthorized` without admin or minter role
    /// - `NotConnected` without a contract
    /// - `MissingField` / `InvalidAddress` / `InvalidDigest` for bad input
    /// - `TransactionInFlight` while another mint is pending
    ///
    /// then `Transaction` with the node's message if submission fails or
    /// times out.
    pub async fn submit<C: DiplomaContract>(
        &self,
        registry: Option<Arc<C>>,
        roles: Roles,
        request: &MintRequest,
    ) -> Result<H256, DiplomaError> {
        if !roles.can_mint() {
            return Err(DiplomaError::Unauthorized);
        }
        let registry = registry.ok_or(DiplomaError::NotConnected)?;
        let mint = request.validate()?;

        let generation = self.tracker.begin().await?;
        let (sent_tx, sent_rx) = oneshot::channel();
        tokio::spawn(drive_mint(
            self.tracker.clone(),
            registry,
            mint,
            generation,
            self.submit_timeout,
            sent_tx,
        ));

        sent_rx
            .await
            .unwrap_or_else(|_| Err(DiplomaError::Transaction("mint task stopped before submission".into())))
    }
}

/// Sends `mint`, reports the submission through `sent`, then follows the
/// transaction to a final phase and expires it.
async fn drive_mint<C: DiplomaContract>(
    tracker: Arc<TxTracker>,
    registry: Arc<C>,
    mint: ValidatedMint,
    generation: u64,
    submit_timeout: Duration,
    sent: oneshot::Sender<Result<H256, DiplomaError>>,
) {
    let submitted = match tokio::time::timeout(submit_timeout, registry.mint_diploma(&mint)).await {
        Ok(result) => result,
        Err(_) => Err(DiplomaError::Transaction(format!(
            "no response from the node after {}s",
            submit_timeout.as_secs()
        ))),
    };

    let tx_hash = match submitted {
        Ok(tx_hash) => tx_hash,
        Err(e) => {
            error!("Mint for {:?} failed: {}", mint.recipient, e);
            tracker
                .update(generation, TxPhase::Failed { tx_hash: None, message: e.to_string() })
                .await;
            // The caller may have gone; the phase above is the record.
            let _ = sent.send(Err(e));
            tracker.expire(generation).await;
            return;
        }
    };

    info!("Mint for {:?} submitted as {:?}", mint.recipient, tx_hash);
    tracker
        .update(
            generation,
            TxPhase::Pending {
                tx_hash: Some(tx_hash),
                message: "Waiting for blockchain confirmation…".into(),
            },
        )
        .await;
    let _ = sent.send(Ok(tx_hash));

    let phase = match registry.await_confirmation(tx_hash).await {
        Ok(true) => {
            info!("Transaction {:?} confirmed", tx_hash);
            TxPhase::Confirmed { tx_hash, message: "Transaction confirmed!".into() }
        }
        Ok(false) => TxPhase::Failed {
            tx_hash: Some(tx_hash),
            message: "Transaction reverted.".into(),
        },
        Err(e) => TxPhase::Failed { tx_hash: Some(tx_hash), message: e.to_string() },
    };
    tracker.update(generation, phase).await;
    tracker.expire(generation).await;
}
