// src/services/api_server.rs
//! API Server for the diploma registry
//!
//! This module provides the REST API that stands in for the two pages of the
//! diploma platform:
//! - the public verification portal (hash a PDF, match it against the
//!   connected wallet's diplomas, submit an application)
//! - the admin portal (role-gated minting and transaction status)
//!
//! The server holds a single wallet session, like a browser tab would.

use crate::config::Settings;
use crate::error::DiplomaError;
use crate::models::diploma::{DocumentDigest, VerificationResult, VerificationState};
use crate::models::session::{Roles, SessionStatus, WalletSession};
use crate::models::transaction::{MintRequest, TxPhase};
use crate::services::diploma_issuer::{DiplomaIssuer, TxTracker};
use crate::services::verifier::scan_diplomas_and_compare;
use crate::utils::crypto::compute_pdf_hash;
use crate::utils::format::{explorer_address_url, explorer_tx_url, format_address, format_tx_hash};
use crate::wallet::discovery::{WalletChoice, WalletRegistry};
use crate::wallet::session::{SessionManager, WalletConnector};
use axum::{
    extract::{DefaultBodyLimit, Json, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use bytes::Bytes;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::RwLock;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;

// API request and response structures

/// Request payload for connecting a wallet
#[derive(Deserialize)]
struct ConnectWalletRequest {
    /// Wallet name; may be omitted when only one wallet is available
    #[serde(default)]
    wallet: Option<String>,
}

/// Session state as shown to the caller
#[derive(Serialize)]
struct SessionResponse {
    status: SessionStatus,
    session: Option<WalletSession>,
    has_access: bool,
    explorer_url: Option<String>,
    verification: VerificationResult,
}

/// Response for the admin gate
#[derive(Serialize)]
struct AdminAccessResponse {
    address: String,
    roles: Roles,
    has_access: bool,
}

/// Response containing a document digest
#[derive(Serialize)]
struct HashResponse {
    pdf_hash: DocumentDigest,
}

/// Request payload for verifying a known digest
#[derive(Deserialize)]
struct VerifyDigestRequest {
    pdf_hash: DocumentDigest,
}

/// Response for a verification run
#[derive(Serialize)]
struct VerifyResponse {
    pdf_hash: DocumentDigest,
    result: VerificationResult,
}

/// Application form of the verification portal
#[derive(Deserialize)]
struct ApplicationRequest {
    name: String,
    email: String,
    address: String,
}

#[derive(Serialize)]
struct ApplicationResponse {
    submitted: bool,
    token_id: u64,
}

/// Request payload for minting a diploma
#[derive(Deserialize)]
struct MintPayload {
    recipient: String,
    /// Falls back to the configured default metadata
    #[serde(default)]
    metadata_uri: Option<String>,
    pdf_hash: String,
}

/// Response for a submitted mint
#[derive(Serialize)]
struct MintResponse {
    tx_hash: String,
    explorer_url: String,
}

/// Response with the current transaction phase
#[derive(Serialize)]
struct TxStatusResponse {
    #[serde(flatten)]
    phase: TxPhase,
    explorer_url: Option<String>,
}

/// API server state containing all service dependencies
pub struct ApiServer<K: WalletConnector> {
    /// Loaded configuration
    settings: Arc<Settings>,

    /// The wallet session
    sessions: SessionManager<K>,

    /// Last uploaded document and its verification result
    verification: RwLock<VerificationState>,

    /// Service for mint submission
    issuer: DiplomaIssuer,
}

impl<K: WalletConnector> ApiServer<K> {
    /// Creates a new instance of the API server
    ///
    /// # Arguments
    /// * `settings` - Loaded configuration
    /// * `connector` - Opens wallets against the diploma contract
    pub fn new(settings: Settings, connector: K) -> Self {
        let wallets = WalletRegistry::detect(&settings.wallets, &settings.network.rpc_url);
        for wallet in wallets.providers() {
            info!("Wallet `{}` available ({:?})", wallet.name, wallet.kind);
        }
        let sessions = SessionManager::new(connector, wallets, settings.network.chain_id);
        let tracker = Arc::new(TxTracker::new(settings.mint.status_display()));
        let issuer = DiplomaIssuer::new(tracker, settings.mint.submit_timeout());

        ApiServer {
            settings: Arc::new(settings),
            sessions,
            verification: RwLock::new(VerificationState::default()),
            issuer,
        }
    }

    /// Builds the router with all API routes
    pub fn router(self) -> Router {
        let max_upload = self.settings.server.max_upload_bytes;

        Router::new()
            .route("/wallets", get(Self::list_wallets_handler))
            .route("/wallets/connect", post(Self::connect_wallet_handler))
            .route("/session", get(Self::session_handler).delete(Self::disconnect_handler))
            .route("/admin/access", get(Self::admin_access_handler))
            .route("/documents/hash", post(Self::hash_document_handler))
            .route("/documents/verify", post(Self::verify_document_handler))
            .route("/verify", post(Self::verify_digest_handler))
            .route("/verify/rescan", post(Self::rescan_handler))
            .route("/applications", post(Self::submit_application_handler))
            .route("/mint", post(Self::mint_handler))
            .route("/mint/status", get(Self::mint_status_handler))
            .layer(
                ServiceBuilder::new()
                    .layer(DefaultBodyLimit::max(max_upload))
                    .layer(CorsLayer::permissive()),
            )
            .with_state(Arc::new(self))
    }

    /// Starts the API server and begins listening for requests
    ///
    /// # Arguments
    /// * `addr` - Socket address to bind to (e.g., "127.0.0.1:3000")
    pub async fn run(self, addr: SocketAddr) -> std::io::Result<()> {
        let app = self.router();
        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, app).await
    }

    /// Matches `digest` against the connected wallet's diplomas and records
    /// the outcome as the current verification.
    ///
    /// The outcome is only recorded if the document is still the last upload
    /// and the session scanned is still the active one.
    async fn run_verification(&self, digest: DocumentDigest) -> VerificationResult {
        self.verification.write().await.uploaded = Some(digest.clone());

        let (epoch, active) = self.sessions.snapshot().await;
        let (registry, owner) = match &active {
            Some(a) => (Some(a.registry.as_ref()), Some(a.session.address)),
            None => (None, None),
        };
        let result = VerificationResult::from(scan_diplomas_and_compare(registry, owner, &digest).await);

        let mut state = self.verification.write().await;
        if state.uploaded.as_ref() == Some(&digest) && self.sessions.epoch().await == epoch {
            state.result = result;
        } else {
            debug!("Discarding stale verification of {}", digest);
        }
        result
    }

    async fn session_view(&self) -> SessionResponse {
        let active = self.sessions.active().await;
        let session = active.map(|a| a.session);
        SessionResponse {
            status: self.sessions.status().await,
            has_access: session.as_ref().is_some_and(|s| s.roles.has_access()),
            explorer_url: session
                .as_ref()
                .map(|s| explorer_address_url(&self.settings.network.explorer_url, s.address)),
            session,
            verification: self.verification.read().await.result,
        }
    }

    // =====================
    // Wallet Session Handlers
    // =====================

    /// Lists detected wallets
    ///
    /// # Endpoint
    /// GET /wallets
    async fn list_wallets_handler(State(state): State<Arc<Self>>) -> Json<WalletChoice> {
        Json(state.sessions.wallet_choice())
    }

    /// Connects a wallet and re-runs verification for an uploaded document
    ///
    /// # Endpoint
    /// POST /wallets/connect
    ///
    /// # Responses
    /// - 200 OK: Session with role flags
    /// - 401 Unauthorized: Wallet refused access
    /// - 409 Conflict: Several wallets available and none chosen
    /// - 412 Precondition Failed: Wallet on the wrong network
    /// - 503 Service Unavailable: No wallet found
    async fn connect_wallet_handler(
        State(state): State<Arc<Self>>,
        payload: Option<Json<ConnectWalletRequest>>,
    ) -> Result<Json<SessionResponse>, DiplomaError> {
        let wallet = payload.and_then(|Json(p)| p.wallet);
        state.sessions.connect(wallet.as_deref()).await?;

        let uploaded = state.verification.read().await.uploaded.clone();
        if let Some(digest) = uploaded {
            state.run_verification(digest).await;
        }
        Ok(Json(state.session_view().await))
    }

    /// GET /session
    async fn session_handler(State(state): State<Arc<Self>>) -> Json<SessionResponse> {
        Json(state.session_view().await)
    }

    /// Disconnects the wallet
    ///
    /// # Endpoint
    /// DELETE /session
    async fn disconnect_handler(State(state): State<Arc<Self>>) -> Json<SessionResponse> {
        state.sessions.disconnect().await;
        state.verification.write().await.result = VerificationResult::Unknown;
        Json(state.session_view().await)
    }

    /// Reports whether the connected account may open the admin portal
    ///
    /// # Endpoint
    /// GET /admin/access
    async fn admin_access_handler(
        State(state): State<Arc<Self>>,
    ) -> Result<Json<AdminAccessResponse>, DiplomaError> {
        let active = state.sessions.active().await.ok_or(DiplomaError::NotConnected)?;
        let roles = active.session.roles;
        Ok(Json(AdminAccessResponse {
            address: format_address(active.session.address),
            roles,
            has_access: roles.has_access(),
        }))
    }

    // =====================
    // Verification Handlers
    // =====================

    /// Computes the digest of an uploaded document
    ///
    /// # Endpoint
    /// POST /documents/hash (raw request body)
    async fn hash_document_handler(body: Bytes) -> Result<Json<HashResponse>, DiplomaError> {
        if body.is_empty() {
            return Err(DiplomaError::MissingField("document"));
        }
        Ok(Json(HashResponse { pdf_hash: compute_pdf_hash(&body) }))
    }

    /// Hashes an uploaded document and matches it on chain
    ///
    /// # Endpoint
    /// POST /documents/verify (raw request body)
    async fn verify_document_handler(
        State(state): State<Arc<Self>>,
        body: Bytes,
    ) -> Result<Json<VerifyResponse>, DiplomaError> {
        if body.is_empty() {
            return Err(DiplomaError::MissingField("document"));
        }
        let pdf_hash = compute_pdf_hash(&body);
        let result = state.run_verification(pdf_hash.clone()).await;
        Ok(Json(VerifyResponse { pdf_hash, result }))
    }

    /// Matches a known digest on chain
    ///
    /// # Endpoint
    /// POST /verify
    async fn verify_digest_handler(
        State(state): State<Arc<Self>>,
        Json(payload): Json<VerifyDigestRequest>,
    ) -> Json<VerifyResponse> {
        let result = state.run_verification(payload.pdf_hash.clone()).await;
        Json(VerifyResponse { pdf_hash: payload.pdf_hash, result })
    }

    /// Re-runs verification for the last uploaded document
    ///
    /// # Endpoint
    /// POST /verify/rescan
    async fn rescan_handler(State(state): State<Arc<Self>>) -> Result<Json<VerifyResponse>, DiplomaError> {
        let pdf_hash = state
            .verification
            .read()
            .await
            .uploaded
            .clone()
            .ok_or(DiplomaError::MissingField("document"))?;
        let result = state.run_verification(pdf_hash.clone()).await;
        Ok(Json(VerifyResponse { pdf_hash, result }))
    }

    /// Accepts an application once the diploma is verified
    ///
    /// # Endpoint
    /// POST /applications
    ///
    /// # Responses
    /// - 200 OK: Application accepted
    /// - 400 Bad Request: A field is empty
    /// - 422 Unprocessable Entity: No verified diploma
    async fn submit_application_handler(
        State(state): State<Arc<Self>>,
        Json(payload): Json<ApplicationRequest>,
    ) -> Result<Json<ApplicationResponse>, DiplomaError> {
        for (field, value) in [
            ("name", &payload.name),
            ("email", &payload.email),
            ("address", &payload.address),
        ] {
            if value.trim().is_empty() {
                return Err(DiplomaError::MissingField(field));
            }
        }

        let token_id = state
            .verification
            .read()
            .await
            .result
            .token_id()
            .ok_or(DiplomaError::NotVerified)?;

        info!("Application from {} accepted for diploma {}", payload.name.trim(), token_id);
        Ok(Json(ApplicationResponse { submitted: true, token_id }))
    }

    // =====================
    // Minting Handlers
    // =====================

    /// Submits a diploma mint
    ///
    /// # Endpoint
    /// POST /mint
    ///
    /// # Responses
    /// - 202 Accepted: Transaction submitted; poll `/mint/status`
    /// - 400 Bad Request: Missing or malformed field
    /// - 403 Forbidden: No minter or admin role
    /// - 409 Conflict: A transaction is already pending
    /// - 502 Bad Gateway: The node rejected the transaction
    async fn mint_handler(
        State(state): State<Arc<Self>>,
        Json(payload): Json<MintPayload>,
    ) -> Result<impl IntoResponse, DiplomaError> {
        let request = MintRequest {
            recipient: payload.recipient,
            metadata_uri: payload
                .metadata_uri
                .unwrap_or_else(|| state.settings.mint.default_metadata_uri.clone()),
            pdf_hash: payload.pdf_hash,
        };

        let active = state.sessions.active().await;
        let (registry, roles) = match active {
            Some(a) => (Some(a.registry), a.session.roles),
            None => (None, Roles::default()),
        };

        let tx_hash = state.issuer.submit(registry, roles, &request).await?;
        Ok((
            StatusCode::ACCEPTED,
            Json(MintResponse {
                tx_hash: format_tx_hash(tx_hash),
                explorer_url: explorer_tx_url(&state.settings.network.explorer_url, tx_hash),
            }),
        ))
    }

    /// GET /mint/status
    async fn mint_status_handler(State(state): State<Arc<Self>>) -> Json<TxStatusResponse> {
        let phase = state.issuer.tracker().phase().await;
        let explorer_url = phase
            .tx_hash()
            .map(|hash| explorer_tx_url(&state.settings.network.explorer_url, hash));
        Json(TxStatusResponse { phase, explorer_url })
    }
}
