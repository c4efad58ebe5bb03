// src/error.rs
//! Error type shared by every layer of the diploma service.
//!
//! Each variant corresponds to one failure class a caller can observe. The
//! HTTP layer maps them to status codes through the [`IntoResponse`] impl at
//! the bottom of this file.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Failures surfaced by the wallet, scanner, minting and HTTP layers.
#[derive(Debug, Error)]
pub enum DiplomaError {
    /// No wallet provider is configured or detectable.
    #[error("No wallet found. Configure a wallet provider or set its private key")]
    WalletUnavailable,

    /// The caller asked for a wallet that was not detected.
    #[error("wallet `{0}` is not available")]
    UnknownWallet(String),

    /// Several wallets are available and the caller did not pick one.
    #[error("choose a wallet: {}", .0.join(", "))]
    SelectionRequired(Vec<String>),

    /// The wallet refused account access.
    #[error("wallet connection failed: {0}")]
    AccessRejected(String),

    /// The wallet is connected to a different chain than the contract lives on.
    #[error("wrong network: wallet is on chain {actual}, switch to chain {expected}")]
    NetworkMismatch { expected: u64, actual: u64 },

    #[error("no wallet connected")]
    NotConnected,

    #[error("You do not have permission to mint.")]
    Unauthorized,

    /// A required mint or application field is empty.
    #[error("Please fill all fields: `{0}` is empty")]
    MissingField(&'static str),

    #[error("invalid address `{0}`")]
    InvalidAddress(String),

    #[error("invalid document digest `{0}`: expected 0x followed by 64 hex characters")]
    InvalidDigest(String),

    #[error("a transaction is already pending")]
    TransactionInFlight,

    /// The diploma has not been matched on chain yet.
    #[error("diploma has not been verified")]
    NotVerified,

    /// Transaction submission or confirmation failed; the message is the
    /// transport's own.
    #[error("{0}")]
    Transaction(String),

    #[error("contract call failed: {0}")]
    Contract(String),

    #[error("rpc error: {0}")]
    Rpc(String),

    #[error("configuration error: {0}")]
    Config(String),
}

impl DiplomaError {
    /// HTTP status used when the error reaches a handler.
    pub fn status_code(&self) -> StatusCode {
        match self {
            DiplomaError::WalletUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            DiplomaError::UnknownWallet(_) => StatusCode::NOT_FOUND,
            DiplomaError::SelectionRequired(_) => StatusCode::CONFLICT,
            DiplomaError::AccessRejected(_) => StatusCode::UNAUTHORIZED,
            DiplomaError::NetworkMismatch { .. } => StatusCode::PRECONDITION_FAILED,
            DiplomaError::NotConnected => StatusCode::PRECONDITION_REQUIRED,
            DiplomaError::Unauthorized => StatusCode::FORBIDDEN,
            DiplomaError::MissingField(_)
            | DiplomaError::InvalidAddress(_)
            | DiplomaError::InvalidDigest(_) => StatusCode::BAD_REQUEST,
            DiplomaError::TransactionInFlight => StatusCode::CONFLICT,
            DiplomaError::NotVerified => StatusCode::UNPROCESSABLE_ENTITY,
            DiplomaError::Transaction(_)
            | DiplomaError::Contract(_)
            | DiplomaError::Rpc(_) => StatusCode::BAD_GATEWAY,
            DiplomaError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for DiplomaError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(json!({ "error": self.to_string() }))).into_response()
    }
}
