// src/models/transaction.rs
//! Mint request and transaction lifecycle model.

use crate::error::DiplomaError;
use crate::models::diploma::DocumentDigest;
use ethers_core::types::{Address, H256};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Mint form as submitted by an administrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MintRequest {
    /// Student wallet that will own the diploma
    pub recipient: String,
    /// Token metadata URI (usually an IPFS gateway link)
    pub metadata_uri: String,
    /// Digest of the diploma PDF
    pub pdf_hash: String,
}

/// A mint request whose fields have been checked and parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedMint {
    pub recipient: Address,
    pub metadata_uri: String,
    pub pdf_hash: DocumentDigest,
}

impl MintRequest {
    /// Checks the form without touching the network.
    ///
    /// # Errors
    /// - `MissingField` for the first empty field
    /// - `InvalidAddress` when the recipient is not a hex address
    /// - `InvalidDigest` when the digest is malformed
    pub fn validate(&self) -> Result<ValidatedMint, DiplomaError> {
        let recipient = non_empty(&self.recipient, "recipient")?;
        let metadata_uri = non_empty(&self.metadata_uri, "metadata_uri")?;
        let pdf_hash = non_empty(&self.pdf_hash, "pdf_hash")?;

        Ok(ValidatedMint {
            recipient: Address::from_str(recipient)
                .map_err(|_| DiplomaError::InvalidAddress(recipient.to_string()))?,
            metadata_uri: metadata_uri.to_string(),
            pdf_hash: DocumentDigest::parse(pdf_hash)?,
        })
    }
}

fn non_empty<'a>(value: &'a str, field: &'static str) -> Result<&'a str, DiplomaError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(DiplomaError::MissingField(field))
    } else {
        Ok(trimmed)
    }
}

/// Lifecycle of the most recent mint transaction.
///
/// `Idle -> Pending -> Confirmed | Failed -> Idle`; the last step happens
/// after a display timeout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum TxPhase {
    #[default]
    Idle,
    Pending {
        tx_hash: Option<H256>,
        message: String,
    },
    Confirmed {
        tx_hash: H256,
        message: String,
    },
    Failed {
        tx_hash: Option<H256>,
        message: String,
    },
}

impl TxPhase {
    pub fn is_pending(&self) -> bool {
        matches!(self, TxPhase::Pending { .. })
    }

    pub fn tx_hash(&self) -> Option<H256> {
        match self {
            TxPhase::Idle => None,
            TxPhase::Pending { tx_hash, .. } | TxPhase::Failed { tx_hash, .. } => *tx_hash,
            TxPhase::Confirmed { tx_hash, .. } => Some(*tx_hash),
        }
    }
}
