// src/models/diploma.rs
//! Diploma verification data model.
//!
//! A diploma is an NFT whose contract stores the SHA-256 digest of the issued
//! PDF. Verification hashes a candidate PDF and looks for a token owned by the
//! connected wallet that carries the same digest.

use crate::error::DiplomaError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// `0x`-prefixed lowercase hex SHA-256 digest of a document.
///
/// Construction normalises case, so two digests of the same bytes always
/// compare equal regardless of how they were typed in.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DocumentDigest(String);

impl DocumentDigest {
    const HEX_LEN: usize = 64;

    /// Parses a user- or chain-supplied digest.
    ///
    /// # Errors
    /// `InvalidDigest` when the prefix is missing or the body is not exactly
    /// 64 hex characters.
    pub fn parse(value: &str) -> Result<Self, DiplomaError> {
        let trimmed = value.trim();
        let body = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .ok_or_else(|| DiplomaError::InvalidDigest(value.to_string()))?;

        if body.len() != Self::HEX_LEN || !body.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(DiplomaError::InvalidDigest(value.to_string()));
        }
        Ok(Self(format!("0x{}", body.to_ascii_lowercase())))
    }

    /// Wraps an already formatted digest. Callers must pass `0x` + 64
    /// lowercase hex characters.
    pub(crate) fn from_hex_unchecked(value: String) -> Self {
        Self(value)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Compares against a digest string read from the contract, ignoring case.
    pub fn matches(&self, on_chain: &str) -> bool {
        self.0.eq_ignore_ascii_case(on_chain.trim())
    }
}

impl fmt::Display for DocumentDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for DocumentDigest {
    type Error = DiplomaError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<DocumentDigest> for String {
    fn from(digest: DocumentDigest) -> Self {
        digest.0
    }
}

/// Outcome of one scan over the contract's tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanOutcome {
    /// Lowest owned token id whose stored digest matched.
    Match(u64),
    /// The scan ran to the end without a match.
    NotFound,
    /// No contract or account was bound, so nothing was scanned.
    Unavailable,
}

/// What the verification portal shows for the current document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum VerificationResult {
    /// No check has run yet.
    #[default]
    Unknown,
    Verified { token_id: u64 },
    NotFound,
}

impl VerificationResult {
    pub fn token_id(&self) -> Option<u64> {
        match self {
            VerificationResult::Verified { token_id } => Some(*token_id),
            _ => None,
        }
    }
}

impl From<ScanOutcome> for VerificationResult {
    fn from(outcome: ScanOutcome) -> Self {
        match outcome {
            ScanOutcome::Match(token_id) => VerificationResult::Verified { token_id },
            ScanOutcome::NotFound => VerificationResult::NotFound,
            ScanOutcome::Unavailable => VerificationResult::Unknown,
        }
    }
}

/// Verification state kept between requests: the last uploaded document and
/// what the most recent scan said about it.
#[derive(Debug, Clone, Default)]
pub struct VerificationState {
    pub uploaded: Option<DocumentDigest>,
    pub result: VerificationResult,
}
