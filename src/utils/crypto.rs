// src/utils/crypto.rs
//! Document fingerprinting.
//!
//! Diplomas are identified on chain by the SHA-256 digest of the PDF that was
//! issued, stored as a `0x`-prefixed lowercase hex string.

use crate::models::diploma::DocumentDigest;
use ethers_core::utils::hex;
use ring::digest::{digest, SHA256};

/// Computes the SHA-256 fingerprint of a document.
///
/// # Arguments
/// * `data` - Raw file bytes
///
/// # Returns
/// The digest as `0x` followed by 64 lowercase hex characters.
pub fn compute_pdf_hash(data: &[u8]) -> DocumentDigest {
    let hash = digest(&SHA256, data);
    DocumentDigest::from_hex_unchecked(format!("0x{}", hex::encode(hash.as_ref())))
}
