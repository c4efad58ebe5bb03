// src/utils/format.rs
//! Display helpers for addresses, hashes and explorer links.

use ethers_core::types::{Address, H256};
use ethers_core::utils::to_checksum;
use serde::Serializer;

/// Formats an address in its EIP-55 checksummed form, as used in every
/// API response.
pub fn format_address(address: Address) -> String {
    to_checksum(&address, None)
}

/// `serialize_with` adapter for [`format_address`].
pub fn serialize_checksummed<S: Serializer>(address: &Address, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format_address(*address))
}

/// Formats a transaction hash as a full lowercase hex string with `0x` prefix.
pub fn format_tx_hash(hash: H256) -> String {
    format!("0x{:x}", hash)
}

/// Block explorer page for an account, using the checksummed address.
pub fn explorer_address_url(explorer: &str, address: Address) -> String {
    format!("{}/address/{}", explorer.trim_end_matches('/'), format_address(address))
}

/// Block explorer page for a transaction.
pub fn explorer_tx_url(explorer: &str, hash: H256) -> String {
    format!("{}/tx/{}", explorer.trim_end_matches('/'), format_tx_hash(hash))
}
