// src/wallet/key_management.rs
//! Local signing key handling.
//!
//! Local-key wallets sign transactions in-process with a secp256k1 key taken
//! from the environment (usually via `.env`).

use crate::error::DiplomaError;
use ethers::signers::{LocalWallet, Wallet};
use ethers_core::utils::hex;
use k256::ecdsa::SigningKey;

/// Builds a signer from a hex-encoded private key (with or without `0x`).
///
/// # Errors
/// Returns `Config` when the key is not 32 bytes of valid hex or is not a
/// valid secp256k1 scalar. The key itself never appears in the message.
pub fn load_signer(private_key: &str) -> Result<LocalWallet, DiplomaError> {
    let private_key_bytes = hex::decode(private_key.trim().trim_start_matches("0x"))
        .map_err(|_| DiplomaError::Config("private key is not valid hex".into()))?;
    let signing_key = SigningKey::from_slice(&private_key_bytes)
        .map_err(|_| DiplomaError::Config("private key is not a valid secp256k1 key".into()))?;
    Ok(Wallet::from(signing_key))
}

/// Reads and parses the key stored in environment variable `key_env`.
pub fn load_signer_from_env(key_env: &str) -> Result<LocalWallet, DiplomaError> {
    let private_key = std::env::var(key_env).map_err(|_| DiplomaError::WalletUnavailable)?;
    load_signer(&private_key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethers::signers::Signer;
    use ethers_core::types::Address;

    // Well-known development key (Hardhat/Anvil account #0).
    const DEV_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    #[test]
    fn derives_address_from_key() {
        let expected: Address = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266".parse().unwrap();
        assert_eq!(load_signer(DEV_KEY).unwrap().address(), expected);
        assert_eq!(load_signer(&DEV_KEY[2..]).unwrap().address(), expected);
    }

    #[test]
    fn rejects_malformed_keys() {
        assert!(matches!(load_signer("0xzz"), Err(DiplomaError::Config(_))));
        assert!(matches!(load_signer("0x1234"), Err(DiplomaError::Config(_))));
        assert!(matches!(load_signer(&"00".repeat(32)), Err(DiplomaError::Config(_))));
    }

    #[test]
    fn missing_variable_means_no_wallet() {
        assert!(matches!(
            load_signer_from_env("KEY_MANAGEMENT_TEST_MISSING"),
            Err(DiplomaError::WalletUnavailable)
        ));
    }
}
