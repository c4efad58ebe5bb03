// src/services/verifier.rs
//! Diploma verification service.
//!
//! Matches a locally computed document digest against the digests recorded
//! on chain for the tokens a wallet owns.

use crate::contracts::diploma_registry::DiplomaContract;
use crate::models::diploma::{DocumentDigest, ScanOutcome};
use ethers_core::types::Address;
use log::{debug, error, info};

/// Scans the contract for a token owned by `owner` whose stored digest equals
/// `digest`.
///
/// # Arguments
/// * `registry` - Contract to read from, if one is bound
/// * `owner` - Connected account, if any
/// * `digest` - Locally computed digest of the candidate PDF
///
/// # Returns
/// - `Match(id)` for the lowest matching token id
/// - `NotFound` once every id up to `nextId()` has been examined
/// - `Unavailable` when no contract or account is bound
///
/// # Process Flow
/// 1. Reads `nextId()` once
/// 2. Walks ids `1..=nextId` in ascending order, one call at a time
/// 3. Skips any id whose `ownerOf` or `getPdfHash` fails (burned, unminted)
/// 4. Compares stored digests case-insensitively for owned tokens only
pub async fn scan_diplomas_and_compare<C: DiplomaContract>(
    registry: Option<&C>,
    owner: Option<Address>,
    digest: &DocumentDigest,
) -> ScanOutcome {
    let (Some(registry), Some(owner)) = (registry, owner) else {
        return ScanOutcome::Unavailable;
    };

    let last = match registry.next_id().await {
        Ok(last) => last,
        Err(e) => {
            error!("Error scanning diplomas: {}", e);
            return ScanOutcome::NotFound;
        }
    };

    debug!("Scanning tokens 1..={} for {:?}", last, owner);
    for token_id in 1..=last {
        match token_matches(registry, token_id, owner, digest).await {
            Ok(true) => {
                info!("Diploma {} matches digest {}", token_id, digest);
                return ScanOutcome::Match(token_id);
            }
            Ok(false) => {}
            Err(e) => debug!("Skipping token {}: {}", token_id, e),
        }
    }
    ScanOutcome::NotFound
}

async fn token_matches<C: DiplomaContract>(
    registry: &C,
    token_id: u64,
    owner: Address,
    digest: &DocumentDigest,
) -> Result<bool, crate::error::DiplomaError> {
    if registry.owner_of(token_id).await? != owner {
        return Ok(false);
    }
    let on_chain = registry.pdf_hash(token_id).await?;
    Ok(digest.matches(&on_chain))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contracts::mock::MockRegistry;
    use crate::utils::crypto::compute_pdf_hash;

    fn addr(byte: u8) -> Address {
        Address::repeat_byte(byte)
    }

    fn digest_of(data: &[u8]) -> DocumentDigest {
        compute_pdf_hash(data)
    }

    #[tokio::test]
    async fn wallet_without_tokens_finds_nothing() {
        let registry = MockRegistry::new()
            .with_token(1, addr(0xbb), digest_of(b"other").as_str())
            .with_token(2, addr(0xcc), digest_of(b"another").as_str());

        let outcome = scan_diplomas_and_compare(Some(&registry), Some(addr(0xaa)), &digest_of(b"mine")).await;
        assert_eq!(outcome, ScanOutcome::NotFound);
        // Tokens owned by someone else never have their digest read.
        assert!(!registry.calls().iter().any(|c| c.starts_with("getPdfHash")));
    }

    #[tokio::test]
    async fn finds_owned_token_and_tolerates_reverting_ids() {
        let (da, db) = (digest_of(b"diploma a"), digest_of(b"diploma b"));
        let owner = addr(0xaa);
        let registry = MockRegistry::new()
            .with_token(1, addr(0xbb), digest_of(b"x").as_str())
            .with_token(3, owner, da.as_str())
            .with_reverting(5)
            .with_token(7, owner, db.as_str());

        assert_eq!(
            scan_diplomas_and_compare(Some(&registry), Some(owner), &da).await,
            ScanOutcome::Match(3)
        );
        assert_eq!(
            scan_diplomas_and_compare(Some(&registry), Some(owner), &db).await,
            ScanOutcome::Match(7)
        );
        assert_eq!(
            scan_diplomas_and_compare(Some(&registry), Some(owner), &digest_of(b"unrelated")).await,
            ScanOutcome::NotFound
        );
    }

    #[tokio::test]
    async fn empty_contract_never_looks_up_token_zero() {
        let registry = MockRegistry::new().with_next_id(1);
        let outcome = scan_diplomas_and_compare(Some(&registry), Some(addr(0xaa)), &digest_of(b"pdf")).await;

        assert_eq!(outcome, ScanOutcome::NotFound);
        let calls = registry.calls();
        assert!(!calls.contains(&"ownerOf(0)".to_string()));
        assert_eq!(calls, vec!["nextId".to_string(), "ownerOf(1)".to_string()]);
    }

    #[tokio::test]
    async fn duplicate_digests_resolve_to_lowest_id() {
        let owner = addr(0xaa);
        let digest = digest_of(b"copied diploma");
        let registry = MockRegistry::new()
            .with_token(4, owner, digest.as_str())
            .with_token(2, owner, digest.as_str());

        assert_eq!(
            scan_diplomas_and_compare(Some(&registry), Some(owner), &digest).await,
            ScanOutcome::Match(2)
        );
    }

    #[tokio::test]
    async fn stored_digest_comparison_ignores_case() {
        let owner = addr(0xaa);
        let digest = digest_of(b"case");
        let upper = digest.as_str().to_ascii_uppercase();
        let registry = MockRegistry::new().with_token(1, owner, &upper);

        assert_eq!(
            scan_diplomas_and_compare(Some(&registry), Some(owner), &digest).await,
            ScanOutcome::Match(1)
        );
    }

    #[tokio::test]
    async fn unbound_scan_is_unavailable() {
        let registry = MockRegistry::new();
        let digest = digest_of(b"pdf");
        assert_eq!(
            scan_diplomas_and_compare(Some(&registry), None, &digest).await,
            ScanOutcome::Unavailable
        );
        assert_eq!(
            scan_diplomas_and_compare::<MockRegistry>(None, Some(addr(1)), &digest).await,
            ScanOutcome::Unavailable
        );
        assert!(registry.calls().is_empty());
    }

    #[tokio::test]
    async fn counter_failure_reports_no_match() {
        let registry = MockRegistry::new().with_failing_next_id();
        assert_eq!(
            scan_diplomas_and_compare(Some(&registry), Some(addr(0xaa)), &digest_of(b"pdf")).await,
            ScanOutcome::NotFound
        );
    }

    #[tokio::test]
    async fn uploaded_pdf_verifies_against_token_five() {
        let pdf = b"%PDF-1.4 NOVA SBE Master in Finance, 2025".to_vec();
        let owner: Address = "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa".parse().unwrap();
        let digest = compute_pdf_hash(&pdf);
        let registry = MockRegistry::new()
            .with_token(1, addr(0x01), digest_of(b"someone else").as_str())
            .with_reverting(2)
            .with_token(5, owner, digest.as_str());

        assert_eq!(
            scan_diplomas_and_compare(Some(&registry), Some(owner), &digest).await,
            ScanOutcome::Match(5)
        );
    }
}
