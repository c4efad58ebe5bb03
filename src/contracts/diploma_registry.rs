// src/contracts/diploma_registry.rs
//! Diploma NFT smart contract interface.
//!
//! Provides a high-level API over the deployed diploma contract: the token
//! counter, ownership and stored-digest lookups, the access-control role
//! checks and the `mintDiploma` write.

use crate::error::DiplomaError;
use crate::models::transaction::ValidatedMint;
use ethers::providers::{Middleware, PendingTransaction};
use ethers_contract::Contract;
use ethers_core::{
    abi::Abi,
    types::{Address, H256, U256, U64},
};
use std::future::Future;
use std::sync::Arc;

/// `DEFAULT_ADMIN_ROLE` of OpenZeppelin `AccessControl`: 32 zero bytes.
pub const DEFAULT_ADMIN_ROLE: H256 = H256([0u8; 32]);

/// Compile-time included contract ABI.
const DIPLOMA_ABI: &[u8] = include_bytes!("../abi/DiplomaNFT.json");

/// Operations the service needs from the diploma contract.
///
/// Implemented by [`DiplomaRegistry`] over any `ethers` middleware and by the
/// in-memory mock used in tests.
pub trait DiplomaContract: Send + Sync + 'static {
    /// Next unused token id (`nextId()`).
    fn next_id(&self) -> impl Future<Output = Result<u64, DiplomaError>> + Send;

    /// Current owner of a token (`ownerOf`). Reverts for burned or unminted ids.
    fn owner_of(&self, token_id: u64) -> impl Future<Output = Result<Address, DiplomaError>> + Send;

    /// Digest recorded when the token was minted (`getPdfHash`).
    fn pdf_hash(&self, token_id: u64) -> impl Future<Output = Result<String, DiplomaError>> + Send;

    fn has_role(
        &self,
        role: H256,
        account: Address,
    ) -> impl Future<Output = Result<bool, DiplomaError>> + Send;

    fn has_minter_role(&self, account: Address) -> impl Future<Output = Result<bool, DiplomaError>> + Send;

    fn has_revoker_role(&self, account: Address) -> impl Future<Output = Result<bool, DiplomaError>> + Send;

    /// Submits `mintDiploma` and returns once the transaction is accepted by
    /// the node, without waiting for inclusion.
    fn mint_diploma(&self, mint: &ValidatedMint) -> impl Future<Output = Result<H256, DiplomaError>> + Send;

    /// Waits for inclusion. `Ok(true)` when the receipt reports success,
    /// `Ok(false)` when the transaction reverted.
    fn await_confirmation(&self, tx_hash: H256) -> impl Future<Output = Result<bool, DiplomaError>> + Send;
}

/// Diploma contract bound to an `ethers` middleware.
///
/// # Type Parameters
/// * `M` - Middleware stack: a bare `Provider` for wallet endpoints that sign
///   themselves, or a `SignerMiddleware` for a local key
pub struct DiplomaRegistry<M> {
    /// Underlying contract instance
    contract: Contract<M>,
    /// Same client the contract uses, kept for receipt polling
    client: Arc<M>,
}

impl<M> DiplomaRegistry<M>
where
    M: Middleware + 'static,
{
    /// Creates a new DiplomaRegistry instance.
    ///
    /// # Arguments
    /// * `client` - Middleware used for calls and transactions
    /// * `contract_address` - Address of the deployed diploma contract
    ///
    /// # Errors
    /// Returns `Config` if the bundled ABI cannot be parsed
    pub fn new(client: M, contract_address: Address) -> Result<Self, DiplomaError> {
        let abi = Abi::load(DIPLOMA_ABI)
            .map_err(|e| DiplomaError::Config(format!("invalid diploma ABI: {}", e)))?;
        let client = Arc::new(client);
        let contract = Contract::new(contract_address, abi, client.clone());
        Ok(Self { contract, client })
    }

    pub fn address(&self) -> Address {
        self.contract.address()
    }

    async fn read<T, R>(&self, method: &str, params: T) -> Result<R, DiplomaError>
    where
        T: ethers_core::abi::Tokenize,
        R: ethers_core::abi::Detokenize,
    {
        self.contract
            .method::<_, R>(method, params)
            .map_err(contract_error)?
            .call()
            .await
            .map_err(contract_error)
    }
}

fn contract_error(err: impl std::fmt::Display) -> DiplomaError {
    DiplomaError::Contract(err.to_string())
}

impl<M> DiplomaContract for DiplomaRegistry<M>
where
    M: Middleware + 'static,
{
    async fn next_id(&self) -> Result<u64, DiplomaError> {
        let next: U256 = self.read("nextId", ()).await?;
        if next > U256::from(u64::MAX) {
            return Err(DiplomaError::Contract(format!("nextId {} exceeds u64", next)));
        }
        Ok(next.as_u64())
    }

    async fn owner_of(&self, token_id: u64) -> Result<Address, DiplomaError> {
        self.read("ownerOf", U256::from(token_id)).await
    }

    async fn pdf_hash(&self, token_id: u64) -> Result<String, DiplomaError> {
        self.read("getPdfHash", U256::from(token_id)).await
    }

    async fn has_role(&self, role: H256, account: Address) -> Result<bool, DiplomaError> {
        self.read("hasRole", (role, account)).await
    }

    async fn has_minter_role(&self, account: Address) -> Result<bool, DiplomaError> {
        self.read("hasMinterRole", account).await
    }

    async fn has_revoker_role(&self, account: Address) -> Result<bool, DiplomaError> {
        self.read("hasRevokerRole", account).await
    }

    async fn mint_diploma(&self, mint: &ValidatedMint) -> Result<H256, DiplomaError> {
        let call = self
            .contract
            .method::<_, H256>(
                "mintDiploma",
                (
                    mint.recipient,
                    mint.metadata_uri.clone(),
                    mint.pdf_hash.as_str().to_string(),
                ),
            )
            .map_err(contract_error)?;

        let pending_tx = call
            .send()
            .await
            .map_err(|e| DiplomaError::Transaction(e.to_string()))?;
        Ok(pending_tx.tx_hash())
    }

    async fn await_confirmation(&self, tx_hash: H256) -> Result<bool, DiplomaError> {
        let receipt = PendingTransaction::new(tx_hash, self.client.provider())
            .await
            .map_err(|e| DiplomaError::Transaction(e.to_string()))?
            .ok_or_else(|| DiplomaError::Transaction("transaction dropped from mempool".into()))?;
        Ok(receipt.status != Some(U64::zero()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethers::providers::Provider;

    #[test]
    fn bundled_abi_declares_every_contract_function() {
        let abi = Abi::load(DIPLOMA_ABI).unwrap();
        for name in [
            "mintDiploma",
            "ownerOf",
            "getPdfHash",
            "nextId",
            "hasRole",
            "hasMinterRole",
            "hasRevokerRole",
        ] {
            assert!(abi.function(name).is_ok(), "missing {name}");
        }
    }

    #[test]
    fn registry_binds_to_contract_address() {
        let (provider, _mock) = Provider::mocked();
        let address: Address = "0x1E0AA66Ad5B46e2af5a5587BEcf7Fb15b6E043fc".parse().unwrap();
        let registry = DiplomaRegistry::new(provider, address).unwrap();
        assert_eq!(registry.address(), address);
    }

    #[tokio::test]
    async fn failed_read_maps_to_contract_error() {
        // No queued response: the mock transport errors on the first request.
        let (provider, _mock) = Provider::mocked();
        let registry = DiplomaRegistry::new(provider, Address::zero()).unwrap();
        assert!(matches!(registry.next_id().await, Err(DiplomaError::Contract(_))));
    }
}
