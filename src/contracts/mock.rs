// src/contracts/mock.rs
//! In-memory diploma contract for tests.

use crate::contracts::diploma_registry::{DiplomaContract, DEFAULT_ADMIN_ROLE};
use crate::error::DiplomaError;
use crate::models::session::Roles;
use crate::models::transaction::ValidatedMint;
use ethers_core::types::{Address, H256};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Contract double with scripted tokens, roles and transaction outcomes.
/// Every call is recorded so tests can assert which reads were issued.
pub struct MockRegistry {
    next_id: u64,
    tokens: HashMap<u64, (Address, String)>,
    reverting: HashSet<u64>,
    next_id_fails: bool,
    roles: HashMap<Address, Roles>,
    mint_error: Option<String>,
    confirmation: Result<bool, String>,
    mint_hangs: bool,
    owner_delay: Option<Duration>,
    calls: CallLog,
}

/// Shared view of the calls a [`MockRegistry`] received. Stays readable after
/// the registry itself has been moved into a connection.
#[derive(Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<String>>>);

impl CallLog {
    pub fn calls(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    fn push(&self, call: String) {
        self.0.lock().unwrap().push(call);
    }
}

impl Default for MockRegistry {
    fn default() -> Self {
        Self {
            next_id: 1,
            tokens: HashMap::new(),
            reverting: HashSet::new(),
            next_id_fails: false,
            roles: HashMap::new(),
            mint_error: None,
            confirmation: Ok(true),
            mint_hangs: false,
            owner_delay: None,
            calls: CallLog::default(),
        }
    }
}

impl MockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a minted token and advances the counter past it.
    pub fn with_token(mut self, token_id: u64, owner: Address, pdf_hash: &str) -> Self {
        self.tokens.insert(token_id, (owner, pdf_hash.to_string()));
        self.next_id = self.next_id.max(token_id + 1);
        self
    }

    /// Makes every read of `token_id` revert, as a burned token would.
    pub fn with_reverting(mut self, token_id: u64) -> Self {
        self.reverting.insert(token_id);
        self.next_id = self.next_id.max(token_id + 1);
        self
    }

    pub fn with_next_id(mut self, next_id: u64) -> Self {
        self.next_id = next_id;
        self
    }

    pub fn with_failing_next_id(mut self) -> Self {
        self.next_id_fails = true;
        self
    }

    pub fn with_roles(mut self, account: Address, roles: Roles) -> Self {
        self.roles.insert(account, roles);
        self
    }

    pub fn with_mint_error(mut self, message: &str) -> Self {
        self.mint_error = Some(message.to_string());
        self
    }

    pub fn with_confirmation(mut self, confirmation: Result<bool, String>) -> Self {
        self.confirmation = confirmation;
        self
    }

    /// `mintDiploma` never returns, like a node that stopped answering.
    pub fn with_hanging_mint(mut self) -> Self {
        self.mint_hangs = true;
        self
    }

    /// Every `ownerOf` takes `delay` before answering.
    pub fn with_owner_delay(mut self, delay: Duration) -> Self {
        self.owner_delay = Some(delay);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.calls()
    }

    pub fn call_log(&self) -> CallLog {
        self.calls.clone()
    }

    fn record(&self, call: String) {
        self.calls.push(call);
    }

    fn roles_of(&self, account: Address) -> Roles {
        self.roles.get(&account).copied().unwrap_or_default()
    }

    fn token(&self, token_id: u64) -> Result<&(Address, String), DiplomaError> {
        if self.reverting.contains(&token_id) {
            return Err(DiplomaError::Contract("execution reverted".into()));
        }
        self.tokens
            .get(&token_id)
            .ok_or_else(|| DiplomaError::Contract("execution reverted: ERC721NonexistentToken".into()))
    }
}

impl DiplomaContract for MockRegistry {
    async fn next_id(&self) -> Result<u64, DiplomaError> {
        self.record("nextId".into());
        if self.next_id_fails {
            return Err(DiplomaError::Contract("connection refused".into()));
        }
        Ok(self.next_id)
    }

    async fn owner_of(&self, token_id: u64) -> Result<Address, DiplomaError> {
        self.record(format!("ownerOf({token_id})"));
        if let Some(delay) = self.owner_delay {
            tokio::time::sleep(delay).await;
        }
        self.token(token_id).map(|(owner, _)| *owner)
    }

    async fn pdf_hash(&self, token_id: u64) -> Result<String, DiplomaError> {
        self.record(format!("getPdfHash({token_id})"));
        self.token(token_id).map(|(_, hash)| hash.clone())
    }

    async fn has_role(&self, role: H256, account: Address) -> Result<bool, DiplomaError> {
        self.record("hasRole".into());
        Ok(role == DEFAULT_ADMIN_ROLE && self.roles_of(account).is_admin)
    }

    async fn has_minter_role(&self, account: Address) -> Result<bool, DiplomaError> {
        self.record("hasMinterRole".into());
        Ok(self.roles_of(account).is_minter)
    }

    async fn has_revoker_role(&self, account: Address) -> Result<bool, DiplomaError> {
        self.record("hasRevokerRole".into());
        Ok(self.roles_of(account).is_revoker)
    }

    async fn mint_diploma(&self, mint: &ValidatedMint) -> Result<H256, DiplomaError> {
        self.record(format!("mintDiploma({:?})", mint.recipient));
        if self.mint_hangs {
            std::future::pending::<()>().await;
        }
        match &self.mint_error {
            Some(message) => Err(DiplomaError::Transaction(message.clone())),
            None => Ok(H256::repeat_byte(0x42)),
        }
    }

    async fn await_confirmation(&self, _tx_hash: H256) -> Result<bool, DiplomaError> {
        self.confirmation.clone().map_err(DiplomaError::Transaction)
    }
}
