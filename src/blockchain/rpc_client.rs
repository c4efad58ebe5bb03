// src/blockchain/rpc_client.rs
//! JSON-RPC wallet client.
//!
//! Opens the configured wallet providers against an Ethereum JSON-RPC
//! endpoint and binds the diploma contract to them:
//! - injected wallets are asked for accounts with `eth_requestAccounts` and
//!   sign their own transactions (`eth_sendTransaction` with `from` set)
//! - local-key wallets sign in-process through `SignerMiddleware`

use crate::contracts::diploma_registry::{DiplomaContract, DiplomaRegistry};
use crate::error::DiplomaError;
use crate::models::transaction::ValidatedMint;
use crate::wallet::discovery::{WalletProvider, WalletSource};
use crate::wallet::key_management::load_signer_from_env;
use crate::wallet::session::{Connection, WalletConnector};
use ethers::middleware::SignerMiddleware;
use ethers::providers::{Http, Middleware, Provider, ProviderError, RpcError};
use ethers::signers::{LocalWallet, Signer};
use ethers_core::types::{Address, H256};
use log::debug;

/// EIP-1193 "User Rejected Request".
const USER_REJECTED: i64 = 4001;

/// Diploma contract bound to whichever kind of wallet opened the session.
pub enum SessionRegistry {
    Injected(DiplomaRegistry<Provider<Http>>),
    LocalKey(DiplomaRegistry<SignerMiddleware<Provider<Http>, LocalWallet>>),
}

macro_rules! delegate {
    ($self:ident, $registry:ident => $call:expr) => {
        match $self {
            SessionRegistry::Injected($registry) => $call.await,
            SessionRegistry::LocalKey($registry) => $call.await,
        }
    };
}

impl DiplomaContract for SessionRegistry {
    async fn next_id(&self) -> Result<u64, DiplomaError> {
        delegate!(self, r => r.next_id())
    }

    async fn owner_of(&self, token_id: u64) -> Result<Address, DiplomaError> {
        delegate!(self, r => r.owner_of(token_id))
    }

    async fn pdf_hash(&self, token_id: u64) -> Result<String, DiplomaError> {
        delegate!(self, r => r.pdf_hash(token_id))
    }

    async fn has_role(&self, role: H256, account: Address) -> Result<bool, DiplomaError> {
        delegate!(self, r => r.has_role(role, account))
    }

    async fn has_minter_role(&self, account: Address) -> Result<bool, DiplomaError> {
        delegate!(self, r => r.has_minter_role(account))
    }

    async fn has_revoker_role(&self, account: Address) -> Result<bool, DiplomaError> {
        delegate!(self, r => r.has_revoker_role(account))
    }

    async fn mint_diploma(&self, mint: &ValidatedMint) -> Result<H256, DiplomaError> {
        delegate!(self, r => r.mint_diploma(mint))
    }

    async fn await_confirmation(&self, tx_hash: H256) -> Result<bool, DiplomaError> {
        delegate!(self, r => r.await_confirmation(tx_hash))
    }
}

/// Connects wallet providers to the deployed diploma contract.
#[derive(Clone, Debug)]
pub struct RpcConnector {
    /// Address of the deployed diploma contract
    contract_address: Address,
}

impl RpcConnector {
    pub fn new(contract_address: Address) -> Self {
        Self { contract_address }
    }

    async fn connect_injected(&self, rpc_url: &str) -> Result<Connection<SessionRegistry>, DiplomaError> {
        let provider = open_provider(rpc_url)?;

        let accounts: Vec<Address> = provider
            .request("eth_requestAccounts", ())
            .await
            .map_err(classify_access_error)?;
        let account = accounts
            .first()
            .copied()
            .ok_or_else(|| DiplomaError::AccessRejected("wallet returned no accounts".into()))?;

        let chain_id = chain_id(&provider).await?;
        let registry = DiplomaRegistry::new(provider.with_sender(account), self.contract_address)?;
        debug!("Diploma contract {:?} bound to injected account {:?}", registry.address(), account);

        Ok(Connection {
            account,
            chain_id,
            registry: SessionRegistry::Injected(registry),
        })
    }

    async fn connect_local(
        &self,
        rpc_url: &str,
        key_env: &str,
    ) -> Result<Connection<SessionRegistry>, DiplomaError> {
        let provider = open_provider(rpc_url)?;
        let chain_id = chain_id(&provider).await?;

        let wallet = load_signer_from_env(key_env)?.with_chain_id(chain_id);
        let account = wallet.address();
        let client = SignerMiddleware::new(provider, wallet);
        let registry = DiplomaRegistry::new(client, self.contract_address)?;
        debug!("Diploma contract {:?} bound to local signer {:?}", registry.address(), account);

        Ok(Connection {
            account,
            chain_id,
            registry: SessionRegistry::LocalKey(registry),
        })
    }
}

impl WalletConnector for RpcConnector {
    type Registry = SessionRegistry;

    async fn connect(&self, wallet: &WalletProvider) -> Result<Connection<SessionRegistry>, DiplomaError> {
        debug!("Opening wallet `{}` ({:?})", wallet.name, wallet.kind);
        match &wallet.source {
            WalletSource::Injected { rpc_url } => self.connect_injected(rpc_url).await,
            WalletSource::LocalKey { rpc_url, key_env } => self.connect_local(rpc_url, key_env).await,
        }
    }
}

fn open_provider(rpc_url: &str) -> Result<Provider<Http>, DiplomaError> {
    Provider::<Http>::try_from(rpc_url)
        .map_err(|e| DiplomaError::Config(format!("invalid RPC URL `{}`: {}", rpc_url, e)))
}

async fn chain_id(provider: &Provider<Http>) -> Result<u64, DiplomaError> {
    Ok(provider
        .get_chainid()
        .await
        .map_err(|e| DiplomaError::Rpc(e.to_string()))?
        .as_u64())
}

/// Maps a failed account request. Any JSON-RPC error from the wallet (4001
/// being the user saying no) is a refusal; anything else is the transport.
fn classify_access_error(err: ProviderError) -> DiplomaError {
    match err.as_error_response() {
        Some(rpc) if rpc.code == USER_REJECTED => DiplomaError::AccessRejected(rpc.message.clone()),
        Some(rpc) => DiplomaError::AccessRejected(format!("{} (code {})", rpc.message, rpc.code)),
        None => DiplomaError::Rpc(err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WalletKind;
    use mockito::{mock, Matcher};
    use serde_json::json;

    fn injected(path: &str) -> WalletProvider {
        WalletProvider {
            name: "frame".into(),
            kind: WalletKind::Generic,
            source: WalletSource::Injected {
                rpc_url: format!("{}{}", mockito::server_url(), path),
            },
        }
    }

    fn rpc_mock(path: &str, method: &str, body: serde_json::Value) -> mockito::Mock {
        mock("POST", path)
            .match_body(Matcher::PartialJson(json!({ "method": method })))
            .with_header("content-type", "application/json")
            .with_body(body.to_string())
            .create()
    }

    #[tokio::test]
    async fn injected_wallet_reports_account_and_chain() {
        let _accounts = rpc_mock(
            "/granted",
            "eth_requestAccounts",
            json!({ "jsonrpc": "2.0", "id": 1, "result": ["0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa"] }),
        );
        let _chain = rpc_mock(
            "/granted",
            "eth_chainId",
            json!({ "jsonrpc": "2.0", "id": 2, "result": "0xaa36a7" }),
        );

        let connector = RpcConnector::new(Address::repeat_byte(0x1e));
        let connection = connector.connect(&injected("/granted")).await.unwrap();

        assert_eq!(connection.account, Address::repeat_byte(0xaa));
        assert_eq!(connection.chain_id, 11_155_111);
        assert!(matches!(connection.registry, SessionRegistry::Injected(_)));
    }

    #[tokio::test]
    async fn user_rejection_is_access_rejected() {
        let _accounts = rpc_mock(
            "/rejected",
            "eth_requestAccounts",
            json!({
                "jsonrpc": "2.0",
                "id": 1,
                "error": { "code": 4001, "message": "User rejected the request." }
            }),
        );

        let connector = RpcConnector::new(Address::repeat_byte(0x1e));
        match connector.connect(&injected("/rejected")).await {
            Err(DiplomaError::AccessRejected(message)) => {
                assert_eq!(message, "User rejected the request.")
            }
            other => panic!("expected rejection, got {:?}", other.map(|c| c.account)),
        }
    }

    #[tokio::test]
    async fn empty_account_list_is_a_rejection() {
        let _accounts = rpc_mock(
            "/empty",
            "eth_requestAccounts",
            json!({ "jsonrpc": "2.0", "id": 1, "result": [] }),
        );

        let connector = RpcConnector::new(Address::repeat_byte(0x1e));
        assert!(matches!(
            connector.connect(&injected("/empty")).await,
            Err(DiplomaError::AccessRejected(_))
        ));
    }

    #[tokio::test]
    async fn local_key_without_variable_is_unavailable() {
        let wallet = WalletProvider {
            name: "key".into(),
            kind: WalletKind::LocalKey,
            source: WalletSource::LocalKey {
                rpc_url: format!("{}/local", mockito::server_url()),
                key_env: "RPC_CLIENT_TEST_MISSING_KEY".into(),
            },
        };
        let _chain = rpc_mock(
            "/local",
            "eth_chainId",
            json!({ "jsonrpc": "2.0", "id": 1, "result": "0xaa36a7" }),
        );

        let connector = RpcConnector::new(Address::repeat_byte(0x1e));
        assert!(matches!(
            connector.connect(&wallet).await,
            Err(DiplomaError::WalletUnavailable)
        ));
    }
}
