// src/config.rs
//! Service configuration.
//!
//! Sources, lowest precedence first:
//! 1. Built-in defaults (Sepolia, the deployed diploma contract)
//! 2. `config/default.toml` and `config/local.toml`, both optional
//! 3. Environment variables prefixed `DIPLOMA__`, nested with `__`
//!    (e.g. `DIPLOMA__NETWORK__RPC_URL`)

use crate::error::DiplomaError;
use config::{Config, Environment, File};
use ethers_core::types::Address;
use serde::Deserialize;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

/// Sepolia chain id.
pub const SEPOLIA_CHAIN_ID: u64 = 11_155_111;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub network: NetworkSettings,
    pub mint: MintSettings,
    /// Wallet providers offered to the caller
    pub wallets: Vec<WalletProviderConfig>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// Largest PDF accepted for hashing, in bytes
    pub max_upload_bytes: usize,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NetworkSettings {
    /// JSON-RPC endpoint used when a wallet does not name its own
    pub rpc_url: String,
    /// Chain the contract is deployed on; wallets on any other chain are refused
    pub chain_id: u64,
    pub contract_address: String,
    /// Block explorer base URL for address and transaction links
    pub explorer_url: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MintSettings {
    /// Metadata URI used when a mint request omits one
    pub default_metadata_uri: String,
    /// How long a confirmed or failed transaction stays visible
    pub status_display_secs: u64,
    /// Longest wait for the node to accept a `mintDiploma` submission
    pub submit_timeout_secs: u64,
}

/// Kind of wallet provider, mirroring the injected providers a browser sees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, serde::Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum WalletKind {
    /// JSON-RPC wallet endpoint identifying as MetaMask
    #[serde(rename = "metamask")]
    MetaMask,
    /// JSON-RPC wallet endpoint identifying as Coinbase Wallet
    Coinbase,
    /// Any other JSON-RPC wallet endpoint
    Generic,
    /// Secp256k1 key read from an environment variable
    LocalKey,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WalletProviderConfig {
    pub name: String,
    pub kind: WalletKind,
    /// Wallet endpoint; defaults to `network.rpc_url`
    #[serde(default)]
    pub rpc_url: Option<String>,
    /// Environment variable holding the key for `local-key` wallets
    #[serde(default)]
    pub private_key_env: Option<String>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 3000,
            max_upload_bytes: 20 * 1024 * 1024,
        }
    }
}

impl Default for NetworkSettings {
    fn default() -> Self {
        Self {
            rpc_url: "https://ethereum-sepolia-rpc.publicnode.com".into(),
            chain_id: SEPOLIA_CHAIN_ID,
            contract_address: "0x1E0AA66Ad5B46e2af5a5587BEcf7Fb15b6E043fc".into(),
            explorer_url: "https://sepolia.etherscan.io".into(),
        }
    }
}

impl Default for MintSettings {
    fn default() -> Self {
        Self {
            default_metadata_uri: "https://violet-patient-tiger-874.mypinata.cloud/ipfs/bafkreieetfhppak5kdnuljt45hy462yvoghlawzovobtm32m7ifhiqcmtq".into(),
            status_display_secs: 10,
            submit_timeout_secs: 120,
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerSettings::default(),
            network: NetworkSettings::default(),
            mint: MintSettings::default(),
            wallets: vec![WalletProviderConfig {
                name: "local-key".into(),
                kind: WalletKind::LocalKey,
                rpc_url: None,
                private_key_env: Some("PRIVATE_KEY".into()),
            }],
        }
    }
}

impl Settings {
    /// Loads settings from the layered sources described in the module docs.
    pub fn load() -> Result<Self, DiplomaError> {
        Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            .add_source(Environment::with_prefix("DIPLOMA").prefix_separator("__").separator("__"))
            .build()
            .and_then(|c| c.try_deserialize::<Settings>())
            .map_err(|e| DiplomaError::Config(e.to_string()))
    }

    pub fn contract_address(&self) -> Result<Address, DiplomaError> {
        Address::from_str(&self.network.contract_address)
            .map_err(|_| DiplomaError::InvalidAddress(self.network.contract_address.clone()))
    }
}

impl ServerSettings {
    pub fn socket_addr(&self) -> Result<SocketAddr, DiplomaError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| DiplomaError::Config(format!("invalid listen address: {}", e)))
    }
}

impl MintSettings {
    pub fn status_display(&self) -> Duration {
        Duration::from_secs(self.status_display_secs)
    }

    pub fn submit_timeout(&self) -> Duration {
        Duration::from_secs(self.submit_timeout_secs)
    }
}
