// src/wallet/discovery.rs
//! Wallet provider detection and selection.
//!
//! A browser page sees whatever wallets injected themselves into it; this
//! service sees the providers listed in its configuration. A JSON-RPC wallet
//! entry is always considered present. A local-key entry is only present when
//! its key variable is set, the same way an extension is only injected when
//! installed.

use crate::config::{WalletKind, WalletProviderConfig};
use crate::error::DiplomaError;
use log::{debug, warn};
use serde::Serialize;

/// Where a wallet's account and signatures come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalletSource {
    /// EIP-1193 style JSON-RPC wallet that answers `eth_requestAccounts`
    /// and signs `eth_sendTransaction` itself
    Injected { rpc_url: String },
    /// Key held by this process, read from `key_env` at connect time
    LocalKey { rpc_url: String, key_env: String },
}

/// A detected wallet provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WalletProvider {
    pub name: String,
    pub kind: WalletKind,
    #[serde(skip)]
    pub source: WalletSource,
}

impl WalletProvider {
    fn is_branded(&self) -> bool {
        matches!(self.kind, WalletKind::MetaMask | WalletKind::Coinbase)
    }
}

/// How the caller should pick a wallet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", content = "wallets", rename_all = "snake_case")]
pub enum WalletChoice {
    /// Nothing to connect with.
    Unavailable,
    /// A single fallback provider; connect without asking.
    Direct(WalletProvider),
    /// Ask the caller, branded wallets first.
    Choose(Vec<WalletProvider>),
}

/// Detected wallet providers.
#[derive(Debug, Clone, Default)]
pub struct WalletRegistry {
    providers: Vec<WalletProvider>,
}

impl WalletRegistry {
    /// Detects available providers from configuration.
    ///
    /// # Arguments
    /// * `configs` - Configured wallet entries
    /// * `default_rpc_url` - Endpoint for entries that do not name one
    pub fn detect(configs: &[WalletProviderConfig], default_rpc_url: &str) -> Self {
        let mut providers = Vec::new();

        for entry in configs {
            if providers.iter().any(|p: &WalletProvider| p.name == entry.name) {
                warn!("Ignoring duplicate wallet entry `{}`", entry.name);
                continue;
            }
            let rpc_url = entry
                .rpc_url
                .clone()
                .unwrap_or_else(|| default_rpc_url.to_string());

            let source = match entry.kind {
                WalletKind::LocalKey => {
                    let key_env = entry
                        .private_key_env
                        .clone()
                        .unwrap_or_else(|| "PRIVATE_KEY".to_string());
                    if std::env::var_os(&key_env).is_none() {
                        debug!("Wallet `{}` not available: {} is not set", entry.name, key_env);
                        continue;
                    }
                    WalletSource::LocalKey { rpc_url, key_env }
                }
                _ => WalletSource::Injected { rpc_url },
            };

            providers.push(WalletProvider {
                name: entry.name.clone(),
                kind: entry.kind,
                source,
            });
        }

        debug!("Detected {} wallet provider(s)", providers.len());
        Self { providers }
    }

    pub fn providers(&self) -> &[WalletProvider] {
        &self.providers
    }

    /// Decides whether to connect directly or present a choice.
    pub fn choice(&self) -> WalletChoice {
        match self.providers.as_slice() {
            [] => WalletChoice::Unavailable,
            [only] if !only.is_branded() => WalletChoice::Direct(only.clone()),
            _ => {
                let (mut ordered, rest): (Vec<_>, Vec<_>) =
                    self.providers.iter().cloned().partition(|p| p.is_branded());
                ordered.sort_by_key(|p| p.kind != WalletKind::MetaMask);
                ordered.extend(rest);
                WalletChoice::Choose(ordered)
            }
        }
    }

    /// Resolves the caller's selection.
    ///
    /// # Errors
    /// - `WalletUnavailable` when nothing was detected
    /// - `UnknownWallet` when `name` does not match a detected provider
    /// - `SelectionRequired` when `name` is omitted and several are available
    pub fn select(&self, name: Option<&str>) -> Result<&WalletProvider, DiplomaError> {
        if self.providers.is_empty() {
            return Err(DiplomaError::WalletUnavailable);
        }
        match name {
            Some(name) => self
                .providers
                .iter()
                .find(|p| p.name == name)
                .ok_or_else(|| DiplomaError::UnknownWallet(name.to_string())),
            None => match (self.providers.as_slice(), self.choice()) {
                ([only], _) => Ok(only),
                (_, WalletChoice::Choose(options)) => Err(DiplomaError::SelectionRequired(
                    options.into_iter().map(|p| p.name).collect(),
                )),
                _ => Err(DiplomaError::WalletUnavailable),
            },
        }
    }
}
