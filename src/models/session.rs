// src/models/session.rs
//! Wallet session data model.

use chrono::{DateTime, Utc};
use ethers_core::types::Address;
use serde::Serialize;

/// Access-control flags granted to an account by the diploma contract.
///
/// The three flags are independent: an account may hold any combination.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Roles {
    pub is_admin: bool,
    pub is_minter: bool,
    pub is_revoker: bool,
}

impl Roles {
    /// Whether the admin portal should open for this account.
    pub fn has_access(&self) -> bool {
        self.is_admin || self.is_minter || self.is_revoker
    }

    pub fn can_mint(&self) -> bool {
        self.is_admin || self.is_minter
    }
}

/// Connection progress, as shown to whoever is driving the session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "message", rename_all = "snake_case")]
pub enum SessionStatus {
    #[default]
    Idle,
    Connecting,
    Checking,
    Done,
    Error(String),
}

/// A connected wallet. Lives until disconnect or process exit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WalletSession {
    /// Name of the wallet provider the session was opened with
    pub wallet: String,
    #[serde(serialize_with = "crate::utils::format::serialize_checksummed")]
    pub address: Address,
    pub chain_id: u64,
    pub roles: Roles,
    pub connected_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn any_role_grants_portal_access() {
        assert!(!Roles::default().has_access());
        assert!(Roles { is_revoker: true, ..Default::default() }.has_access());
        assert!(Roles { is_admin: true, ..Default::default() }.has_access());
    }

    #[test]
    fn only_admin_or_minter_can_mint() {
        assert!(Roles { is_minter: true, ..Default::default() }.can_mint());
        assert!(Roles { is_admin: true, ..Default::default() }.can_mint());
        assert!(!Roles { is_revoker: true, ..Default::default() }.can_mint());
    }

    #[test]
    fn status_serializes_error_message() {
        let json = serde_json::to_value(SessionStatus::Error("rejected".into())).unwrap();
        assert_eq!(json, serde_json::json!({ "state": "error", "message": "rejected" }));
        let json = serde_json::to_value(SessionStatus::Checking).unwrap();
        assert_eq!(json, serde_json::json!({ "state": "checking" }));
    }
}
