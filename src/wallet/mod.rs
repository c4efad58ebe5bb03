// src/wallet/mod.rs
pub mod discovery;
pub mod key_management;
pub mod session;
