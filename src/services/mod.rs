// src/services/mod.rs
pub mod api_server;
pub mod diploma_issuer;
pub mod verifier;
