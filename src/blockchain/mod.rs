// src/blockchain/mod.rs
pub mod rpc_client;
