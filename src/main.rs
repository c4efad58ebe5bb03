// src/main.rs

//! # Diploma Registry - Main Entry Point
//!
//! Serves the diploma verification and administration API on top of the
//! `DiplomaNFT` contract deployed on Sepolia.
//!
//! ## Architecture Overview
//! 1. **Blockchain Layer**: `RpcConnector` opens wallets over JSON-RPC
//! 2. **Contracts Layer**: typed bindings for the diploma contract
//! 3. **Services Layer**: on-chain verification, minting, and API endpoints
//! 4. **Wallet Layer**: wallet discovery, session lifecycle, local keys
//!
//! ## Configuration
//! See [`config::Settings`]. Common environment variables:
//! - `PRIVATE_KEY`: key for the default `local-key` wallet
//! - `DIPLOMA__NETWORK__RPC_URL`: Sepolia JSON-RPC endpoint
//! - `DIPLOMA__NETWORK__CONTRACT_ADDRESS`: deployed diploma contract
//! - `RUST_LOG`: log filter (default `info`)

use crate::blockchain::rpc_client::RpcConnector;
use crate::config::Settings;
use crate::services::api_server::ApiServer;
use anyhow::Context;
use dotenv::dotenv;
use env_logger::Env;
use log::info;

// Module declarations (organized by functional domain)
mod blockchain; // JSON-RPC wallet connections
mod config; // Layered settings
mod contracts; // Diploma contract bindings
mod error; // Shared error type
mod models; // Data structures
mod services; // Business logic and API
mod utils; // Hashing and formatting helpers
mod wallet; // Wallet discovery and sessions

/// Main application entry point
///
/// # Initialization Sequence
/// 1. Load `.env` and settings
/// 2. Detect wallets and bind the contract
/// 3. Start API server
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenv().ok();
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let settings = Settings::load().context("failed to load settings")?;
    let contract_address = settings
        .contract_address()
        .context("invalid diploma contract address")?;
    let addr = settings.server.socket_addr()?;

    info!(
        "Diploma contract {:?} on chain {} via {}",
        contract_address, settings.network.chain_id, settings.network.rpc_url
    );

    let api_server = ApiServer::new(settings, RpcConnector::new(contract_address));

    info!("API server running at http://{}", addr);
    info!("Available endpoints:");
    info!("- GET  /wallets, POST /wallets/connect");
    info!("- GET  /session, DELETE /session, GET /admin/access");
    info!("- POST /documents/hash, POST /documents/verify");
    info!("- POST /verify, POST /verify/rescan, POST /applications");
    info!("- POST /mint, GET /mint/status");

    api_server.run(addr).await.context("API server failed")?;
    Ok(())
}
