//! # Agora Node
//!
//! Entry point for the reconciliation service.
//!
//! ## Startup sequence
//!
//! 1. Initialize logging (env-filtered).
//! 2. Load configuration (file, then environment) and validate it.
//! 3. Construct the projection store (SQLite or in-memory).
//! 4. Construct the ledger reader (JSON-RPC or the offline fake).
//! 5. Serve the gateway until ctrl-c.

mod config;

use std::path::PathBuf;
use std::sync::Arc;

use agora_gateway::AppState;
use agora_ledger::{FakeLedger, JsonRpcLedger, LedgerEndpoint, LedgerReader};
use agora_store::{InMemoryStore, ProjectionStore, SqliteStore};
use agora_types::WalletAddress;
use anyhow::{Context, Result};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::NodeConfig;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config = NodeConfig::load(config_path.as_deref()).context("loading configuration")?;
    config.validate().context("validating configuration")?;

    let store = build_store(&config)?;
    let ledger = build_ledger(&config)?;
    let state = AppState::new(store, ledger);

    agora_gateway::serve(&config.gateway, state, shutdown_signal())
        .await
        .context("running gateway")?;
    Ok(())
}

fn build_store(config: &NodeConfig) -> Result<Arc<dyn ProjectionStore>> {
    if config.store.db_path.is_empty() {
        warn!("no db_path configured, projection lives in memory only");
        Ok(Arc::new(InMemoryStore::new()))
    } else {
        let store = SqliteStore::open(&config.store.db_path)
            .with_context(|| format!("opening database {}", config.store.db_path))?;
        info!(path = %config.store.db_path, "projection store opened");
        Ok(Arc::new(store))
    }
}

fn build_ledger(config: &NodeConfig) -> Result<Arc<dyn LedgerReader>> {
    if config.ledger.offline {
        warn!("offline mode: ledger reads answer from an empty fake");
        return Ok(Arc::new(FakeLedger::new()));
    }

    let endpoint = LedgerEndpoint {
        rpc_url: config.ledger.rpc_url.clone(),
        expected_chain_id: config.ledger.expected_chain_id,
        arena_contract: WalletAddress::parse(&config.ledger.arena_contract)
            .context("arena contract address")?,
        escrow_contract: WalletAddress::parse(&config.ledger.escrow_contract)
            .context("escrow contract address")?,
    };
    info!(
        rpc_url = %endpoint.rpc_url,
        chain_id = endpoint.expected_chain_id,
        "ledger reader configured"
    );
    Ok(Arc::new(JsonRpcLedger::new(endpoint)))
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(%err, "cannot listen for shutdown signal");
        return;
    }
    info!("shutdown signal received");
}
