//! # Node Configuration
//!
//! Defaults, then a TOML file, then environment overrides, then
//! validation. The chain guard depends on `expected_chain_id` being right,
//! so nonsense values fail fast here instead of at the first ledger read.

use std::path::Path;

use agora_gateway::GatewayConfig;
use agora_types::WalletAddress;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Environment variable overriding the RPC endpoint.
const ENV_RPC_URL: &str = "AGORA_RPC_URL";
/// Environment variable overriding the expected chain id.
const ENV_CHAIN_ID: &str = "AGORA_CHAIN_ID";
/// Environment variable overriding the database path.
const ENV_DB_PATH: &str = "AGORA_DB_PATH";
/// Environment variable overriding the gateway port.
const ENV_PORT: &str = "AGORA_PORT";

/// Ledger connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// JSON-RPC endpoint. Ignored in offline mode.
    pub rpc_url: String,
    /// Chain id the endpoint must report before any read is trusted.
    pub expected_chain_id: u64,
    /// Arena contract address.
    pub arena_contract: String,
    /// Escrow contract address.
    pub escrow_contract: String,
    /// Run against the in-memory fake ledger (development only).
    pub offline: bool,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            rpc_url: String::new(),
            expected_chain_id: 0,
            arena_contract: String::new(),
            escrow_contract: String::new(),
            offline: false,
        }
    }
}

/// Projection store settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct StoreConfig {
    /// SQLite database path; empty selects the in-memory store.
    pub db_path: String,
}

/// Top-level node configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct NodeConfig {
    pub gateway: GatewayConfig,
    pub ledger: LedgerConfig,
    pub store: StoreConfig,
}

/// Configuration loading/validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file: {0}")]
    Read(#[from] std::io::Error),

    #[error("cannot parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

impl NodeConfig {
    /// Load from an optional TOML file, then apply environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => toml::from_str(&std::fs::read_to_string(path)?)?,
            None => Self::default(),
        };
        config.apply_env();
        Ok(config)
    }

    fn apply_env(&mut self) {
        if let Ok(url) = std::env::var(ENV_RPC_URL) {
            self.ledger.rpc_url = url;
        }
        if let Ok(raw) = std::env::var(ENV_CHAIN_ID) {
            if let Ok(id) = raw.parse() {
                self.ledger.expected_chain_id = id;
            }
        }
        if let Ok(path) = std::env::var(ENV_DB_PATH) {
            self.store.db_path = path;
        }
        if let Ok(raw) = std::env::var(ENV_PORT) {
            if let Ok(port) = raw.parse() {
                self.gateway.port = port;
            }
        }
    }

    /// Fail fast on configuration that would only break later.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.gateway
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;

        if self.ledger.offline {
            return Ok(());
        }
        if self.ledger.rpc_url.is_empty() {
            return Err(ConfigError::Invalid("ledger.rpc_url is empty".into()));
        }
        if self.ledger.expected_chain_id == 0 {
            return Err(ConfigError::Invalid(
                "ledger.expected_chain_id cannot be 0".into(),
            ));
        }
        WalletAddress::parse(&self.ledger.arena_contract)
            .map_err(|e| ConfigError::Invalid(format!("ledger.arena_contract: {e}")))?;
        WalletAddress::parse(&self.ledger.escrow_contract)
            .map_err(|e| ConfigError::Invalid(format!("ledger.escrow_contract: {e}")))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const ARENA: &str = "0x1111111111111111111111111111111111111111";
    const ESCROW: &str = "0x2222222222222222222222222222222222222222";

    fn online_config() -> NodeConfig {
        NodeConfig {
            ledger: LedgerConfig {
                rpc_url: "http://localhost:8545".into(),
                expected_chain_id: 1,
                arena_contract: ARENA.into(),
                escrow_contract: ESCROW.into(),
                offline: false,
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_offline_default_is_invalid_online() {
        // Defaults have no endpoint; only offline mode accepts them
        let mut config = NodeConfig::default();
        assert!(config.validate().is_err());
        config.ledger.offline = true;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_online_requires_chain_id_and_contracts() {
        let mut config = online_config();
        assert!(config.validate().is_ok());

        config.ledger.expected_chain_id = 0;
        assert!(config.validate().is_err());

        let mut config = online_config();
        config.ledger.arena_contract = "bogus".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[gateway]
port = 9090

[ledger]
rpc_url = "http://localhost:8545"
expected_chain_id = 137
arena_contract = "{ARENA}"
escrow_contract = "{ESCROW}"
"#
        )
        .unwrap();

        let config = NodeConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.gateway.port, 9090);
        assert_eq!(config.ledger.expected_chain_id, 137);
        assert!(config.validate().is_ok());
    }
}
