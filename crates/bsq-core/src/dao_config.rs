use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::output_ref::validate_tx_id;

/// Regtest genesis transaction (overridable via config / BSQ_GENESIS_TX_ID)
pub const DEFAULT_GENESIS_TX_ID: &str =
    "e0c1b7a7f2d7d5f5c3c0e7b0a0f6a3a9c1d2e3f4a5b6c7d8e9f0a1b2c3d4e5f6";

/// Regtest genesis block height
pub const DEFAULT_GENESIS_BLOCK_HEIGHT: u64 = 111;

/// One retry "unit" in milliseconds. Retry n waits (1 + n) units.
pub const DEFAULT_FEE_RETRY_UNIT_MS: u64 = 1_000;

/// Node configuration for the derived ledger.
/// Each node instance can point at its own genesis and data directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaoConfig {
    pub genesis_tx_id: String,
    pub genesis_block_height: u64,
    pub data_dir: PathBuf,
    #[serde(default)]
    pub fee_lookup: FeeLookupConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeLookupConfig {
    pub retry_unit_ms: u64,
    /// Provider names in preference order ("blocktrail", "blockcypher")
    pub providers: Vec<String>,
}

impl Default for FeeLookupConfig {
    fn default() -> Self {
        Self {
            retry_unit_ms: DEFAULT_FEE_RETRY_UNIT_MS,
            providers: vec!["blocktrail".to_string(), "blockcypher".to_string()],
        }
    }
}

impl Default for DaoConfig {
    fn default() -> Self {
        Self {
            genesis_tx_id: DEFAULT_GENESIS_TX_ID.to_string(),
            genesis_block_height: DEFAULT_GENESIS_BLOCK_HEIGHT,
            data_dir: PathBuf::from("./bsq-data"),
            fee_lookup: FeeLookupConfig::default(),
        }
    }
}

impl DaoConfig {
    /// Load config from TOML file
    pub fn load_from_file(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let content = fs::read_to_string(path)?;
        let config: DaoConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load config from environment variables, falling back to regtest defaults.
    /// Useful for containerized deployments.
    pub fn load_from_env() -> Result<Self, Box<dyn std::error::Error>> {
        let defaults = Self::default();

        let genesis_tx_id =
            std::env::var("BSQ_GENESIS_TX_ID").unwrap_or(defaults.genesis_tx_id);

        let genesis_block_height: u64 = match std::env::var("BSQ_GENESIS_BLOCK_HEIGHT") {
            Ok(v) => v.parse()?,
            Err(_) => defaults.genesis_block_height,
        };

        let data_dir = std::env::var("BSQ_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.data_dir);

        let retry_unit_ms: u64 = match std::env::var("BSQ_FEE_RETRY_UNIT_MS") {
            Ok(v) => v.parse()?,
            Err(_) => defaults.fee_lookup.retry_unit_ms,
        };

        let providers = match std::env::var("BSQ_FEE_PROVIDERS") {
            Ok(v) => v
                .split(',')
                .map(|p| p.trim().to_string())
                .filter(|p| !p.is_empty())
                .collect(),
            Err(_) => defaults.fee_lookup.providers,
        };

        Ok(Self {
            genesis_tx_id,
            genesis_block_height,
            data_dir,
            fee_lookup: FeeLookupConfig {
                retry_unit_ms,
                providers,
            },
        })
    }

    /// Save config to TOML file
    pub fn save_to_file(&self, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), String> {
        validate_tx_id(&self.genesis_tx_id).map_err(|e| format!("genesis_tx_id: {}", e))?;
        if self.fee_lookup.retry_unit_ms == 0 {
            return Err("fee_lookup.retry_unit_ms must be > 0".to_string());
        }
        Ok(())
    }

    /// Single sled database holding the UTXO, block and metadata trees.
    pub fn ledger_db_path(&self) -> PathBuf {
        self.data_dir.join("ledger")
    }
}
