use config::{ConfigError, Environment, File};
use contest_core::{config::RocksDBConfig, StorageConfig};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

/// Mainnet ENS registry
pub const DEFAULT_ENS_REGISTRY: &str = "0x00000000000C2E074eC69A0dFb2997BA6C7d2e1e";

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageSettings,
    pub chain: ChainConfig,
    pub pinning: PinningConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: usize,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct StorageSettings {
    pub data_dir: String,
    pub sync_writes: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ChainConfig {
    pub rpc_url: String,
    pub ens_registry: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PinningConfig {
    pub api_url: String,
    pub jwt: String,
    pub timeout_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let environment = env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());

        let mut builder = config::Config::builder()
            // Start with default configuration
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080)?
            .set_default("server.workers", 4)?
            .set_default("storage.data_dir", "./data/contests")?
            .set_default("storage.sync_writes", true)?
            .set_default("chain.rpc_url", "http://localhost:8545")?
            .set_default("chain.ens_registry", DEFAULT_ENS_REGISTRY)?
            .set_default("chain.timeout_secs", 10)?
            .set_default("pinning.api_url", "https://api.pinata.cloud")?
            .set_default("pinning.jwt", "")?
            .set_default("pinning.timeout_secs", 60)?;

        if let Ok(config_file) = env::var("CONFIG_FILE") {
            builder = builder.add_source(File::with_name(&config_file).required(false));
        } else {
            builder = builder.add_source(
                File::with_name(&format!("config/{}", environment)).required(false),
            );
        }

        // Override with environment variables
        builder = builder.add_source(
            Environment::with_prefix("CONTEST_API")
                .separator("__")
                .list_separator(","),
        );

        // Variable names the deployment already uses
        if let Ok(port) = env::var("PORT") {
            builder = builder.set_override("server.port", port)?;
        }

        if let Ok(rpc_url) = env::var("ETH_PROVIDER_URL") {
            builder = builder.set_override("chain.rpc_url", rpc_url)?;
        }

        if let Ok(jwt) = env::var("PINATA_JWT") {
            builder = builder.set_override("pinning.jwt", jwt)?;
        }

        builder.build()?.try_deserialize()
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.server.port == 0 {
            return Err("Server port cannot be 0".to_string());
        }

        if self.server.workers == 0 {
            return Err("At least one worker is required".to_string());
        }

        if self.storage.data_dir.trim().is_empty() {
            return Err("Storage data directory is required".to_string());
        }

        if self.chain.rpc_url.is_empty() {
            return Err("Chain RPC URL is required".to_string());
        }

        if !is_address(&self.chain.ens_registry) {
            return Err("ENS registry must be a 20-byte hex address".to_string());
        }

        if self.pinning.api_url.is_empty() {
            return Err("Pinning API URL is required".to_string());
        }

        Ok(())
    }

    /// Document store settings for the contest book
    pub fn storage_config(&self) -> StorageConfig {
        StorageConfig {
            data_dir: PathBuf::from(&self.storage.data_dir),
            rocksdb: RocksDBConfig {
                sync_writes: self.storage.sync_writes,
                ..RocksDBConfig::default()
            },
        }
    }
}

/// `0x` followed by 40 hex digits
pub fn is_address(value: &str) -> bool {
    value
        .strip_prefix("0x")
        .map(|hex| hex.len() == 40 && hex.chars().all(|c| c.is_ascii_hexdigit()))
        .unwrap_or(false)
}
