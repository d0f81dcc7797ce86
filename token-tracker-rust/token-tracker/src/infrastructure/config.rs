use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;
use std::path::Path;
use std::fs;
use std::time::Duration;
use anyhow::{Result, anyhow};

/// Polygon token the service tracks when nothing else is configured.
pub const DEFAULT_CONTRACT_ADDRESS: &str = "0x1a9b54A3075119f1546C52cA0940551A6ce5d2D0";
pub const DEFAULT_RPC_URL: &str = "https://polygon-rpc.com";
pub const DEFAULT_ABI_PATH: &str = "abi/erc20.json";
pub const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexerConfig {
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    pub default_limit: usize,
    pub max_limit: usize,
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            api_key: None,
            default_limit: 10,
            max_limit: 100,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub environment: String,
    pub rpc_url: String,
    pub contract_address: String,
    pub abi_path: String,
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub log_dir: String,
    pub rpc_timeout_secs: u64,
    pub max_batch_size: usize,
    /// How many blocks back a last-transaction lookup searches.
    pub transfer_scan_blocks: u64,
    /// Block span of each `eth_getLogs` request during that search.
    pub transfer_scan_chunk: u64,
    pub indexer: IndexerConfig,
    pub version: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            rpc_url: DEFAULT_RPC_URL.to_string(),
            contract_address: DEFAULT_CONTRACT_ADDRESS.to_string(),
            abi_path: DEFAULT_ABI_PATH.to_string(),
            host: "0.0.0.0".to_string(),
            port: 8080,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            log_dir: "logs".to_string(),
            rpc_timeout_secs: 30,
            max_batch_size: 100,
            transfer_scan_blocks: 1_000_000,
            transfer_scan_chunk: 50_000,
            indexer: IndexerConfig::default(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

impl Config {
    pub fn new() -> Result<Self> {
        // Load environment variables
        dotenv::dotenv().ok();

        let env = Self::validate_and_get_env_var("RUST_ENV", "development", false)?;

        // Validate critical environment variables on startup
        Self::validate_startup_env_vars(&env)?;

        // A config file wins over the environment
        let config = match Self::load_from_file()? {
            Some(config) => config,
            None => match env.as_str() {
                "production" => Self::production_config()?,
                _ => Self::development_config()?,
            },
        };

        config.validate()?;

        Ok(config)
    }

    pub fn rpc_timeout(&self) -> Duration {
        Duration::from_secs(self.rpc_timeout_secs)
    }

    /// Validates critical environment variables on startup
    fn validate_startup_env_vars(environment: &str) -> Result<()> {
        let mut errors = Vec::new();

        if environment == "production" {
            for var in ["RPC_URL", "CONTRACT_ADDRESS"] {
                match env::var(var) {
                    Err(_) => errors.push(format!("Required environment variable {var} is not set for production")),
                    Ok(value) if value.is_empty() => {
                        errors.push(format!("Required environment variable {var} is empty for production"))
                    }
                    Ok(_) => {}
                }
            }
        }

        if let Ok(contract_addr) = env::var("CONTRACT_ADDRESS") {
            if !contract_addr.is_empty() && !Self::is_valid_hex_address(&contract_addr) {
                errors.push(format!(
                    "Invalid CONTRACT_ADDRESS format: '{contract_addr}'. Expected: 0x followed by 40 hex characters"
                ));
            }
        }

        if !errors.is_empty() {
            return Err(anyhow!("Environment validation failed:\n{}", errors.join("\n")));
        }

        Ok(())
    }

    fn load_from_file() -> Result<Option<Self>> {
        let config_file = env::var("CONFIG_FILE").unwrap_or_else(|_| "config.json".to_string());
        Self::load_from_path(&config_file)
    }

    pub fn load_from_path(config_file: &str) -> Result<Option<Self>> {
        if !Path::new(config_file).exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(config_file)
            .map_err(|e| anyhow!("Failed to read config file {}: {}", config_file, e))?;
        let config: Config = serde_json::from_str(&content)
            .map_err(|e| anyhow!("Failed to deserialize config file {}: {}", config_file, e))?;
        Ok(Some(config))
    }

    pub fn development_config() -> Result<Self> {
        Ok(Self {
            environment: "development".to_string(),
            rpc_url: Self::validate_and_get_env_var("RPC_URL", DEFAULT_RPC_URL, false)?,
            contract_address: Self::validate_contract_address("CONTRACT_ADDRESS", DEFAULT_CONTRACT_ADDRESS)?,
            abi_path: Self::validate_and_get_env_var("ABI_PATH", DEFAULT_ABI_PATH, false)?,
            host: Self::validate_and_get_env_var("HOST", "0.0.0.0", false)?,
            port: u16::from_str(&Self::validate_and_get_env_var("PORT", "8080", false)?)?,
            log_level: Self::validate_and_get_env_var("LOG_LEVEL", DEFAULT_LOG_LEVEL, false)?,
            log_dir: Self::validate_and_get_env_var("LOG_DIR", "logs", false)?,
            rpc_timeout_secs: u64::from_str(&Self::validate_and_get_env_var("RPC_TIMEOUT_SECS", "30", false)?)?,
            max_batch_size: usize::from_str(&Self::validate_and_get_env_var("MAX_BATCH_SIZE", "100", false)?)?,
            transfer_scan_blocks: u64::from_str(&Self::validate_and_get_env_var("TRANSFER_SCAN_BLOCKS", "1000000", false)?)?,
            transfer_scan_chunk: u64::from_str(&Self::validate_and_get_env_var("TRANSFER_SCAN_CHUNK", "50000", false)?)?,
            indexer: Self::indexer_config()?,
            version: env!("CARGO_PKG_VERSION").to_string(),
        })
    }

    fn production_config() -> Result<Self> {
        Ok(Self {
            environment: "production".to_string(),
            rpc_url: Self::validate_and_get_env_var("RPC_URL", "", true)?,
            contract_address: Self::validate_contract_address("CONTRACT_ADDRESS", "")?,
            abi_path: Self::validate_and_get_env_var("ABI_PATH", DEFAULT_ABI_PATH, false)?,
            host: Self::validate_and_get_env_var("HOST", "0.0.0.0", false)?,
            port: u16::from_str(&Self::validate_and_get_env_var("PORT", "8080", false)?)?,
            log_level: Self::validate_and_get_env_var("LOG_LEVEL", DEFAULT_LOG_LEVEL, false)?,
            log_dir: Self::validate_and_get_env_var("LOG_DIR", "logs", false)?,
            rpc_timeout_secs: u64::from_str(&Self::validate_and_get_env_var("RPC_TIMEOUT_SECS", "30", false)?)?,
            max_batch_size: usize::from_str(&Self::validate_and_get_env_var("MAX_BATCH_SIZE", "100", false)?)?,
            transfer_scan_blocks: u64::from_str(&Self::validate_and_get_env_var("TRANSFER_SCAN_BLOCKS", "1000000", false)?)?,
            transfer_scan_chunk: u64::from_str(&Self::validate_and_get_env_var("TRANSFER_SCAN_CHUNK", "50000", false)?)?,
            indexer: Self::indexer_config()?,
            version: env!("CARGO_PKG_VERSION").to_string(),
        })
    }

    fn indexer_config() -> Result<IndexerConfig> {
        let optional = |key: &str| env::var(key).ok().filter(|value| !value.is_empty());

        Ok(IndexerConfig {
            base_url: optional("HOLDER_INDEXER_URL"),
            api_key: optional("HOLDER_INDEXER_API_KEY"),
            default_limit: usize::from_str(&Self::validate_and_get_env_var("DEFAULT_HOLDERS_LIMIT", "10", false)?)?,
            max_limit: usize::from_str(&Self::validate_and_get_env_var("MAX_HOLDERS_LIMIT", "100", false)?)?,
        })
    }

    /// Validates if a string is a valid hex address (0x followed by 40 hex characters)
    pub fn is_valid_hex_address(address: &str) -> bool {
        let Some(hex_part) = address.strip_prefix("0x") else {
            return false;
        };

        hex_part.len() == 40 && hex_part.chars().all(|c| c.is_ascii_hexdigit())
    }

    /// Validates environment variables and provides fallback values
    pub fn validate_and_get_env_var(key: &str, fallback: &str, required: bool) -> Result<String> {
        match env::var(key) {
            Ok(value) => {
                if value.is_empty() {
                    if required {
                        return Err(anyhow!("Environment variable {} is required but empty", key));
                    }
                    Ok(fallback.to_string())
                } else {
                    Ok(value)
                }
            }
            Err(_) => {
                if required {
                    return Err(anyhow!("Required environment variable {} is not set", key));
                }
                Ok(fallback.to_string())
            }
        }
    }

    /// Validates contract addresses and provides fallback values
    pub fn validate_contract_address(env_key: &str, fallback: &str) -> Result<String> {
        let address = Self::validate_and_get_env_var(env_key, fallback, false)?;

        if !Self::is_valid_hex_address(&address) {
            return Err(anyhow!(
                "Invalid contract address in {}: '{}'. Expected format: 0x followed by 40 hex characters",
                env_key,
                address
            ));
        }

        Ok(address)
    }

    pub fn validate(&self) -> Result<()> {
        if self.rpc_url.is_empty() {
            return Err(anyhow!("RPC_URL is required and cannot be empty"));
        }

        if !Self::is_valid_hex_address(&self.contract_address) {
            return Err(anyhow!(
                "Invalid contract address: '{}'. Expected format: 0x followed by 40 hex characters",
                self.contract_address
            ));
        }

        if self.abi_path.is_empty() {
            return Err(anyhow!("ABI_PATH cannot be empty"));
        }

        if self.port == 0 {
            return Err(anyhow!("Invalid server port"));
        }

        if self.rpc_timeout_secs == 0 {
            return Err(anyhow!("RPC_TIMEOUT_SECS must be greater than 0"));
        }

        if self.max_batch_size == 0 {
            return Err(anyhow!("MAX_BATCH_SIZE must be greater than 0"));
        }

        if self.transfer_scan_chunk == 0 {
            return Err(anyhow!("TRANSFER_SCAN_CHUNK must be greater than 0"));
        }

        if self.indexer.default_limit == 0 || self.indexer.default_limit > self.indexer.max_limit {
            return Err(anyhow!(
                "DEFAULT_HOLDERS_LIMIT must be between 1 and MAX_HOLDERS_LIMIT ({})",
                self.indexer.max_limit
            ));
        }

        if let Some(url) = &self.indexer.base_url {
            reqwest::Url::parse(url).map_err(|e| anyhow!("Invalid HOLDER_INDEXER_URL '{}': {}", url, e))?;
        }

        Ok(())
    }

    pub fn summary(&self) -> serde_json::Value {
        serde_json::json!({
            "environment": self.environment,
            "version": self.version,
            "contract_address": self.contract_address,
            "abi_path": self.abi_path,
            "port": self.port,
            "log_level": self.log_level,
            "rpc_timeout_secs": self.rpc_timeout_secs,
            "holder_indexer_configured": self.indexer.base_url.is_some(),
        })
    }
}
