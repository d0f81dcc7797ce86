use std::fs;
use std::path::Path;

use ethers::abi::Abi;

use crate::domain::error::ConfigError;
use crate::infrastructure::config::DEFAULT_ABI_PATH;

/// ERC-20 ABI compiled into the binary.
pub const BUNDLED_ERC20_ABI: &[u8] = include_bytes!("../../../abi/erc20.json");

/// Read-only ERC-20 methods the tracker calls.
pub const REQUIRED_METHODS: [&str; 5] = ["balanceOf", "decimals", "name", "symbol", "totalSupply"];

pub fn load_abi(path: impl AsRef<Path>) -> Result<Abi, ConfigError> {
    let path = path.as_ref();
    let abi_bytes = fs::read(path)
        .map_err(|e| ConfigError::AbiLoad(format!("{}: {}", path.display(), e)))?;
    serde_json::from_slice::<Abi>(&abi_bytes)
        .map_err(|e| ConfigError::AbiLoad(format!("{}: invalid ABI JSON: {}", path.display(), e)))
}

/// Loads `path`, or the compiled-in ERC-20 ABI when the default path is not
/// present relative to the working directory.
pub fn load_configured_abi(path: &str) -> Result<Abi, ConfigError> {
    load_or_bundled(path, DEFAULT_ABI_PATH)
}

fn load_or_bundled(path: &str, default_path: &str) -> Result<Abi, ConfigError> {
    if path == default_path && !Path::new(path).exists() {
        tracing::debug!(abi_path = path, "ABI file not found; using bundled ERC-20 ABI");
        return parse_abi(BUNDLED_ERC20_ABI);
    }
    load_abi(path)
}

pub fn parse_abi(abi_bytes: &[u8]) -> Result<Abi, ConfigError> {
    serde_json::from_slice::<Abi>(abi_bytes)
        .map_err(|e| ConfigError::AbiLoad(format!("invalid ABI JSON: {e}")))
}

pub fn missing_methods(abi: &Abi) -> Vec<&'static str> {
    REQUIRED_METHODS
        .iter()
        .copied()
        .filter(|method| !abi.functions.contains_key(*method))
        .collect()
}
