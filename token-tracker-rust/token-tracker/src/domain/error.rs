use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde::{Deserialize, Serialize};
use std::fmt;

pub type TrackerResult<T> = Result<T, TrackerError>;

/// Main error type for the token tracker
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TrackerError {
    // Node and contract errors
    Blockchain(BlockchainError),

    // Request validation errors
    Validation(ValidationError),

    // Holder indexing service errors
    Indexer(IndexerError),

    // Configuration errors
    Config(ConfigError),
}

impl fmt::Display for TrackerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrackerError::Blockchain(e) => write!(f, "Blockchain error: {e}"),
            TrackerError::Validation(e) => write!(f, "Validation error: {e}"),
            TrackerError::Indexer(e) => write!(f, "Indexer error: {e}"),
            TrackerError::Config(e) => write!(f, "Configuration error: {e}"),
        }
    }
}

impl std::error::Error for TrackerError {}

impl TrackerError {
    fn to_http_response(&self) -> (StatusCode, serde_json::Value) {
        match self {
            TrackerError::Blockchain(e) => e.to_http_response(),
            TrackerError::Validation(e) => e.to_http_response(),
            TrackerError::Indexer(e) => e.to_http_response(),
            TrackerError::Config(e) => e.to_http_response(),
        }
    }
}

impl ResponseError for TrackerError {
    fn status_code(&self) -> StatusCode {
        self.to_http_response().0
    }

    fn error_response(&self) -> HttpResponse {
        let (status_code, error_response) = self.to_http_response();
        HttpResponse::build(status_code).json(error_response)
    }
}

impl From<BlockchainError> for TrackerError {
    fn from(err: BlockchainError) -> Self {
        TrackerError::Blockchain(err)
    }
}

impl From<ValidationError> for TrackerError {
    fn from(err: ValidationError) -> Self {
        TrackerError::Validation(err)
    }
}

impl From<IndexerError> for TrackerError {
    fn from(err: IndexerError) -> Self {
        TrackerError::Indexer(err)
    }
}

impl From<ConfigError> for TrackerError {
    fn from(err: ConfigError) -> Self {
        TrackerError::Config(err)
    }
}

fn error_body(error_type: &str, message: &str) -> serde_json::Value {
    serde_json::json!({
        "error": error_type,
        "message": message,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    })
}

// Blockchain Errors
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum BlockchainError {
    /// Node unreachable, timed out or answered with a JSON-RPC error.
    RpcUnavailable(String),
    /// Revert, ABI mismatch or undecodable return data.
    ContractCallFailure(String),
}

impl fmt::Display for BlockchainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockchainError::RpcUnavailable(msg) => write!(f, "RPC unavailable: {msg}"),
            BlockchainError::ContractCallFailure(msg) => write!(f, "Contract call failed: {msg}"),
        }
    }
}

impl BlockchainError {
    pub fn to_http_response(&self) -> (StatusCode, serde_json::Value) {
        let (status_code, error_type) = match self {
            BlockchainError::RpcUnavailable(_) => {
                (StatusCode::SERVICE_UNAVAILABLE, "RPC_UNAVAILABLE")
            }
            BlockchainError::ContractCallFailure(_) => {
                (StatusCode::BAD_GATEWAY, "CONTRACT_CALL_FAILURE")
            }
        };

        (status_code, error_body(error_type, &self.to_string()))
    }
}

// Validation Errors
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ValidationError {
    InvalidInput(String),
    InvalidAddress(String),
    InvalidLimit(String),
    MissingField(String),
    PayloadTooLarge(usize),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::InvalidInput(msg) => write!(f, "Invalid input: {msg}"),
            ValidationError::InvalidAddress(addr) => write!(f, "Invalid address: {addr}"),
            ValidationError::InvalidLimit(msg) => write!(f, "Invalid limit: {msg}"),
            ValidationError::MissingField(field) => write!(f, "Missing required field: {field}"),
            ValidationError::PayloadTooLarge(size) => write!(f, "Too many items: {size}"),
        }
    }
}

impl ValidationError {
    pub fn to_http_response(&self) -> (StatusCode, serde_json::Value) {
        let (status_code, error_type) = match self {
            ValidationError::PayloadTooLarge(_) => (StatusCode::PAYLOAD_TOO_LARGE, "PAYLOAD_ERROR"),
            _ => (StatusCode::BAD_REQUEST, "INVALID_INPUT"),
        };

        (status_code, error_body(error_type, &self.to_string()))
    }
}

// Holder indexer Errors
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum IndexerError {
    NotConfigured,
    Unavailable(String),
    BadStatus(u16, String),
    InvalidResponse(String),
}

impl fmt::Display for IndexerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexerError::NotConfigured => write!(f, "Holder indexing service is not configured"),
            IndexerError::Unavailable(msg) => write!(f, "Holder indexing service unavailable: {msg}"),
            IndexerError::BadStatus(status, body) => {
                write!(f, "Holder indexing service returned {status}: {body}")
            }
            IndexerError::InvalidResponse(msg) => write!(f, "Invalid indexer response: {msg}"),
        }
    }
}

impl IndexerError {
    pub fn to_http_response(&self) -> (StatusCode, serde_json::Value) {
        let status_code = match self {
            IndexerError::NotConfigured => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::BAD_GATEWAY,
        };

        (status_code, error_body("EXTERNAL_SERVICE_FAILURE", &self.to_string()))
    }
}

// Configuration Errors
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ConfigError {
    InvalidValue(String),
    AbiLoad(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidValue(msg) => write!(f, "Invalid configuration value: {msg}"),
            ConfigError::AbiLoad(msg) => write!(f, "Failed to load contract ABI: {msg}"),
        }
    }
}

impl ConfigError {
    pub fn to_http_response(&self) -> (StatusCode, serde_json::Value) {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            error_body("CONFIGURATION_ERROR", &self.to_string()),
        )
    }
}
