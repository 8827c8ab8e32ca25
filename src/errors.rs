//! Error types for the casino backend
//!
//! One root error with a variant per concern, so handlers can map failures
//! onto HTTP status codes without string matching.

use thiserror::Error;

/// Root error type for all casino operations
#[derive(Debug, Error)]
pub enum CasinoError {
    /// Configuration related errors
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    /// Storage system errors
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Malformed or out-of-range input
    #[error("Validation error: {0}")]
    Validation(String),

    /// A referenced record does not exist
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    #[error("Insufficient coins: balance {balance}, required {required}")]
    InsufficientFunds { balance: u64, required: u64 },

    /// The operation conflicts with the current state of a record
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unauthorized")]
    Unauthorized,
}

/// Configuration and validation errors
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("Invalid value for {field}: '{value}' ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Failed to load configuration: {0}")]
    LoadFailed(String),
}

/// Storage system errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database open failed: {0}")]
    DatabaseOpenFailed(String),

    #[error("Read failed: {0}")]
    ReadFailed(String),

    #[error("Write failed: {0}")]
    WriteFailed(String),

    #[error("Corrupted data: {0}")]
    CorruptedData(String),
}

impl CasinoError {
    pub fn validation(msg: impl Into<String>) -> Self {
        CasinoError::Validation(msg.into())
    }

    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        CasinoError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        CasinoError::Conflict(msg.into())
    }
}

// External error conversions
impl From<rocksdb::Error> for CasinoError {
    fn from(e: rocksdb::Error) -> Self {
        CasinoError::Storage(StorageError::WriteFailed(e.to_string()))
    }
}

impl From<std::io::Error> for CasinoError {
    fn from(e: std::io::Error) -> Self {
        CasinoError::Storage(StorageError::ReadFailed(e.to_string()))
    }
}

impl From<serde_json::Error> for CasinoError {
    fn from(e: serde_json::Error) -> Self {
        CasinoError::Storage(StorageError::CorruptedData(e.to_string()))
    }
}

// Convenience type alias for Results
pub type CasinoResult<T> = Result<T, CasinoError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_error_display() {
        let err = CasinoError::from(ConfigurationError::LoadFailed("test".to_string()));

        assert!(err.to_string().contains("Configuration error"));
        assert!(err.to_string().contains("test"));
    }

    #[test]
    fn test_insufficient_funds_details() {
        let err = CasinoError::InsufficientFunds {
            balance: 5,
            required: 30,
        };

        assert!(err.to_string().contains("balance 5"));
        assert!(err.to_string().contains("required 30"));
    }

    #[test]
    fn test_not_found_message() {
        let err = CasinoError::not_found("User", 42);
        assert_eq!(err.to_string(), "User 42 not found");
    }

    #[test]
    fn test_error_source() {
        let err = CasinoError::Storage(StorageError::ReadFailed("disk".to_string()));
        assert!(err.source().is_some());
    }
}
