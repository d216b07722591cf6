//! Core error types for taxalink

use thiserror::Error;

/// Main error type for taxalink operations
///
/// Per-key lookup problems never surface through this type; they are recorded
/// as data inside a `Query`. These variants cover batch-level misuse and the
/// errors raised by stores and remote clients before the mapper converts them.
#[derive(Error, Debug)]
pub enum TaxaError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Parsing error: {0}")]
    Parse(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Other error: {0}")]
    Other(String),
}

/// Result type alias for taxalink operations
pub type TaxaResult<T> = Result<T, TaxaError>;

impl From<serde_json::Error> for TaxaError {
    fn from(err: serde_json::Error) -> Self {
        TaxaError::Serialization(err.to_string())
    }
}

impl From<anyhow::Error> for TaxaError {
    fn from(err: anyhow::Error) -> Self {
        TaxaError::Other(format!("{:#}", err))
    }
}
