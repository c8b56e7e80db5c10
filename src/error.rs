//! Error types for fund loading, table building and backtests.

use thiserror::Error;

/// Main error type for the crate.
#[derive(Error, Debug)]
pub enum FundError {
    #[error("Malformed input at line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("CSV parsing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("No funds loaded")]
    NoData,

    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),
}

impl FundError {
    /// Build a parse error for a 1-based input line.
    pub fn parse(line: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            line,
            message: message.into(),
        }
    }
}

/// Result type alias for fund operations.
pub type Result<T> = std::result::Result<T, FundError>;
