//! Domain error types

use thiserror::Error;

/// Error when parsing a timestamp reference string
#[derive(Debug, Clone, Error)]
#[error("Invalid timestamp: \"{input}\". Expected minutes:seconds with seconds below 60 (e.g., 1:24)")]
pub struct TimestampParseError {
    pub input: String,
}

/// Error when configuration fails
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(String),

    #[error("Failed to parse config file: {0}")]
    ParseError(String),

    #[error("Failed to write config file: {0}")]
    WriteError(String),

    #[error("Invalid config value for '{key}': {message}")]
    ValidationError { key: String, message: String },

    #[error("Config file already exists at: {0}")]
    AlreadyExists(String),

    #[error("Unknown config key: {0}")]
    UnknownKey(String),
}
