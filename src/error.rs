//! Error types for the currency converter

use thiserror::Error;

/// Result type alias for converter operations
pub type Result<T> = std::result::Result<T, ConverterError>;

/// Message shown to the user whenever the conversion flow fails.
pub const CONVERSION_FAILED_MESSAGE: &str =
    "Failed to convert currency. Please ensure the system API configuration is correct.";

#[derive(Error, Debug)]
pub enum ConverterError {

    // =============================
    // Domain Errors
    // =============================

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("LLM error: {0}")]
    LlmError(String),

    #[error("{}", CONVERSION_FAILED_MESSAGE)]
    ConversionFailed,

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Unknown currency: {0}")]
    UnknownCurrency(String),

    // =============================
    // External Library Conversions
    // =============================

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("HTTP client error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}
