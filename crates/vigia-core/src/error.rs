//! Core error types for the Vigia crawler core.
//!
//! This module defines the error type shared by the foundation types and the
//! configuration layer. Subsystem crates wrap it in their own error enums.

use thiserror::Error;

/// Central error type for core operations.
#[derive(Error, Debug)]
pub enum VigiaError {
    /// Configuration errors (file loading, parsing, validation)
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Site identifier is not one of the supported marketplaces
    #[error("unsupported site '{site}', expected one of: {supported}")]
    UnsupportedSite {
        /// The identifier that was rejected
        site: String,
        /// Comma-separated list of valid identifiers
        supported: String,
    },

    /// Validation errors (invalid input, constraints)
    #[error("validation error: {0}")]
    Validation(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic internal errors
    #[error("internal error: {0}")]
    Internal(String),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to determine config directory path
    #[error("could not determine config directory (XDG base directories not available)")]
    NoConfigDir,

    /// Config file not found
    #[error("config file not found at {path}")]
    NotFound {
        /// Path where config was expected
        path: String,
    },

    /// Failed to parse TOML
    #[error("failed to parse config TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Failed to serialize config
    #[error("failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),

    /// I/O error reading/writing config
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid configuration value
    #[error("invalid config value for {field}: {reason}")]
    InvalidValue {
        /// Field name
        field: String,
        /// Reason for invalidity
        reason: String,
    },
}

/// Result type alias using `VigiaError`.
pub type Result<T> = std::result::Result<T, VigiaError>;

/// Result type alias for configuration operations.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = VigiaError::Validation("empty user id".to_string());
        assert_eq!(err.to_string(), "validation error: empty user id");

        let err = VigiaError::UnsupportedSite {
            site: "EBAY".to_string(),
            supported: "MERCADO_LIVRE, OLX".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "unsupported site 'EBAY', expected one of: MERCADO_LIVRE, OLX"
        );
    }

    #[test]
    fn test_error_from_config() {
        let config_err = ConfigError::NoConfigDir;
        let err: VigiaError = config_err.into();
        assert!(matches!(err, VigiaError::Config(_)));
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "test");
        let err: VigiaError = io_err.into();
        assert!(matches!(err, VigiaError::Io(_)));
    }
}
