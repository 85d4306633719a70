//! Configuration error types

use thiserror::Error;

/// Configuration error types
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    /// Deployment manifest exists but could not be read or parsed
    #[error("Invalid deployment manifest {path}: {message}")]
    ManifestError {
        /// Path of the manifest file
        path: String,
        /// What went wrong while reading or parsing it
        message: String,
    },

    /// Validation error with field and message
    #[error("Validation error: {field} - {message}")]
    ValidationError {
        /// The field that failed validation
        field: String,
        /// The validation error message
        message: String,
    },

    /// Environment variable error
    #[error("Environment variable error: {0}")]
    EnvVarError(String),

    /// Generic configuration error from config crate
    #[error("Configuration error: {0}")]
    Other(#[from] config::ConfigError),
}

impl ConfigError {
    /// Create a new validation error
    pub fn validation<S: Into<String>>(field: S, message: S) -> Self {
        ConfigError::ValidationError {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a new manifest error
    pub fn manifest<P: Into<String>, M: Into<String>>(path: P, message: M) -> Self {
        ConfigError::ManifestError {
            path: path.into(),
            message: message.into(),
        }
    }
}
