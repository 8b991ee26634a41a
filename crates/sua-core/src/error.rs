//! Error types for sua-core

use thiserror::Error;

/// Result type alias using sua-core's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for the updater
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: String },

    /// Invalid configuration format
    #[error("Invalid configuration format: {message}")]
    InvalidConfig { message: String },

    /// YAML parsing error
    #[error("YAML parsing error: {0}")]
    YamlParse(#[from] serde_yaml_ng::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Version string is not a numeric major.minor.patch triple
    #[error("Invalid version format: {version}")]
    InvalidVersion { version: String },

    /// URL could not be parsed
    #[error("Invalid URL for {field}: {url}")]
    InvalidUrl { field: String, url: String },
}

impl Error {
    /// Create a config not found error
    pub fn config_not_found(path: impl Into<String>) -> Self {
        Self::ConfigNotFound { path: path.into() }
    }

    /// Create an invalid config error
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Create an invalid version error
    pub fn invalid_version(version: impl Into<String>) -> Self {
        Self::InvalidVersion {
            version: version.into(),
        }
    }

    /// Create an invalid URL error
    pub fn invalid_url(field: impl Into<String>, url: impl Into<String>) -> Self {
        Self::InvalidUrl {
            field: field.into(),
            url: url.into(),
        }
    }
}
