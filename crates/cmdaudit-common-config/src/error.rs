//! Configuration errors.

use thiserror::Error;

/// Errors raised while reading or modifying properties.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("required property not set: {name}")]
    NotSet { name: String },

    #[error("invalid value for {name}: {message}")]
    InvalidValue { name: String, message: String },

    #[error("invalid pattern for {name}: {source}")]
    InvalidPattern {
        name: String,
        #[source]
        source: regex::Error,
    },

    #[error("no room to store {needed} bytes in {name} (capacity {available})")]
    NoRoom {
        name: String,
        needed: usize,
        available: usize,
    },
}

/// Result alias for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;
