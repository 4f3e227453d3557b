//! Error types for cmdaudit.

use thiserror::Error;

/// The shared error type for low-level cmdaudit operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Generic error with custom message.
    #[error("{0}")]
    Generic(String),

    /// A system call failed.
    #[error("{call}: {message}")]
    Os {
        /// Name of the failing call.
        call: &'static str,
        /// Platform error text.
        message: String,
    },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a new generic error.
    pub fn new(msg: impl Into<String>) -> Self {
        Self::Generic(msg.into())
    }

    /// Create an error for a failed system call.
    pub fn os(call: &'static str, err: impl std::fmt::Display) -> Self {
        Self::Os {
            call,
            message: err.to_string(),
        }
    }
}

/// Result type alias using cmdaudit's core Error.
pub type Result<T> = std::result::Result<T, Error>;
