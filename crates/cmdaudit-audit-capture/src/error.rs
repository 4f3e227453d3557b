//! Auditor errors.

use cmdaudit_audit_types::WireError;
use cmdaudit_common_config::ConfigError;
use std::io;
use thiserror::Error;

/// Exit status used when the auditor gives up on the host process.
pub const FATAL_EXIT_STATUS: i32 = 2;

/// Auditor error. Every variant is fatal to the audited process.
#[derive(Debug, Error)]
pub enum AuditError {
    #[error("{call}: disallowed write to '{path}' per {pattern}")]
    DisallowedWrite {
        call: String,
        path: String,
        pattern: String,
    },
    #[error("cannot reach monitor at {endpoint}: {source}")]
    Connect {
        endpoint: String,
        #[source]
        source: io::Error,
    },
    #[error("monitor {op}: {source}")]
    MonitorIo {
        op: &'static str,
        #[source]
        source: io::Error,
    },
    #[error("staging {op}: {source}")]
    Staging {
        op: &'static str,
        #[source]
        source: io::Error,
    },
    #[error("debug output {path}: {source}")]
    Output {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("protocol error: {0}")]
    Protocol(String),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Core(#[from] cmdaudit_common_core::Error),
    #[error(transparent)]
    Wire(#[from] WireError),
}

impl AuditError {
    pub(crate) fn monitor(op: &'static str, source: io::Error) -> Self {
        Self::MonitorIo { op, source }
    }

    pub(crate) fn staging(op: &'static str, source: io::Error) -> Self {
        Self::Staging { op, source }
    }

    /// Status the process exits with on this error.
    pub fn exit_status(&self) -> i32 {
        FATAL_EXIT_STATUS
    }
}

/// Auditor result.
pub type AuditResult<T> = Result<T, AuditError>;
