//! Command audit engine for cmdaudit.
//!
//! Records the file-system activity of each command in a process tree and
//! reports it to a build monitor through a start/end-of-audit handshake:
//!
//! - [`Auditor`] owns the command record, the activation gate and the lock
//!   around them
//! - [`StagingFile`] and [`AuditChannel`] buffer records until the command ends
//! - [`MonitorConnection`] carries one request and its answer
//! - [`global`] and the C entry points in [`ffi`] serve call interposers

mod activation;
mod auditor;
mod busy;
mod channel;
mod coder;
mod error;
pub mod ffi;
pub mod global;
mod monitor;
mod session;
mod staging;

pub use activation::{Activation, ActivationController};
pub use auditor::{Auditor, AuditorBuilder, CommandLaunch, Finalize, Startup};
pub use channel::{AuditChannel, DebugSink};
pub use coder::{CodeInput, ContentCoder, DigestCoder};
pub use error::{AuditError, AuditResult, FATAL_EXIT_STATUS};
pub use monitor::{MonitorConnection, MonitorPhase, MAX_ANSWER_LEN};
pub use session::{ForkGuard, Session};
pub use staging::{StagingFile, PREFERRED_FD, PREFERRED_FD_TRIES};
