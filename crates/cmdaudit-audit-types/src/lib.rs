//! Audit types for cmdaudit.
//!
//! The per-command audit record, the path actions it accumulates, and the
//! line-oriented records exchanged with the monitor.

mod ack;
mod action;
mod op;
mod path;
mod record;
mod state;
pub mod wire;

pub use ack::Ack;
pub use action::{PathAction, PathActionBuilder};
pub use op::Op;
pub use path::{normalize, BaseDirResolver, CwdResolver, PathName, PathResolver};
pub use record::{CommandAuditRecord, CommandAuditRecordBuilder, CommandHeader, CommandIdentity};
pub use state::{PathFlags, PathState, Secondary};
pub use wire::{WireError, WireRecord};

pub use cmdaudit_common_core::Timestamp;
