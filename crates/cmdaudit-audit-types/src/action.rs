//! Recorded path actions.

use crate::{CommandIdentity, Op, PathState, Timestamp};
use serde::{Deserialize, Serialize};

/// One file-system operation performed by an audited command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathAction {
    /// Operation kind.
    pub op: Op,
    /// Name of the intercepted call, e.g. `open64`.
    pub call: String,
    /// Command id of the owning record at record time.
    pub pid: u64,
    /// Parent command id.
    pub ppid: u64,
    /// Command depth.
    pub depth: u64,
    /// Parent content code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pccode: Option<String>,
    /// Content code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ccode: Option<String>,
    /// Descriptor involved, or -1.
    pub fd: i32,
    /// Thread id, or 0 when unknown or unthreaded.
    pub tid: u64,
    /// Paths and flags.
    pub state: PathState,
    /// Present for every op except READ.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<Timestamp>,
}

impl PathAction {
    /// Start building an action.
    pub fn builder(op: Op, call: impl Into<String>, state: PathState) -> PathActionBuilder {
        PathActionBuilder::new(op, call, state)
    }
}

/// Builder for path actions.
#[derive(Debug)]
pub struct PathActionBuilder {
    op: Op,
    call: String,
    state: PathState,
    identity: CommandIdentity,
    fd: i32,
    tid: u64,
}

impl PathActionBuilder {
    /// Create a new builder with no identity, fd -1 and tid 0.
    pub fn new(op: Op, call: impl Into<String>, state: PathState) -> Self {
        Self {
            op,
            call: call.into(),
            state,
            identity: CommandIdentity::default(),
            fd: -1,
            tid: 0,
        }
    }

    /// Copy identity fields from the owning record.
    pub fn identity(mut self, identity: CommandIdentity) -> Self {
        self.identity = identity;
        self
    }

    /// Set the descriptor.
    pub fn fd(mut self, fd: i32) -> Self {
        self.fd = fd;
        self
    }

    /// Set the thread id.
    pub fn tid(mut self, tid: u64) -> Self {
        self.tid = tid;
        self
    }

    /// Build the action, stamping the time for every op but READ.
    pub fn build(self) -> PathAction {
        PathAction {
            timestamp: (!self.op.is_read()).then(Timestamp::now),
            op: self.op,
            call: self.call,
            pid: self.identity.cmdid,
            ppid: self.identity.pcmdid,
            depth: self.identity.depth,
            pccode: self.identity.pccode,
            ccode: self.identity.ccode,
            fd: self.fd,
            tid: self.tid,
            state: self.state,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{PathName, Secondary};

    fn state(op: Op, path: &str) -> PathState {
        PathState::for_op(op, PathName::from_absolute(path), Secondary::None)
    }

    #[test]
    fn test_read_has_no_timestamp() {
        let a = PathAction::builder(Op::Read, "open", state(Op::Read, "/src/a.c")).build();
        assert!(a.timestamp.is_none());
        assert_eq!(a.fd, -1);
        assert_eq!(a.tid, 0);
    }

    #[test]
    fn test_write_copies_identity_and_stamps() {
        let identity = CommandIdentity {
            cmdid: 100,
            pcmdid: 99,
            depth: 3,
            pccode: Some("p".into()),
            ccode: Some("c".into()),
        };
        let a = PathAction::builder(Op::Write, "creat", state(Op::Write, "/build/a.o"))
            .identity(identity)
            .fd(5)
            .tid(42)
            .build();
        assert!(a.timestamp.is_some());
        assert_eq!((a.pid, a.ppid, a.depth), (100, 99, 3));
        assert_eq!(a.ccode.as_deref(), Some("c"));
        assert_eq!((a.fd, a.tid), (5, 42));
    }
}
