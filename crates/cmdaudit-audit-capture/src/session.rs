//! The guarded per-command state.

use crate::busy::EngineScope;
use crate::{AuditChannel, AuditResult, MonitorPhase, StagingFile};
use cmdaudit_audit_types::{wire, CommandAuditRecord};
use parking_lot::MutexGuard;
use tracing::trace;

/// Record, channel and protocol phase of the current command.
///
/// Always accessed through the auditor's mutex; helpers here take
/// `&mut self` and never lock.
#[derive(Debug, Default)]
pub struct Session {
    pub(crate) record: Option<CommandAuditRecord>,
    pub(crate) channel: Option<AuditChannel>,
    pub(crate) phase: MonitorPhase,
    /// Staging file made ahead of a fork for the child to take.
    pub(crate) spare: Option<StagingFile>,
}

impl Session {
    pub(crate) fn begin(&mut self, record: CommandAuditRecord, channel: AuditChannel) {
        self.record = Some(record);
        self.channel = Some(channel);
        self.phase = MonitorPhase::Closed;
    }

    pub(crate) fn set_phase(&mut self, phase: MonitorPhase) {
        trace!(from = ?self.phase, to = ?phase, "monitor phase");
        self.phase = phase;
    }

    pub fn record(&self) -> Option<&CommandAuditRecord> {
        self.record.as_ref()
    }

    pub fn phase(&self) -> MonitorPhase {
        self.phase
    }

    /// Move pending path actions into the channel. Returns how many moved.
    ///
    /// Nothing moves for a recycled command.
    pub(crate) fn flush(&mut self) -> AuditResult<usize> {
        let (Some(record), Some(channel)) = (self.record.as_mut(), self.channel.as_mut()) else {
            return Ok(0);
        };
        if record.recycled().is_some() || record.action_count() == 0 {
            return Ok(0);
        }
        let actions = record.take_actions();
        channel.write(wire::encode_actions(&actions)?.as_bytes())?;
        trace!(count = actions.len(), "flushed path actions");
        Ok(actions.len())
    }

    /// Turn the parent's state into a forked child's.
    ///
    /// The child keeps the command identity but not the started flag, and
    /// stages into its own file so the two processes never interleave. The
    /// spare made before the fork is used when there is one.
    pub(crate) fn fork_child(&mut self) -> AuditResult<()> {
        self.record = self.record.as_ref().map(CommandAuditRecord::fork_child);
        let spare = self.spare.take();
        if let Some(AuditChannel::Staging(_)) = self.channel {
            let fresh = match spare {
                Some(staging) => staging,
                None => StagingFile::create()?,
            };
            self.channel = Some(AuditChannel::Staging(fresh));
        }
        self.phase = MonitorPhase::Closed;
        Ok(())
    }

    /// Parent side of a fork: the spare is not needed.
    pub(crate) fn fork_parent(&mut self) {
        self.spare = None;
    }
}

/// Holds the session lock across a fork.
///
/// Obtained from [`Auditor::prepare_fork`](crate::Auditor::prepare_fork),
/// which has already flushed the parent's pending actions. Exactly one of
/// [`parent`](Self::parent) or [`child`](Self::child) is called on each
/// side of the fork.
#[must_use = "the session stays locked until parent() or child() is called"]
pub struct ForkGuard<'a> {
    session: MutexGuard<'a, Session>,
    _scope: EngineScope,
}

impl<'a> ForkGuard<'a> {
    pub(crate) fn new(session: MutexGuard<'a, Session>, scope: EngineScope) -> Self {
        Self {
            session,
            _scope: scope,
        }
    }

    /// Parent side: release the lock.
    pub fn parent(mut self) {
        self.session.fork_parent();
    }

    /// Child side: derive the child state, then release the lock.
    pub fn child(mut self) -> AuditResult<()> {
        self.session.fork_child()
    }
}
