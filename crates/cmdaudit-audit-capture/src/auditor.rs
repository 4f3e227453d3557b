//! The command auditor.
//!
//! One [`Auditor`] lives in each audited process. It opens a command record
//! when the process image starts, records path actions while the command
//! runs, and finishes the record when the process exits or execs. The
//! monitor sees an SOA for the command before anything else about it, and
//! before the SOA of any child.

use crate::busy::{self, EngineScope};
use crate::coder::{CodeInput, ContentCoder, DigestCoder};
use crate::monitor::{MonitorConnection, MonitorPhase};
use crate::session::{ForkGuard, Session};
use crate::{ActivationController, AuditChannel, AuditError, AuditResult, StagingFile};
use cmdaudit_audit_types::{
    wire, Ack, CommandAuditRecord, CwdResolver, Op, PathAction, PathName, PathResolver, PathState,
    Secondary,
};
use cmdaudit_common_config::{AuditSettings, Property, PropertyStore};
use cmdaudit_common_core::system;
use nix::sys::signal::{sigaction, SaFlags, SigAction, SigHandler, SigSet, Signal};
use parking_lot::Mutex;
use std::os::unix::io::RawFd;
use tracing::{debug, info, trace, warn};

/// Call name recorded for the program's own executable.
const EXEC_CALL: &str = "exec";

/// How the process image that is being audited came to be.
#[derive(Debug, Clone)]
pub struct CommandLaunch {
    /// Process id; becomes the command id.
    pub pid: u32,
    /// Absolute path of the executable.
    pub exe: String,
    /// Command line.
    pub line: String,
    /// Working directory at start.
    pub rwd: String,
    pub host: String,
    /// Environment, consulted for environment tracking.
    pub env: Vec<(String, String)>,
}

impl CommandLaunch {
    /// Describe the current process.
    pub fn current() -> AuditResult<Self> {
        Ok(Self {
            pid: system::current_pid(),
            exe: system::executable_path()?.to_string_lossy().into_owned(),
            line: system::command_line(),
            rwd: system::working_dir()?.to_string_lossy().into_owned(),
            host: system::hostname()?,
            env: std::env::vars().collect(),
        })
    }
}

/// What the host should do after initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Startup {
    /// Not auditing this command.
    Inactive,
    /// Auditing; run the command.
    Continue,
    /// The monitor ended the command; exit with this status now.
    Exit(i32),
}

/// Why the current process image is going away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Finalize {
    /// The process is exiting with `status`.
    Exiting { status: i32 },
    /// The process is about to exec; the exec may fail.
    Reexecing,
}

/// Builder for [`Auditor`].
pub struct AuditorBuilder {
    store: Box<dyn PropertyStore>,
    resolver: Box<dyn PathResolver>,
    coder: Box<dyn ContentCoder>,
}

impl AuditorBuilder {
    /// Resolve paths with `resolver` instead of the working directory.
    pub fn resolver(mut self, resolver: impl PathResolver + 'static) -> Self {
        self.resolver = Box::new(resolver);
        self
    }

    /// Derive content codes with `coder`.
    pub fn coder(mut self, coder: impl ContentCoder + 'static) -> Self {
        self.coder = Box::new(coder);
        self
    }

    /// Load settings from the store and build the auditor.
    pub fn build(self) -> AuditResult<Auditor> {
        let settings = AuditSettings::load(self.store.as_ref())?;
        debug!(
            depth = ?settings.depth,
            debug_mode = settings.is_debug_mode(),
            endpoints = ?settings.endpoints.as_ref().map(|e| e.to_string()),
            "auditor settings loaded"
        );
        Ok(Auditor {
            settings,
            store: self.store,
            resolver: self.resolver,
            coder: self.coder,
            activation: ActivationController::new(),
            session: Mutex::new(Session::default()),
        })
    }
}

/// Per-process audit engine.
pub struct Auditor {
    settings: AuditSettings,
    store: Box<dyn PropertyStore>,
    resolver: Box<dyn PathResolver>,
    coder: Box<dyn ContentCoder>,
    activation: ActivationController,
    session: Mutex<Session>,
}

impl Auditor {
    /// Start building an auditor over a property store.
    pub fn builder(store: impl PropertyStore + 'static) -> AuditorBuilder {
        AuditorBuilder {
            store: Box::new(store),
            resolver: Box::new(CwdResolver),
            coder: Box::new(DigestCoder),
        }
    }

    /// Settings loaded at build time.
    pub fn settings(&self) -> &AuditSettings {
        &self.settings
    }

    /// The activation gate for this process.
    pub fn activation(&self) -> &ActivationController {
        &self.activation
    }

    /// Depth of this command; 0 outside a monitor wrapper.
    pub fn depth(&self) -> u64 {
        self.settings.depth.unwrap_or(0)
    }

    /// A copy of the current record, if one is open.
    pub fn current_record(&self) -> Option<CommandAuditRecord> {
        self.session.lock().record().cloned()
    }

    /// Descriptor of the staging file, if one is open.
    pub fn staging_fd(&self) -> Option<RawFd> {
        self.session
            .lock()
            .channel
            .as_mut()
            .and_then(|c| c.staging_mut())
            .map(|s| s.fd())
    }

    /// Where the current command stands in the monitor exchange.
    pub fn phase(&self) -> MonitorPhase {
        self.session.lock().phase()
    }

    /// Set up auditing for the process image described by `launch`.
    ///
    /// Decides activation, opens the command record and, when active,
    /// completes the SOA exchange before returning.
    pub fn initialize(&self, launch: &CommandLaunch) -> AuditResult<Startup> {
        let _scope = EngineScope::enter();
        if let Some(depth) = self.settings.depth {
            self.store.modify(Property::Depth, &(depth + 1).to_string())?;
        }

        if let Some(ignore) = &self.settings.ignore_prog {
            if ignore.is_match(&launch.exe) {
                info!(pid = launch.pid, exe = %launch.exe, "program ignored per {}", ignore);
                self.activation.set_inactive();
                return Ok(Startup::Inactive);
            }
        }

        if !self.activation.is_active() {
            match &self.settings.activation {
                Some(pattern) if pattern.is_match(&launch.exe) => {
                    info!(pid = launch.pid, exe = %launch.exe, "activated");
                    self.activation.set_active();
                    self.store.modify(Property::ActivationProgRe, "")?;
                }
                Some(_) => {
                    info!(pid = launch.pid, exe = %launch.exe, "inactive");
                    return Ok(Startup::Inactive);
                }
                None => {
                    info!(pid = launch.pid, exe = %launch.exe, "active");
                    self.activation.set_active_by_default();
                }
            }
        }

        let record = self.open_record(launch);
        let channel = if self.settings.is_debug_mode() {
            AuditChannel::debug(&self.settings.output, launch.pid)?
        } else {
            AuditChannel::staging()?
        };

        let mut session = self.session.lock();
        session.begin(record, channel);

        let startup = self.start(&mut session)?;
        if startup != Startup::Continue {
            return Ok(startup);
        }

        if let Some(record) = session.record() {
            if let Some(ccode) = record.ccode() {
                if self.store.has_value(Property::Pccode) {
                    self.store.modify(Property::Pccode, ccode)?;
                }
            }
            if self.store.has_value(Property::Pcmdid) {
                self.store
                    .modify(Property::Pcmdid, &record.cmdid().to_string())?;
            }
        }

        // The program itself is a file the command read.
        let exe = PathName::from_absolute(launch.exe.clone());
        let state = PathState::for_op(Op::Exec, exe, Secondary::None);
        self.append(&mut session, EXEC_CALL, state, Op::Exec, -1)?;

        Ok(Startup::Continue)
    }

    fn open_record(&self, launch: &CommandLaunch) -> CommandAuditRecord {
        let pccode = self.settings.pccode.clone();
        let ccode = self.coder.code(&CodeInput {
            pccode: pccode.as_deref(),
            prog: &launch.exe,
            rwd: &launch.rwd,
            line: &launch.line,
        });
        let freetext = self
            .settings
            .track_env
            .as_ref()
            .and_then(|t| t.snapshot(&launch.line, launch.env.iter().cloned()));

        CommandAuditRecord::builder(u64::from(launch.pid))
            .pcmdid(self.settings.pcmdid)
            .depth(self.depth())
            .prog(launch.exe.clone())
            .rwd(launch.rwd.clone())
            .host(launch.host.clone())
            .line(launch.line.clone())
            .pccode(pccode)
            .ccode(Some(ccode))
            .freetext(freetext)
            .build()
    }

    /// Send the SOA and act on the monitor's answer.
    fn start(&self, session: &mut Session) -> AuditResult<Startup> {
        let aggregated = self.settings.is_aggregated();
        let Some(record) = session.record.as_mut() else {
            return Ok(Startup::Continue);
        };
        if !record.mark_started() {
            return Ok(Startup::Continue);
        }
        let soa = wire::format_soa(&record.header(aggregated))?;

        let Some(endpoints) = self.settings.endpoints.as_ref() else {
            if let Some(channel) = session.channel.as_mut() {
                channel.write(soa.as_bytes())?;
            }
            session.set_phase(MonitorPhase::Open);
            return Ok(Startup::Continue);
        };

        session.set_phase(MonitorPhase::Connecting);
        let mut conn = MonitorConnection::connect(endpoints, self.settings.connect_timeout)?;
        session.set_phase(MonitorPhase::AwaitingSoaAck);
        conn.send(soa.as_bytes())?;
        let answer = conn.finish()?;
        let ack = Ack::parse(&answer)?;
        debug!(%ack, "SOA acknowledged");

        match ack {
            Ack::Ok => {}
            Ack::OkAggregated => {
                if self.store.has_value(Property::AggregatedSubcmd) {
                    self.store.modify(Property::AggregatedSubcmd, "1")?;
                }
            }
            Ack::Failure => {
                warn!("monitor refused the command");
                self.end(session, Finalize::Exiting { status: 2 })?;
                return Ok(Startup::Exit(2));
            }
            Ack::Recycle { prior } => {
                info!(%prior, "command recycled");
                if let Some(record) = session.record.as_mut() {
                    record.set_recycled(prior);
                }
                self.end(session, Finalize::Exiting { status: 0 })?;
                return Ok(Startup::Exit(0));
            }
        }

        session.set_phase(MonitorPhase::Open);
        Ok(Startup::Continue)
    }

    /// Record one intercepted call.
    ///
    /// `secondary` is the symlink target text for [`Op::Symlink`] and the
    /// second path for [`Op::Link`]; it is ignored for every other op.
    pub fn record(
        &self,
        call: &str,
        path: &str,
        secondary: Option<&str>,
        fd: i32,
        op: Op,
    ) -> AuditResult<()> {
        if !self.activation.is_active() {
            trace!(%op, call, path, "not active");
            return Ok(());
        }
        if busy::is_inside() {
            trace!(%op, call, path, "call made by the auditor itself");
            return Ok(());
        }
        let _scope = EngineScope::enter();

        let primary = self.resolver.resolve(path);
        if let Some(ignore) = &self.settings.ignore_path {
            if ignore.is_match(primary.as_str()) {
                debug!(%op, call, path = %primary, "ignoring");
                return Ok(());
            }
        }

        let secondary = match (op, secondary) {
            (Op::Symlink, Some(target)) => Secondary::RawTargetText(target.to_string()),
            (Op::Link, Some(other)) => Secondary::ResolvedPath(self.resolver.resolve(other)),
            _ => Secondary::None,
        };
        let state = PathState::for_op(op, primary, secondary);

        let mut session = self.session.lock();
        self.append(&mut session, call, state, op, fd)
    }

    fn append(
        &self,
        session: &mut Session,
        call: &str,
        state: PathState,
        op: Op,
        fd: i32,
    ) -> AuditResult<()> {
        let Some(record) = session.record.as_mut() else {
            warn!(
                call,
                pid = system::current_pid(),
                path = %state.primary(),
                "path action after end of audit"
            );
            return Ok(());
        };

        if op.modifies_filesystem() {
            if let Some(allowed) = &self.settings.allowed_write {
                if !allowed.is_match(state.primary().as_str()) {
                    return Err(AuditError::DisallowedWrite {
                        call: call.to_string(),
                        path: state.primary().to_string(),
                        pattern: allowed.to_string(),
                    });
                }
            }
        }

        trace!(%op, call, path = %state.primary(), "recording");
        let action = PathAction::builder(op, call, state)
            .identity(record.identity())
            .fd(fd)
            .tid(system::thread_id())
            .build();
        record.record(action);
        Ok(())
    }

    /// Move pending path actions into the channel.
    pub fn flush(&self) -> AuditResult<()> {
        if !self.activation.is_active() {
            return Ok(());
        }
        let _scope = EngineScope::enter();
        self.session.lock().flush().map(|_| ())
    }

    /// Finish the current process image.
    pub fn finalize(&self, how: Finalize) -> AuditResult<()> {
        let _scope = EngineScope::enter();
        if !self.activation.is_active() {
            if matches!(how, Finalize::Exiting { .. })
                && self.depth() == 0
                && self.settings.notify_done
            {
                if let Some(endpoints) = &self.settings.endpoints {
                    let mut conn =
                        MonitorConnection::connect(endpoints, self.settings.connect_timeout)?;
                    conn.send(wire::done_token().as_bytes())?;
                    conn.finish()?;
                    debug!("completion token sent");
                }
            }
            return Ok(());
        }

        let mut session = self.session.lock();
        self.end(&mut session, how)
    }

    fn end(&self, session: &mut Session, how: Finalize) -> AuditResult<()> {
        session.flush()?;

        if let Finalize::Exiting { .. } = how {
            ignore_sigpipe()?;
        }

        let aggregated = self.settings.is_aggregated();
        let mut conn: Option<MonitorConnection> = None;

        if let Some(endpoints) = &self.settings.endpoints {
            let recycled = session.record().map_or(true, |r| r.recycled().is_some());
            if !recycled {
                if let Some(staging) = session.channel.as_mut().and_then(|c| c.staging_mut()) {
                    if !staging.is_empty()? {
                        let mut c =
                            MonitorConnection::connect(endpoints, self.settings.connect_timeout)?;
                        let sent = staging.stream_to(c.writer())?;
                        trace!(bytes = sent, "staged records sent");
                        conn = Some(c);
                    }
                }
            }
        }
        if conn.is_some() {
            session.set_phase(MonitorPhase::SendingEoa);
        }

        let started = session.record().map_or(false, |r| r.is_started());
        match how {
            Finalize::Exiting { status } if started => {
                let header = session
                    .record()
                    .map(|r| r.header(aggregated))
                    .ok_or_else(|| AuditError::Protocol("no record at end of audit".into()))?;
                let eoa = wire::format_eoa(status, &header)?;

                match &self.settings.endpoints {
                    Some(endpoints) => {
                        // A recycled command has sent nothing yet.
                        if conn.is_none() {
                            conn = Some(MonitorConnection::connect(
                                endpoints,
                                self.settings.connect_timeout,
                            )?);
                        }
                        session.set_phase(MonitorPhase::SendingEoa);
                        if let Some(c) = conn.as_mut() {
                            c.send(eoa.as_bytes())?;
                        }
                    }
                    None => {
                        if let Some(channel) = session.channel.as_mut() {
                            channel.write(eoa.as_bytes())?;
                        }
                    }
                }
                debug!(status, "end of audit");
                session.record = None;
                session.channel = None;
            }
            _ => {
                if let Some(staging) = session.channel.as_mut().and_then(|c| c.staging_mut()) {
                    staging.truncate()?;
                }
            }
        }

        if let Some(c) = conn {
            session.set_phase(MonitorPhase::AwaitingEoaAck);
            let answer = c.finish()?;
            trace!(%answer, "EOA acknowledged");
        }
        // A command that survives an exec is still running.
        let running = session.record().map_or(false, |r| r.is_started());
        session.set_phase(if running {
            MonitorPhase::Open
        } else {
            MonitorPhase::Closed
        });
        Ok(())
    }

    /// Lock the session and flush pending actions ahead of a fork.
    ///
    /// The child's staging file is made before the lock is taken, and calls
    /// routed back into [`record`](Self::record) from this thread are
    /// dropped until the guard is released.
    pub fn prepare_fork(&self) -> AuditResult<ForkGuard<'_>> {
        let scope = EngineScope::enter();
        let spare = self.spare_staging()?;
        let mut session = self.session.lock();
        session.flush()?;
        session.spare = spare;
        Ok(ForkGuard::new(session, scope))
    }

    fn spare_staging(&self) -> AuditResult<Option<StagingFile>> {
        if !self.activation.is_active() || self.settings.is_debug_mode() {
            return Ok(None);
        }
        StagingFile::create().map(Some)
    }

    /// `pthread_atfork` prepare step: like [`prepare_fork`](Self::prepare_fork)
    /// but the lock and the engine marker stay held with no guard.
    pub(crate) fn atfork_prepare(&self) -> AuditResult<()> {
        busy::enter_raw();
        let spare = match self.spare_staging() {
            Ok(spare) => spare,
            Err(e) => {
                busy::leave_raw();
                return Err(e);
            }
        };
        let mut session = self.session.lock();
        session.spare = spare;
        let flushed = session.flush();
        std::mem::forget(session);
        flushed.map(|_| ())
    }

    /// `pthread_atfork` parent step.
    ///
    /// # Safety
    /// The session lock must be held by a prior `atfork_prepare`.
    pub(crate) unsafe fn atfork_parent(&self) {
        (*self.session.data_ptr()).fork_parent();
        self.session.force_unlock();
        busy::leave_raw();
    }

    /// `pthread_atfork` child step.
    ///
    /// # Safety
    /// The session lock must be held by a prior `atfork_prepare`.
    pub(crate) unsafe fn atfork_child(&self) -> AuditResult<()> {
        let result = (*self.session.data_ptr()).fork_child();
        self.session.force_unlock();
        busy::leave_raw();
        result
    }
}

fn ignore_sigpipe() -> AuditResult<()> {
    let ignore = SigAction::new(SigHandler::SigIgn, SaFlags::empty(), SigSet::empty());
    // SAFETY: installing SIG_IGN runs no handler code.
    unsafe { sigaction(Signal::SIGPIPE, &ignore) }
        .map(|_| ())
        .map_err(|e| cmdaudit_common_core::Error::os("sigaction", e).into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cmdaudit_audit_types::BaseDirResolver;
    use cmdaudit_common_config::MemoryProperties;

    fn launch(exe: &str) -> CommandLaunch {
        CommandLaunch {
            pid: 100,
            exe: exe.to_string(),
            line: format!("{} -c a.c", exe),
            rwd: "/work".to_string(),
            host: "buildhost".to_string(),
            env: vec![("CC".into(), "gcc".into())],
        }
    }

    fn debug_auditor(store: MemoryProperties, out: &std::path::Path) -> Auditor {
        let store = store
            .with(Property::NoMonitor, "1")
            .with(Property::OutputFile, out.to_string_lossy());
        Auditor::builder(store)
            .resolver(BaseDirResolver::new("/work"))
            .build()
            .unwrap()
    }

    #[test]
    fn test_activation_pattern_miss_stays_inactive() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        let store = MemoryProperties::new().with(Property::ActivationProgRe, "^/usr/bin/cc$");
        let auditor = debug_auditor(store, &out);

        assert_eq!(auditor.initialize(&launch("/usr/bin/ld")).unwrap(), Startup::Inactive);
        assert!(!auditor.activation().is_active());
        assert!(auditor.current_record().is_none());
        auditor.record("open", "a.c", None, 3, Op::Read).unwrap();
        auditor.finalize(Finalize::Exiting { status: 0 }).unwrap();
        assert!(std::fs::read_dir(dir.path()).unwrap().next().is_none());
    }

    #[test]
    fn test_activation_pattern_hit_clears_property() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        std::fs::write(&out, "").unwrap();
        let store = MemoryProperties::new().with(Property::ActivationProgRe, "^/usr/bin/cc$");
        let auditor = debug_auditor(store, &out);

        assert_eq!(auditor.initialize(&launch("/usr/bin/cc")).unwrap(), Startup::Continue);
        assert!(auditor.activation().is_active_by_request());
        assert_eq!(auditor.store.get(Property::ActivationProgRe).as_deref(), Some(""));
    }

    #[test]
    fn test_ignored_program_is_inactive() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        let store = MemoryProperties::new().with(Property::AuditIgnoreProgRe, "/ld$");
        let auditor = debug_auditor(store, &out);
        assert_eq!(auditor.initialize(&launch("/usr/bin/ld")).unwrap(), Startup::Inactive);
    }

    #[test]
    fn test_exec_recorded_after_start() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        std::fs::write(&out, "").unwrap();
        let auditor = debug_auditor(MemoryProperties::new(), &out);
        auditor.initialize(&launch("/usr/bin/cc")).unwrap();

        let record = auditor.current_record().unwrap();
        assert!(record.is_started());
        assert_eq!(record.cmdid(), 100);
        assert_eq!(record.action_count(), 1);
        assert_eq!(record.actions()[0].op, Op::Exec);
        assert_eq!(record.actions()[0].state.primary().as_str(), "/usr/bin/cc");
        assert!(record.ccode().is_some());
    }

    #[test]
    fn test_secondary_only_for_links() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        std::fs::write(&out, "").unwrap();
        let auditor = debug_auditor(MemoryProperties::new(), &out);
        auditor.initialize(&launch("/usr/bin/ln")).unwrap();

        auditor.record("symlink", "lnk", Some("../t"), -1, Op::Symlink).unwrap();
        auditor.record("link", "new", Some("old"), -1, Op::Link).unwrap();
        auditor.record("rename", "x", Some("y"), -1, Op::Write).unwrap();

        let actions = auditor.current_record().unwrap().actions().to_vec();
        assert_eq!(actions[1].state.secondary(), &Secondary::RawTargetText("../t".into()));
        assert_eq!(
            actions[2].state.secondary(),
            &Secondary::ResolvedPath(PathName::from_absolute("/work/old"))
        );
        assert_eq!(actions[3].state.secondary(), &Secondary::None);
    }

    #[test]
    fn test_depth_and_parent_properties_rewritten() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        std::fs::write(&out, "").unwrap();
        let store = MemoryProperties::new()
            .with(Property::Depth, "3")
            .with(Property::Pcmdid, "55")
            .with(Property::Pccode, "parent");
        let auditor = debug_auditor(store, &out);
        auditor.initialize(&launch("/usr/bin/cc")).unwrap();

        let record = auditor.current_record().unwrap();
        assert_eq!(record.depth(), 3);
        assert_eq!(record.pcmdid(), 55);
        assert_eq!(record.pccode(), Some("parent"));
        assert_eq!(auditor.store.get(Property::Depth).as_deref(), Some("4"));
        assert_eq!(auditor.store.get(Property::Pcmdid).as_deref(), Some("100"));
        assert_eq!(auditor.store.get(Property::Pccode).as_deref(), record.ccode());
    }

    #[test]
    fn test_atfork_hooks_drop_reentrant_calls() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        std::fs::write(&out, "").unwrap();
        let auditor = debug_auditor(MemoryProperties::new(), &out);
        auditor.initialize(&launch("/usr/bin/cc")).unwrap();

        auditor.atfork_prepare().unwrap();
        // With the lock held, a call coming back from an intercepted open
        // returns at once instead of waiting on the lock.
        auditor.record("open", "/work/tmpfile", None, 7, Op::Write).unwrap();
        // SAFETY: paired with the atfork_prepare above.
        unsafe { auditor.atfork_child() }.unwrap();

        let record = auditor.current_record().unwrap();
        assert_eq!(record.action_count(), 0);
        auditor.record("open", "after.o", None, 7, Op::Write).unwrap();
        assert_eq!(auditor.current_record().unwrap().action_count(), 1);
    }

    #[test]
    fn test_atfork_parent_releases_lock_and_marker() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        std::fs::write(&out, "").unwrap();
        let auditor = debug_auditor(MemoryProperties::new(), &out);
        auditor.initialize(&launch("/usr/bin/cc")).unwrap();

        auditor.atfork_prepare().unwrap();
        // SAFETY: paired with the atfork_prepare above.
        unsafe { auditor.atfork_parent() };
        assert!(!busy::is_inside());
        // The EXEC action went out with the flush ahead of the fork.
        assert_eq!(auditor.current_record().unwrap().action_count(), 0);
        auditor.record("open", "x.c", None, 3, Op::Read).unwrap();
        assert_eq!(auditor.current_record().unwrap().action_count(), 1);
    }

    #[test]
    fn test_ignore_path() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        std::fs::write(&out, "").unwrap();
        let store = MemoryProperties::new().with(Property::AuditIgnorePathRe, "^/tmp/");
        let auditor = debug_auditor(store, &out);
        auditor.initialize(&launch("/usr/bin/cc")).unwrap();

        auditor.record("open", "/tmp/cc123.s", None, -1, Op::Write).unwrap();
        auditor.record("open", "a.o", None, -1, Op::Write).unwrap();
        let record = auditor.current_record().unwrap();
        assert_eq!(record.action_count(), 2);
        assert_eq!(record.actions()[1].state.primary().as_str(), "/work/a.o");
    }
}
