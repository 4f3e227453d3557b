//! The process-wide auditor.
//!
//! Interposed calls have no context to carry an [`Auditor`] around, so the
//! one belonging to this process is installed here once and reached through
//! the functions below. Errors end the process through [`die`].

use crate::{AuditError, AuditResult, Auditor, CommandLaunch, Finalize, Startup};
use cmdaudit_audit_types::Op;
use cmdaudit_common_config::EnvProperties;
use once_cell::sync::OnceCell;
use tracing::error;

static AUDITOR: OnceCell<Auditor> = OnceCell::new();

/// Install `auditor` as this process's auditor.
///
/// Fails, handing the auditor back, if one is already installed.
pub fn install(auditor: Auditor) -> Result<&'static Auditor, Auditor> {
    AUDITOR.try_insert(auditor).map_err(|(_, rejected)| rejected)
}

/// The installed auditor, if any.
pub fn get() -> Option<&'static Auditor> {
    AUDITOR.get()
}

/// Report a fatal error and exit.
pub fn die(err: &AuditError) -> ! {
    error!(error = %err, pid = std::process::id(), "fatal audit error");
    eprintln!("cmdaudit: ERROR: {}", err);
    std::process::exit(err.exit_status())
}

fn or_die<T>(result: AuditResult<T>) -> T {
    match result {
        Ok(v) => v,
        Err(e) => die(&e),
    }
}

/// Initialize auditing for the current process image.
///
/// Sets up logging, builds the auditor from the environment, installs it
/// and runs the start-of-audit exchange. Exits the process when the monitor
/// says so.
pub fn start() {
    cmdaudit_common_log::init_from_env();

    if get().is_some() {
        return;
    }
    let auditor = or_die(Auditor::builder(EnvProperties::new()).build());
    let Ok(auditor) = install(auditor) else {
        return;
    };
    let launch = or_die(CommandLaunch::current());
    if let Startup::Exit(status) = or_die(auditor.initialize(&launch)) {
        std::process::exit(status);
    }
}

/// Record one intercepted call.
pub fn record(call: &str, path: &str, secondary: Option<&str>, fd: i32, op: Op) {
    if let Some(auditor) = get() {
        or_die(auditor.record(call, path, secondary, fd, op));
    }
}

/// Finish the current process image.
pub fn finish(how: Finalize) {
    if let Some(auditor) = get() {
        or_die(auditor.finalize(how));
    }
}

/// Force recording on for this process.
pub fn set_active() {
    if let Some(auditor) = get() {
        auditor.activation().set_active();
    }
}

/// Force recording off for this process.
pub fn set_inactive() {
    if let Some(auditor) = get() {
        auditor.activation().set_inactive();
    }
}
