//! Where audit records go before they reach the monitor.

use crate::{AuditError, AuditResult, StagingFile};
use cmdaudit_common_config::OutputTarget;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::os::unix::fs::OpenOptionsExt;
use std::path::Path;
use tracing::debug;

/// Local destination for records when no monitor is in use.
#[derive(Debug)]
pub enum DebugSink {
    Stdout,
    Stderr,
    File(File),
}

impl DebugSink {
    /// Open the sink for `target`.
    ///
    /// An existing file is appended to. Otherwise a new file named after
    /// the target with `.<pid>` appended is created.
    pub fn open(target: &OutputTarget, pid: u32) -> AuditResult<Self> {
        match target {
            OutputTarget::Stdout => Ok(Self::Stdout),
            OutputTarget::Stderr => Ok(Self::Stderr),
            OutputTarget::File(path) => Self::open_file(path, pid).map(Self::File),
        }
    }

    fn open_file(path: &Path, pid: u32) -> AuditResult<File> {
        if let Ok(file) = OpenOptions::new().append(true).open(path) {
            return Ok(file);
        }

        let per_pid = format!("{}.{}", path.display(), pid);
        debug!(path = %per_pid, "creating debug output file");
        OpenOptions::new()
            .create(true)
            .append(true)
            .mode(0o666)
            .custom_flags(libc::O_CLOEXEC)
            .open(&per_pid)
            .map_err(|source| AuditError::Output {
                path: per_pid,
                source,
            })
    }

    fn write_all(&mut self, bytes: &[u8]) -> io::Result<()> {
        match self {
            Self::Stdout => {
                let mut out = io::stdout().lock();
                out.write_all(bytes)?;
                out.flush()
            }
            Self::Stderr => io::stderr().lock().write_all(bytes),
            Self::File(file) => file.write_all(bytes),
        }
    }
}

/// The channel a command's records are written to.
#[derive(Debug)]
pub enum AuditChannel {
    /// Buffered for the monitor.
    Staging(StagingFile),
    /// Written out directly.
    Debug(DebugSink),
}

impl AuditChannel {
    /// A fresh staging channel.
    pub fn staging() -> AuditResult<Self> {
        StagingFile::create().map(Self::Staging)
    }

    /// A debug channel for `target`.
    pub fn debug(target: &OutputTarget, pid: u32) -> AuditResult<Self> {
        DebugSink::open(target, pid).map(Self::Debug)
    }

    /// Write a run of records.
    pub fn write(&mut self, bytes: &[u8]) -> AuditResult<()> {
        match self {
            Self::Staging(staging) => staging.append(bytes),
            Self::Debug(sink) => sink.write_all(bytes).map_err(|e| AuditError::staging("write", e)),
        }
    }

    /// The staging file, when the channel has one.
    pub fn staging_mut(&mut self) -> Option<&mut StagingFile> {
        match self {
            Self::Staging(staging) => Some(staging),
            Self::Debug(_) => None,
        }
    }

    pub fn is_debug(&self) -> bool {
        matches!(self, Self::Debug(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::os::unix::fs::PermissionsExt;

    #[test]
    fn test_existing_file_is_appended() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.out");
        std::fs::write(&path, "first\n").unwrap();

        let mut channel = AuditChannel::debug(&OutputTarget::File(path.clone()), 7).unwrap();
        channel.write(b"second\n").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "first\nsecond\n");
        assert!(!dir.path().join("audit.out.7").exists());
    }

    #[test]
    fn test_missing_file_gets_pid_suffix() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.out");

        let mut channel = AuditChannel::debug(&OutputTarget::File(path.clone()), 4242).unwrap();
        channel.write(b"x\n").unwrap();

        let created = dir.path().join("audit.out.4242");
        assert_eq!(std::fs::read_to_string(&created).unwrap(), "x\n");
        assert!(!path.exists());
        let mode = std::fs::metadata(&created).unwrap().permissions().mode();
        assert_ne!(mode & 0o600, 0);
    }

    #[test]
    fn test_staging_channel() {
        let mut channel = AuditChannel::staging().unwrap();
        assert!(!channel.is_debug());
        channel.write(b"<PA>{}\n").unwrap();
        assert_eq!(channel.staging_mut().unwrap().len().unwrap(), 7);
    }
}
