//! Anonymous scratch file holding path actions until the command ends.

use crate::{AuditError, AuditResult};
use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::os::unix::io::{AsRawFd, FromRawFd, RawFd};
use tracing::trace;

/// Descriptor number the staging file is moved to when free.
pub const PREFERRED_FD: RawFd = 212;
/// How many numbers from [`PREFERRED_FD`] up are tried.
pub const PREFERRED_FD_TRIES: RawFd = 10;

/// An unlinked, close-on-exec temporary file.
///
/// The file lives at a high descriptor number so it stays out of the way of
/// the host program's own descriptors. A forked child gets a new one, so
/// parent and child never interleave writes.
#[derive(Debug)]
pub struct StagingFile {
    file: File,
}

impl StagingFile {
    /// Create a new staging file.
    pub fn create() -> AuditResult<Self> {
        let file = tempfile::tempfile().map_err(|e| AuditError::staging("tmpfile", e))?;
        let file = relocate(file)?;
        trace!(fd = file.as_raw_fd(), "staging file created");
        Ok(Self { file })
    }

    /// Descriptor number.
    pub fn fd(&self) -> RawFd {
        self.file.as_raw_fd()
    }

    /// Append bytes at the end.
    pub fn append(&mut self, bytes: &[u8]) -> AuditResult<()> {
        self.file
            .seek(SeekFrom::End(0))
            .map_err(|e| AuditError::staging("lseek", e))?;
        self.file
            .write_all(bytes)
            .map_err(|e| AuditError::staging("write", e))
    }

    /// Current size in bytes.
    pub fn len(&self) -> AuditResult<u64> {
        self.file
            .metadata()
            .map(|m| m.len())
            .map_err(|e| AuditError::staging("fstat", e))
    }

    pub fn is_empty(&self) -> AuditResult<bool> {
        self.len().map(|n| n == 0)
    }

    /// Rewind and copy the whole content into `out`. Returns bytes copied.
    pub fn stream_to<W: Write>(&mut self, out: &mut W) -> AuditResult<u64> {
        self.file
            .seek(SeekFrom::Start(0))
            .map_err(|e| AuditError::staging("lseek", e))?;

        let mut buf = [0u8; 8192];
        let mut total = 0u64;
        loop {
            let n = match self.file.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(AuditError::staging("read", e)),
            };
            out.write_all(&buf[..n])
                .map_err(|e| AuditError::monitor("send", e))?;
            total += n as u64;
        }
        Ok(total)
    }

    /// Discard the content.
    pub fn truncate(&mut self) -> AuditResult<()> {
        self.file
            .seek(SeekFrom::Start(0))
            .map_err(|e| AuditError::staging("lseek", e))?;
        self.file
            .set_len(0)
            .map_err(|e| AuditError::staging("ftruncate", e))
    }
}

fn set_cloexec(fd: RawFd) -> io::Result<()> {
    // SAFETY: flag manipulation on a descriptor we own.
    unsafe {
        let flags = libc::fcntl(fd, libc::F_GETFD);
        if flags == -1 || libc::fcntl(fd, libc::F_SETFD, flags | libc::FD_CLOEXEC) == -1 {
            return Err(io::Error::last_os_error());
        }
    }
    Ok(())
}

/// Move `file` to the lowest free descriptor in the preferred range,
/// keeping the system-assigned one if the range is full.
fn relocate(file: File) -> AuditResult<File> {
    // SAFETY: F_DUPFD_CLOEXEC only allocates a new descriptor at or above
    // PREFERRED_FD; it never replaces one that is in use.
    let fd = unsafe { libc::fcntl(file.as_raw_fd(), libc::F_DUPFD_CLOEXEC, PREFERRED_FD) };
    if fd != -1 {
        if fd < PREFERRED_FD + PREFERRED_FD_TRIES {
            drop(file);
            // SAFETY: `fd` is a fresh descriptor owned by nothing else.
            return Ok(unsafe { File::from_raw_fd(fd) });
        }
        // SAFETY: closing the duplicate we just made.
        unsafe { libc::close(fd) };
    }

    set_cloexec(file.as_raw_fd()).map_err(|e| AuditError::staging("fcntl", e))?;
    Ok(file)
}
