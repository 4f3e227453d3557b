//! Process and host queries.
//!
//! Thin wrappers over the platform calls the auditor needs when it builds a
//! command record: process id, a stable-ish thread id, host name, working
//! directory, and the running executable.

use crate::{Error, Result};
use std::path::PathBuf;

/// Process id of the calling process.
pub fn current_pid() -> u32 {
    std::process::id()
}

/// Best-effort id of the calling thread.
///
/// Returns 0 when the caller is the main thread, which is how an unthreaded
/// program is reported, or when the platform offers no usable id.
pub fn thread_id() -> u64 {
    #[cfg(any(target_os = "linux", target_os = "android"))]
    {
        let tid = nix::unistd::gettid().as_raw();
        let pid = nix::unistd::getpid().as_raw();
        if tid == pid {
            0
        } else {
            tid as u64
        }
    }

    #[cfg(not(any(target_os = "linux", target_os = "android")))]
    {
        0
    }
}

/// Name of the current host.
pub fn hostname() -> Result<String> {
    #[cfg(unix)]
    {
        let name = nix::unistd::gethostname().map_err(|e| Error::os("gethostname", e))?;
        Ok(name.to_string_lossy().into_owned())
    }

    #[cfg(not(unix))]
    {
        std::env::var("COMPUTERNAME").map_err(|e| Error::os("COMPUTERNAME", e))
    }
}

/// Current working directory.
pub fn working_dir() -> Result<PathBuf> {
    std::env::current_dir().map_err(Error::from)
}

/// Absolute path of the running executable.
pub fn executable_path() -> Result<PathBuf> {
    std::env::current_exe().map_err(Error::from)
}

/// The command line of the current process, arguments joined by spaces.
pub fn command_line() -> String {
    std::env::args_os()
        .map(|a| a.to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spawned_thread_has_id() {
        let spawned = std::thread::spawn(thread_id).join().unwrap();
        if cfg!(any(target_os = "linux", target_os = "android")) {
            assert_ne!(spawned, 0);
        } else {
            assert_eq!(spawned, 0);
        }
    }

    #[test]
    fn test_hostname_not_empty() {
        assert!(!hostname().unwrap().is_empty());
    }

    #[test]
    fn test_working_dir_is_absolute() {
        assert!(working_dir().unwrap().is_absolute());
    }

    #[test]
    fn test_current_pid_matches_std() {
        assert_eq!(current_pid(), std::process::id());
    }
}
