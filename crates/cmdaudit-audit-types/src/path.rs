//! Resolved path names.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// An absolute, resolved path. Immutable once built.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PathName(String);

impl PathName {
    /// Wrap an already-absolute path string.
    pub fn from_absolute(abs: impl Into<String>) -> Self {
        Self(abs.into())
    }

    /// The absolute path string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// As a filesystem path.
    pub fn as_path(&self) -> &Path {
        Path::new(&self.0)
    }
}

impl fmt::Display for PathName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for PathName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PathName({})", self.0)
    }
}

/// Collapse `.` and `..` segments and repeated slashes, lexically.
///
/// `..` at the root stays at the root; leading `..` of a relative path are
/// kept. An empty result is `.`.
pub fn normalize(path: &str) -> String {
    let absolute = path.starts_with('/');
    let mut kept: Vec<&str> = Vec::new();
    for seg in path.split('/') {
        match seg {
            "" | "." => {}
            ".." => match kept.last() {
                Some(&last) if last != ".." => {
                    kept.pop();
                }
                _ if absolute => {}
                _ => kept.push(".."),
            },
            name => kept.push(name),
        }
    }
    let body = kept.join("/");
    match (absolute, body.is_empty()) {
        (true, _) => format!("/{}", body),
        (false, true) => ".".to_string(),
        (false, false) => body,
    }
}

/// Turns the raw path an intercepted call received into a [`PathName`].
pub trait PathResolver: Send + Sync {
    /// Resolve `raw` to an absolute path.
    fn resolve(&self, raw: &str) -> PathName;
}

/// Resolves relative paths against a fixed base directory.
#[derive(Debug, Clone)]
pub struct BaseDirResolver {
    base: PathBuf,
}

impl BaseDirResolver {
    /// Create a resolver rooted at `base`, which must be absolute.
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }
}

impl PathResolver for BaseDirResolver {
    fn resolve(&self, raw: &str) -> PathName {
        PathName::from_absolute(normalize(&self.base.join(raw).to_string_lossy()))
    }
}

/// Resolves relative paths against the working directory at call time.
#[derive(Debug, Default, Clone, Copy)]
pub struct CwdResolver;

impl PathResolver for CwdResolver {
    fn resolve(&self, raw: &str) -> PathName {
        if raw.starts_with('/') {
            return PathName::from_absolute(normalize(raw));
        }
        let joined = match std::env::current_dir() {
            Ok(cwd) => format!("{}/{}", cwd.to_string_lossy(), raw),
            Err(_) => raw.to_string(),
        };
        PathName::from_absolute(normalize(&joined))
    }
}
