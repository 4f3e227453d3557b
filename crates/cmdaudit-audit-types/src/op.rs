//! File-system operation kinds.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// The kind of file-system operation a path action records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[derive(Display, EnumIter, EnumString)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Op {
    Read,
    Write,
    Unlink,
    Mkdir,
    Symlink,
    Link,
    Exec,
}

impl Op {
    /// Reads are the only ops recorded without a timestamp.
    pub fn is_read(&self) -> bool {
        matches!(self, Self::Read)
    }

    /// Whether the op changes the file system and is subject to write policy.
    pub fn modifies_filesystem(&self) -> bool {
        !matches!(self, Self::Read | Self::Exec)
    }
}
