//! Path state attached to each path action.

use crate::{Op, PathName};
use serde::{Deserialize, Serialize};

/// The op-dependent second operand of a path action.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Secondary {
    /// No second operand.
    #[default]
    None,
    /// The resolved destination of a link or rename.
    ResolvedPath(PathName),
    /// The literal, unresolved text of a symlink target.
    RawTargetText(String),
}

impl Secondary {
    /// Whether this operand may accompany `op`.
    pub fn is_valid_for(&self, op: Op) -> bool {
        match self {
            Self::None => true,
            Self::ResolvedPath(_) => op == Op::Link,
            Self::RawTargetText(_) => op == Op::Symlink,
        }
    }
}

/// What an op did to the primary path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PathFlags {
    pub unlinked: bool,
    pub dir: bool,
    pub symlinked: bool,
    pub linked: bool,
}

impl PathFlags {
    /// Flags implied by an op.
    pub fn for_op(op: Op) -> Self {
        Self {
            unlinked: op == Op::Unlink,
            dir: op == Op::Mkdir,
            symlinked: op == Op::Symlink,
            linked: op == Op::Link,
        }
    }
}

/// Primary path, optional second operand, and flags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathState {
    primary: PathName,
    #[serde(default)]
    secondary: Secondary,
    flags: PathFlags,
}

impl PathState {
    /// Build the state for `op`. A second operand that cannot accompany the
    /// op is dropped, so only LINK and SYMLINK ever carry one.
    pub fn for_op(op: Op, primary: PathName, secondary: Secondary) -> Self {
        let secondary = if secondary.is_valid_for(op) {
            secondary
        } else {
            Secondary::None
        };
        Self {
            primary,
            secondary,
            flags: PathFlags::for_op(op),
        }
    }

    /// The primary path.
    pub fn primary(&self) -> &PathName {
        &self.primary
    }

    /// The second operand.
    pub fn secondary(&self) -> &Secondary {
        &self.secondary
    }

    /// The flags.
    pub fn flags(&self) -> PathFlags {
        self.flags
    }

    /// Whether this state is one `for_op(op, ..)` could have produced.
    pub fn is_consistent_with(&self, op: Op) -> bool {
        self.secondary.is_valid_for(op) && self.flags == PathFlags::for_op(op)
    }
}
