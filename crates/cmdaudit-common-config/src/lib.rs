//! Configuration for cmdaudit.
//!
//! Everything the auditor is told arrives through properties that a wrapper
//! program placed in the environment before the audited command started.
//! Properties are read through the [`PropertyStore`] seam and may only be
//! modified in place, never added or replaced, because the host program may
//! hold raw pointers into its environment block.

pub mod endpoints;
pub mod error;
pub mod keys;
pub mod pattern;
pub mod settings;
pub mod store;

pub use endpoints::MonitorEndpoints;
pub use error::{ConfigError, ConfigResult};
pub use keys::{Property, PROPERTY_PREFIX};
pub use pattern::Pattern;
pub use settings::{AuditSettings, OutputTarget, TrackEnv};
pub use store::{EnvProperties, MemoryProperties, PropertyStore};
