//! Property names.

use strum::{Display, EnumIter, EnumString, IntoStaticStr};

/// Prefix shared by every property in the environment.
pub const PROPERTY_PREFIX: &str = "CMDAUDIT_";

/// A named auditor property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[derive(Display, EnumIter, EnumString, IntoStaticStr)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Property {
    /// Nesting depth of the command; rewritten to depth+1 for children.
    Depth,
    /// Command id of the parent command.
    Pcmdid,
    /// Content code of the parent command.
    Pccode,
    /// Debug mode: write audit records to a file instead of the monitor.
    NoMonitor,
    /// Debug output destination (`-` stdout, `=` stderr, or a path).
    OutputFile,
    /// Monitor IP address.
    MonitorHost,
    /// Ordered list of candidate monitor ports.
    MonitorPort,
    /// Per-candidate connect timeout in seconds.
    MonitorConnectTimeout,
    /// Marks aggregated sub-commands that should skip shopping.
    AggregatedSubcmd,
    /// Activate only for executables matching this pattern.
    ActivationProgRe,
    /// Paths matching this pattern are never recorded.
    AuditIgnorePathRe,
    /// Programs matching this pattern are never audited.
    AuditIgnoreProgRe,
    /// Writes must target paths matching this pattern.
    AllowedWritePathRe,
    /// `cmdre[:varre]` selecting commands whose environment is captured.
    TrackEnvRe,
    /// Send a completion token when the top-level command exits.
    NotifyDone,
    /// Log verbosity.
    Verbosity,
}

impl Property {
    /// Bare property name, e.g. `DEPTH`.
    pub fn name(&self) -> &'static str {
        (*self).into()
    }

    /// Environment variable carrying this property, e.g. `CMDAUDIT_DEPTH`.
    pub fn env_name(&self) -> String {
        format!("{}{}", PROPERTY_PREFIX, self.name())
    }
}
