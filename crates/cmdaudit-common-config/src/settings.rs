//! Audit settings derived from properties.

use crate::{ConfigError, ConfigResult, MonitorEndpoints, Pattern, Property, PropertyStore};
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;

/// Default per-candidate connect timeout.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(60);

/// Where debug-mode audit records are written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputTarget {
    /// Standard output (`-`).
    Stdout,
    /// Standard error (`=`, or no output file configured).
    Stderr,
    /// A named file, appended to if present.
    File(PathBuf),
}

impl OutputTarget {
    fn parse(value: Option<String>) -> Self {
        match value.as_deref() {
            Some("-") => Self::Stdout,
            Some("=") | Some("") | None => Self::Stderr,
            Some(path) => Self::File(PathBuf::from(path)),
        }
    }
}

/// Selects commands whose environment is captured into the record.
#[derive(Debug, Clone)]
pub struct TrackEnv {
    command: Pattern,
    variables: Option<Pattern>,
}

impl TrackEnv {
    /// Parse `cmdre[:varre]`; the last colon separates the two patterns.
    pub fn parse(value: &str) -> ConfigResult<Self> {
        let (command, variables) = match value.rsplit_once(':') {
            Some((cmd, var)) => (Pattern::new("TRACK_ENV_CMD", cmd)?, Some(Pattern::new("TRACK_ENV_VAR", var)?)),
            None => (Pattern::new("TRACK_ENV_CMD", value)?, None),
        };
        Ok(Self { command, variables })
    }

    /// Newline-separated `NAME=value` block for a matching command line.
    ///
    /// Entries mentioning `TRACK_ENV` are always left out.
    pub fn snapshot<I>(&self, line: &str, vars: I) -> Option<String>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        if !self.command.is_match(line) {
            return None;
        }

        let mut block = String::new();
        for (key, value) in vars {
            let entry = format!("{}={}", key, value);
            if entry.contains("TRACK_ENV") {
                continue;
            }
            if self.variables.as_ref().map_or(true, |re| re.is_match(&entry)) {
                block.push_str(&entry);
                block.push('\n');
            }
        }
        Some(block)
    }
}

/// Immutable auditor configuration, loaded once at initialization.
#[derive(Debug, Clone)]
pub struct AuditSettings {
    /// Depth of this command; `None` when running outside a monitor wrapper.
    pub depth: Option<u64>,
    /// Parent command id.
    pub pcmdid: u64,
    /// Parent content code.
    pub pccode: Option<String>,
    /// Debug mode: no monitor, records go to `output`.
    pub no_monitor: bool,
    /// Debug-mode destination.
    pub output: OutputTarget,
    /// Monitor candidates; present unless in debug mode.
    pub endpoints: Option<MonitorEndpoints>,
    /// Connect timeout per candidate.
    pub connect_timeout: Duration,
    /// Whether the aggregated-subcommand property exists, and its value.
    pub aggregated_subcmd: Option<bool>,
    /// Activation pattern applied to the executable.
    pub activation: Option<Pattern>,
    /// Paths never recorded.
    pub ignore_path: Option<Pattern>,
    /// Programs never audited.
    pub ignore_prog: Option<Pattern>,
    /// Legal targets for writes.
    pub allowed_write: Option<Pattern>,
    /// Environment capture selector.
    pub track_env: Option<TrackEnv>,
    /// Send the completion token when the top-level command exits.
    pub notify_done: bool,
}

impl AuditSettings {
    /// Load settings from a property store.
    pub fn load(store: &dyn PropertyStore) -> ConfigResult<Self> {
        let depth = store.get_ulong(Property::Depth)?;

        // Without a depth we were not launched by a monitor wrapper, so
        // fall back to writing records locally.
        let no_monitor = depth.is_none() || store.get_bool(Property::NoMonitor);
        if depth.is_none() {
            debug!("no {} property, running in debug mode", Property::Depth.env_name());
        }

        let endpoints = if no_monitor {
            None
        } else {
            let host = store
                .get(Property::MonitorHost)
                .filter(|h| !h.is_empty())
                .unwrap_or_else(|| crate::endpoints::DEFAULT_MONITOR_HOST.to_string());
            let ports = store
                .get(Property::MonitorPort)
                .filter(|p| !p.is_empty())
                .ok_or_else(|| ConfigError::NotSet {
                    name: Property::MonitorPort.env_name(),
                })?;
            Some(MonitorEndpoints::parse(&host, &ports)?)
        };

        let connect_timeout = store
            .get_ulong(Property::MonitorConnectTimeout)?
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_CONNECT_TIMEOUT);

        let aggregated_subcmd = store
            .is_present(Property::AggregatedSubcmd)
            .then(|| store.get_bool(Property::AggregatedSubcmd));

        let track_env = match store.get(Property::TrackEnvRe) {
            Some(value) if !value.is_empty() => Some(TrackEnv::parse(&value)?),
            _ => None,
        };

        Ok(Self {
            depth,
            pcmdid: store.get_ulong(Property::Pcmdid)?.unwrap_or(0),
            pccode: store.get(Property::Pccode).filter(|c| !c.is_empty()),
            no_monitor,
            output: OutputTarget::parse(store.get(Property::OutputFile)),
            endpoints,
            connect_timeout,
            aggregated_subcmd,
            activation: Pattern::from_property(store, Property::ActivationProgRe)?,
            ignore_path: Pattern::from_property(store, Property::AuditIgnorePathRe)?,
            ignore_prog: Pattern::from_property(store, Property::AuditIgnoreProgRe)?,
            allowed_write: Pattern::from_property(store, Property::AllowedWritePathRe)?,
            track_env,
            notify_done: store.get_bool(Property::NotifyDone),
        })
    }

    /// Whether records are written locally rather than sent to a monitor.
    pub fn is_debug_mode(&self) -> bool {
        self.no_monitor
    }

    /// Whether this command was flagged as an aggregated sub-command.
    pub fn is_aggregated(&self) -> bool {
        self.aggregated_subcmd.unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryProperties;
    use test_case::test_case;

    fn monitored() -> MemoryProperties {
        MemoryProperties::new()
            .with(Property::Depth, "2")
            .with(Property::Pcmdid, "77")
            .with(Property::MonitorPort, "4000,4001")
    }

    #[test]
    fn test_naked_run_forces_debug_mode() {
        let settings = AuditSettings::load(&MemoryProperties::new()).unwrap();
        assert!(settings.is_debug_mode());
        assert!(settings.endpoints.is_none());
        assert_eq!(settings.depth, None);
        assert_eq!(settings.output, OutputTarget::Stderr);
    }

    #[test]
    fn test_monitored_settings() {
        let settings = AuditSettings::load(&monitored()).unwrap();
        assert!(!settings.is_debug_mode());
        assert_eq!(settings.depth, Some(2));
        assert_eq!(settings.pcmdid, 77);
        let eps = settings.endpoints.unwrap();
        assert_eq!(eps.ports(), &[4000, 4001]);
        assert_eq!(eps.host().to_string(), "127.0.0.1");
        assert_eq!(settings.connect_timeout, DEFAULT_CONNECT_TIMEOUT);
        assert_eq!(settings.aggregated_subcmd, None);
    }

    #[test]
    fn test_missing_port_is_error() {
        let store = MemoryProperties::new().with(Property::Depth, "0");
        let err = AuditSettings::load(&store).unwrap_err();
        assert!(matches!(err, ConfigError::NotSet { .. }));
    }

    #[test_case(Some("-"), OutputTarget::Stdout)]
    #[test_case(Some("="), OutputTarget::Stderr)]
    #[test_case(None, OutputTarget::Stderr)]
    #[test_case(Some("/tmp/audit.out"), OutputTarget::File(PathBuf::from("/tmp/audit.out")))]
    fn test_output_target(value: Option<&str>, expected: OutputTarget) {
        assert_eq!(OutputTarget::parse(value.map(String::from)), expected);
    }

    #[test]
    fn test_aggregated_presence() {
        let store = monitored().with(Property::AggregatedSubcmd, "0");
        let settings = AuditSettings::load(&store).unwrap();
        assert_eq!(settings.aggregated_subcmd, Some(false));
        assert!(!settings.is_aggregated());
    }

    #[test]
    fn test_track_env_snapshot() {
        let track = TrackEnv::parse("make:^(PATH|CC)=").unwrap();
        let vars = vec![
            ("PATH".to_string(), "/bin".to_string()),
            ("HOME".to_string(), "/root".to_string()),
            ("CC".to_string(), "gcc".to_string()),
            ("CMDAUDIT_TRACK_ENV_RE".to_string(), "make".to_string()),
        ];
        assert_eq!(
            track.snapshot("make all", vars.clone()).as_deref(),
            Some("PATH=/bin\nCC=gcc\n")
        );
        assert!(track.snapshot("ninja", vars).is_none());
    }

    #[test]
    fn test_bad_pattern_fails_load() {
        let store = monitored().with(Property::AllowedWritePathRe, "([");
        assert!(matches!(
            AuditSettings::load(&store).unwrap_err(),
            ConfigError::InvalidPattern { .. }
        ));
    }
}
