//! Diagnostic logging for the auditor.
//!
//! The auditor runs inside somebody else's process, so it stays quiet unless
//! asked (warnings and errors on stderr) and setting up a subscriber never
//! fails the host: one that is already installed is left alone.

use std::io;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Mutex;
use strum::{Display, EnumString};
use tracing_subscriber::{
    filter::LevelFilter,
    fmt::{self, writer::BoxMakeWriter},
    layer::{Layered, SubscriberExt},
    util::SubscriberInitExt,
    EnvFilter, Layer, Registry,
};

/// Environment variable holding a full `EnvFilter` directive set.
pub const FILTER_VAR: &str = "CMDAUDIT_LOG";
/// Environment variable holding a single level name or verbosity digit.
pub const LEVEL_VAR: &str = "CMDAUDIT_LOG_LEVEL";
/// Numeric verbosity shared with the rest of the auditor's properties.
pub const VERBOSITY_VAR: &str = "CMDAUDIT_VERBOSITY";
/// Environment variable selecting [`LogFormat`].
pub const FORMAT_VAR: &str = "CMDAUDIT_LOG_FORMAT";
/// Environment variable naming a log file to append to.
pub const FILE_VAR: &str = "CMDAUDIT_LOG_FILE";
/// Environment variable enabling file/line in each event.
pub const SOURCE_VAR: &str = "CMDAUDIT_LOG_SOURCE";

/// Layout of emitted events.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum LogFormat {
    /// Multi-line, with targets.
    Pretty,
    /// One line per event.
    #[default]
    Compact,
    /// Newline-delimited JSON objects.
    Json,
}

/// Where events go.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum LogSink {
    #[default]
    Stderr,
    /// Appended to, created if missing.
    File(PathBuf),
}

/// What [`init`] installs.
#[derive(Debug, Clone, PartialEq)]
pub struct LogConfig {
    pub level: LevelFilter,
    pub format: LogFormat,
    pub sink: LogSink,
    pub source_location: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LevelFilter::WARN,
            format: LogFormat::default(),
            sink: LogSink::default(),
            source_location: false,
        }
    }
}

/// Parse a level name (`warn`, `Warning`, `off`) or a verbosity digit,
/// where 0 means errors only and 4 means everything.
pub fn parse_level(s: &str) -> Option<LevelFilter> {
    let s = s.trim();
    if let Ok(v) = s.parse::<u8>() {
        return Some(match v {
            0 => LevelFilter::ERROR,
            1 => LevelFilter::WARN,
            2 => LevelFilter::INFO,
            3 => LevelFilter::DEBUG,
            _ => LevelFilter::TRACE,
        });
    }
    match s.to_ascii_lowercase().as_str() {
        "warning" => Some(LevelFilter::WARN),
        "none" => Some(LevelFilter::OFF),
        other => LevelFilter::from_str(other).ok(),
    }
}

impl LogConfig {
    /// Build from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup. Unparseable values fall
    /// back to the defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let level = lookup(LEVEL_VAR)
            .or_else(|| lookup(VERBOSITY_VAR))
            .or_else(|| lookup("RUST_LOG"))
            .and_then(|v| parse_level(&v))
            .unwrap_or(defaults.level);
        let format = lookup(FORMAT_VAR)
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(defaults.format);
        let sink = match lookup(FILE_VAR) {
            Some(p) if !p.trim().is_empty() => LogSink::File(PathBuf::from(p)),
            _ => LogSink::Stderr,
        };
        let source_location = lookup(SOURCE_VAR)
            .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        Self {
            level,
            format,
            sink,
            source_location,
        }
    }

    fn writer(&self) -> io::Result<BoxMakeWriter> {
        Ok(match &self.sink {
            LogSink::Stderr => BoxMakeWriter::new(io::stderr),
            LogSink::File(path) => {
                let file = std::fs::OpenOptions::new().create(true).append(true).open(path)?;
                BoxMakeWriter::new(Mutex::new(file))
            }
        })
    }
}

type FmtLayer = Box<dyn Layer<Layered<EnvFilter, Registry>> + Send + Sync>;

fn fmt_layer(config: &LogConfig, writer: BoxMakeWriter) -> FmtLayer {
    let base = fmt::layer().with_writer(writer).with_ansi(false);
    let src = config.source_location;
    match config.format {
        LogFormat::Json => base.json().boxed(),
        LogFormat::Compact => base.compact().with_file(src).with_line_number(src).boxed(),
        LogFormat::Pretty => base.pretty().with_file(src).with_line_number(src).boxed(),
    }
}

/// Install a global subscriber. `CMDAUDIT_LOG`, when set to a valid
/// directive, overrides `config.level`.
pub fn init(config: LogConfig) -> Result<(), LogError> {
    let filter = EnvFilter::try_from_env(FILTER_VAR)
        .unwrap_or_else(|_| EnvFilter::default().add_directive(config.level.into()));
    let layer = fmt_layer(&config, config.writer()?);

    tracing_subscriber::registry()
        .with(filter)
        .with(layer)
        .try_init()
        .map_err(|e| LogError::AlreadyInstalled(e.to_string()))
}

/// Install from the environment, ignoring any failure.
pub fn init_from_env() {
    let _ = init(LogConfig::from_env());
}

#[derive(Debug, thiserror::Error)]
pub enum LogError {
    #[error("subscriber not installed: {0}")]
    AlreadyInstalled(String),

    #[error("cannot open log file: {0}")]
    Sink(#[from] io::Error),
}

pub use tracing::{debug, error, info, trace, warn};
