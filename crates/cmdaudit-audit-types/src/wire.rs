//! Line records exchanged with the monitor.
//!
//! Every record is one newline-terminated line: a marker followed by a JSON
//! body. JSON string escaping keeps embedded newlines out of the line.

use crate::{CommandHeader, Op, PathAction};
use std::io::BufRead;
use thiserror::Error;

/// Start-of-audit marker.
pub const SOA_MARKER: &str = "<SOA>";
/// Start-of-audit marker for an aggregated sub-command.
pub const SOA_AGGREGATED_MARKER: &str = "<sOA>";
/// End-of-audit marker; followed by `[status]`.
pub const EOA_MARKER: &str = "<EOA>";
/// Path action marker.
pub const ACTION_MARKER: &str = "<PA>";
/// Completion token sent when the top-level command exits.
pub const DONE_TOKEN: &str = "{DONE}";
/// Separates fields in an ack line.
pub const FIELD_SEPARATOR: char = ',';

/// Wire error.
#[derive(Debug, Error)]
pub enum WireError {
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("unknown record: {0:?}")]
    UnknownRecord(String),
    #[error("malformed end-of-audit status in {0:?}")]
    BadStatus(String),
    #[error("path state does not match op {0}")]
    Inconsistent(Op),
    #[error("monitor closed the connection without an answer")]
    EmptyAck,
}

/// Format an SOA line.
pub fn format_soa(header: &CommandHeader) -> Result<String, WireError> {
    let marker = if header.aggregated {
        SOA_AGGREGATED_MARKER
    } else {
        SOA_MARKER
    };
    Ok(format!("{}{}\n", marker, serde_json::to_string(header)?))
}

/// Format an EOA line carrying the exit status.
pub fn format_eoa(status: i32, header: &CommandHeader) -> Result<String, WireError> {
    Ok(format!(
        "{}[{}]{}\n",
        EOA_MARKER,
        status,
        serde_json::to_string(header)?
    ))
}

/// Format one path action line.
pub fn format_action(action: &PathAction) -> Result<String, WireError> {
    Ok(format!("{}{}\n", ACTION_MARKER, serde_json::to_string(action)?))
}

/// Format a run of path actions, in order.
pub fn encode_actions(actions: &[PathAction]) -> Result<String, WireError> {
    let mut out = String::new();
    for action in actions {
        out.push_str(&format_action(action)?);
    }
    Ok(out)
}

/// The completion token line.
pub fn done_token() -> String {
    format!("{}\n", DONE_TOKEN)
}

/// A parsed wire line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WireRecord {
    Start { aggregated: bool, header: CommandHeader },
    End { status: i32, header: CommandHeader },
    Action(PathAction),
    Done,
}

impl WireRecord {
    /// Parse one line, trailing newline optional.
    pub fn parse(line: &str) -> Result<Self, WireError> {
        let line = line.trim_end_matches(['\n', '\r']);

        if let Some(body) = line.strip_prefix(ACTION_MARKER) {
            let action: PathAction = serde_json::from_str(body)?;
            if !action.state.is_consistent_with(action.op) {
                return Err(WireError::Inconsistent(action.op));
            }
            return Ok(Self::Action(action));
        }
        if let Some(body) = line.strip_prefix(SOA_MARKER) {
            return Ok(Self::Start {
                aggregated: false,
                header: serde_json::from_str(body)?,
            });
        }
        if let Some(body) = line.strip_prefix(SOA_AGGREGATED_MARKER) {
            return Ok(Self::Start {
                aggregated: true,
                header: serde_json::from_str(body)?,
            });
        }
        if let Some(rest) = line.strip_prefix(EOA_MARKER) {
            let (status, body) = rest
                .strip_prefix('[')
                .and_then(|r| r.split_once(']'))
                .ok_or_else(|| WireError::BadStatus(line.to_string()))?;
            let status = status
                .parse()
                .map_err(|_| WireError::BadStatus(line.to_string()))?;
            return Ok(Self::End {
                status,
                header: serde_json::from_str(body)?,
            });
        }
        if line == DONE_TOKEN {
            return Ok(Self::Done);
        }
        Err(WireError::UnknownRecord(line.to_string()))
    }

    /// Parse every non-empty line of a stream.
    pub fn parse_stream<R: BufRead>(reader: R) -> Result<Vec<Self>, WireError> {
        let mut records = Vec::new();
        for line in reader.lines() {
            let line = line?;
            if line.is_empty() {
                continue;
            }
            records.push(Self::parse(&line)?);
        }
        Ok(records)
    }
}
