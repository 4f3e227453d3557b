//! Monitor answers to a start-of-audit record.

use crate::wire::{WireError, FIELD_SEPARATOR};
use std::fmt;

/// The monitor's answer to an SOA.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ack {
    /// Run the command.
    Ok,
    /// Run the command; descendants skip shopping.
    OkAggregated,
    /// Stop with status 2.
    Failure,
    /// The outputs already exist from `prior`; stop with status 0.
    Recycle { prior: String },
}

impl Ack {
    /// Interpret one ack line, trailing newline optional.
    ///
    /// Anything unrecognized is a recycle. The prior id is the text after
    /// the first separator, or the whole line if there is none.
    pub fn parse(line: &str) -> Result<Self, WireError> {
        let line = line.trim();
        match line {
            "" => Err(WireError::EmptyAck),
            "OK" => Ok(Self::Ok),
            "OK-AGGREGATED" => Ok(Self::OkAggregated),
            "FAILURE" => Ok(Self::Failure),
            other => {
                let prior = match other.split_once(FIELD_SEPARATOR) {
                    Some((_, id)) => id.trim(),
                    None => other,
                };
                Ok(Self::Recycle {
                    prior: prior.to_string(),
                })
            }
        }
    }

    /// Whether the command stops here.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Failure | Self::Recycle { .. })
    }
}

impl fmt::Display for Ack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ok => f.write_str("OK"),
            Self::OkAggregated => f.write_str("OK-AGGREGATED"),
            Self::Failure => f.write_str("FAILURE"),
            Self::Recycle { prior } => write!(f, "RECYCLE{}{}", FIELD_SEPARATOR, prior),
        }
    }
}
