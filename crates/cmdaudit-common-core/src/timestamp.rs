//! Wall-clock moments attached to state-changing path actions.

use chrono::{DateTime, Utc};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Seconds and nanoseconds since the Unix epoch.
///
/// Carried on the wire as `"<secs>.<nanos>"` with nanos zero-padded to nine
/// digits, so values sort lexically within the same second count width.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Timestamp {
    secs: i64,
    nanos: u32,
}

impl Timestamp {
    pub fn now() -> Self {
        Utc::now().into()
    }

    /// Returns `None` if `nanos` is a second or more.
    pub fn new(secs: i64, nanos: u32) -> Option<Self> {
        (nanos < 1_000_000_000).then_some(Self { secs, nanos })
    }

    pub fn seconds(&self) -> i64 {
        self.secs
    }

    pub fn nanos(&self) -> u32 {
        self.nanos
    }

    /// `None` outside chrono's representable range.
    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.secs, self.nanos)
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Self {
            secs: dt.timestamp(),
            nanos: dt.timestamp_subsec_nanos(),
        }
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:09}", self.secs, self.nanos)
    }
}

impl fmt::Debug for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_datetime() {
            Some(dt) => write!(f, "Timestamp({})", dt.to_rfc3339()),
            None => write!(f, "Timestamp({})", self),
        }
    }
}

/// Failure to read a `"<secs>.<nanos>"` moment.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("malformed timestamp {0:?}")]
pub struct ParseTimestampError(String);

impl FromStr for Timestamp {
    type Err = ParseTimestampError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bad = || ParseTimestampError(s.to_string());
        let (secs, frac) = s.split_once('.').unwrap_or((s, "0"));
        if frac.is_empty() || frac.len() > 9 || !frac.bytes().all(|b| b.is_ascii_digit()) {
            return Err(bad());
        }
        let secs = secs.parse::<i64>().map_err(|_| bad())?;
        let scale = 10u32.pow(9 - frac.len() as u32);
        let nanos = frac.parse::<u32>().map_err(|_| bad())? * scale;
        Self::new(secs, nanos).ok_or_else(bad)
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_form_pads_nanos() {
        let ts = Timestamp::new(1_700_000_000, 250).unwrap();
        assert_eq!(ts.to_string(), "1700000000.000000250");
        assert_eq!(serde_json::to_string(&ts).unwrap(), "\"1700000000.000000250\"");
    }

    #[test]
    fn test_parse_short_fraction_and_whole_seconds() {
        assert_eq!("12.5".parse::<Timestamp>().unwrap(), Timestamp::new(12, 500_000_000).unwrap());
        assert_eq!("12".parse::<Timestamp>().unwrap(), Timestamp::new(12, 0).unwrap());
        assert!("12.".parse::<Timestamp>().is_err());
        assert!("12.1234567890".parse::<Timestamp>().is_err());
        assert!("x.1".parse::<Timestamp>().is_err());
    }

    #[test]
    fn test_now_survives_json() {
        let ts = Timestamp::now();
        let back: Timestamp = serde_json::from_str(&serde_json::to_string(&ts).unwrap()).unwrap();
        assert_eq!(ts, back);
        assert!(ts.to_datetime().is_some());
    }

    #[test]
    fn test_out_of_range_nanos() {
        assert!(Timestamp::new(0, 1_000_000_000).is_none());
    }
}
