//! # Temporal Types
//!
//! UTC-only timestamp recorded as `last_reconciled` in the manifest and as
//! `ts` on policy log events. Always serialized with second precision and a
//! `Z` suffix, e.g. `2025-11-09T00:00:00Z`.

use chrono::{DateTime, SecondsFormat, Utc};

/// A UTC timestamp with second-level precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// The current UTC time.
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Seconds since the Unix epoch, as used by `SOURCE_DATE_EPOCH`.
    pub fn from_unix_seconds(secs: i64) -> Option<Self> {
        DateTime::from_timestamp(secs, 0).map(Self)
    }

    /// Parse an RFC 3339 timestamp; any offset is converted to UTC.
    pub fn parse(s: &str) -> Result<Self, chrono::ParseError> {
        DateTime::parse_from_rfc3339(s).map(|dt| Self(dt.with_timezone(&Utc)))
    }

    /// ISO 8601 with `Z` suffix, truncated to seconds.
    pub fn to_canonical_string(&self) -> String {
        self.0.to_rfc3339_opts(SecondsFormat::Secs, true)
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_canonical_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_string_truncates_to_seconds() {
        let ts = Timestamp::parse("2025-11-09T00:00:00.987Z").unwrap();
        assert_eq!(ts.to_canonical_string(), "2025-11-09T00:00:00Z");
    }

    #[test]
    fn offsets_are_normalized_to_utc() {
        let ts = Timestamp::parse("2025-11-09T02:30:00+02:00").unwrap();
        assert_eq!(ts.to_string(), "2025-11-09T00:30:00Z");
    }

    #[test]
    fn from_unix_seconds() {
        let ts = Timestamp::from_unix_seconds(1_762_646_400).unwrap();
        assert_eq!(ts.to_string(), "2025-11-09T00:00:00Z");
    }

    #[test]
    fn rejects_garbage() {
        assert!(Timestamp::parse("yesterday").is_err());
    }
}
