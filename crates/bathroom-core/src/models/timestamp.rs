//! `lastConfirmed` values arrive as a native instant, as ISO-8601 text, or as
//! an epoch-seconds wrapper object written by the document store. Each shape
//! is kept as its own variant and only turned into an instant by [`Timestamp::parse`].

use chrono::{DateTime, SecondsFormat, Utc};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::error::TimestampError;

const NANOS_PER_SECOND: i64 = 1_000_000_000;

#[derive(Debug, Clone, PartialEq, Default)]
pub enum Timestamp {
    /// Instant produced in-process
    Native(DateTime<Utc>),
    /// ISO-8601 / RFC 3339 text
    Iso(String),
    /// Document-store wrapper object (`{"seconds": .., "nanoseconds": ..}`)
    EpochSeconds { seconds: i64, nanoseconds: i64 },
    #[default]
    Missing,
    /// Anything else that was found in the field
    Unsupported(Value),
}

impl Timestamp {
    /// Resolve to an instant
    pub fn parse(&self) -> Result<DateTime<Utc>, TimestampError> {
        match self {
            Timestamp::Native(instant) => Ok(*instant),
            Timestamp::Iso(text) => DateTime::parse_from_rfc3339(text.trim())
                .map(|t| t.with_timezone(&Utc))
                .map_err(|_| TimestampError::InvalidIso(text.clone())),
            Timestamp::EpochSeconds { seconds, nanoseconds } => {
                if !(0..NANOS_PER_SECOND).contains(nanoseconds) {
                    return Err(TimestampError::OutOfRange);
                }
                DateTime::from_timestamp(*seconds, *nanoseconds as u32)
                    .ok_or(TimestampError::OutOfRange)
            }
            Timestamp::Missing => Err(TimestampError::Missing),
            Timestamp::Unsupported(_) => Err(TimestampError::UnsupportedShape),
        }
    }

    /// Classify an arbitrary JSON value; never fails
    pub fn from_json(value: Value) -> Self {
        match value {
            Value::Null => Timestamp::Missing,
            Value::String(text) => Timestamp::Iso(text),
            Value::Object(map) => {
                let seconds =
                    map.get("seconds").or_else(|| map.get("_seconds")).and_then(Value::as_i64);
                let nanoseconds = match map.get("nanoseconds").or_else(|| map.get("_nanoseconds")) {
                    Some(nanos) => nanos.as_i64(),
                    None => Some(0),
                };
                match (seconds, nanoseconds) {
                    (Some(seconds), Some(nanoseconds)) => {
                        Timestamp::EpochSeconds { seconds, nanoseconds }
                    }
                    _ => Timestamp::Unsupported(Value::Object(map)),
                }
            }
            other => Timestamp::Unsupported(other),
        }
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(instant: DateTime<Utc>) -> Self {
        Timestamp::Native(instant)
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Timestamp::Native(instant) => {
                serializer.serialize_str(&instant.to_rfc3339_opts(SecondsFormat::Millis, true))
            }
            Timestamp::Iso(text) => serializer.serialize_str(text),
            Timestamp::EpochSeconds { seconds, nanoseconds } => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("seconds", seconds)?;
                map.serialize_entry("nanoseconds", nanoseconds)?;
                map.end()
            }
            Timestamp::Missing => serializer.serialize_none(),
            Timestamp::Unsupported(value) => value.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(Timestamp::from_json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_parse_native() {
        let instant = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap();
        assert_eq!(Timestamp::Native(instant).parse().unwrap(), instant);
    }

    #[test]
    fn test_parse_iso_with_offset() {
        let ts = Timestamp::Iso("2024-05-01T12:00:00+02:00".to_string());
        assert_eq!(ts.parse().unwrap(), Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap());
    }

    #[test]
    fn test_parse_epoch_wrapper() {
        let ts = Timestamp::from_json(json!({ "seconds": 1_714_557_600, "nanoseconds": 500 }));
        let instant = ts.parse().unwrap();
        assert_eq!(instant.timestamp(), 1_714_557_600);
        assert_eq!(instant.timestamp_subsec_nanos(), 500);
    }

    #[test]
    fn test_parse_underscored_epoch_wrapper() {
        let ts = Timestamp::from_json(json!({ "_seconds": 10, "_nanoseconds": 0 }));
        assert_eq!(ts, Timestamp::EpochSeconds { seconds: 10, nanoseconds: 0 });
    }

    #[test]
    fn test_parse_failures_are_typed() {
        assert_eq!(Timestamp::Missing.parse(), Err(TimestampError::Missing));
        assert_eq!(
            Timestamp::Iso("yesterday".to_string()).parse(),
            Err(TimestampError::InvalidIso("yesterday".to_string()))
        );
        assert_eq!(
            Timestamp::EpochSeconds { seconds: 0, nanoseconds: -1 }.parse(),
            Err(TimestampError::OutOfRange)
        );
        assert_eq!(
            Timestamp::EpochSeconds { seconds: i64::MAX, nanoseconds: 0 }.parse(),
            Err(TimestampError::OutOfRange)
        );
        assert_eq!(
            Timestamp::from_json(json!(42)).parse(),
            Err(TimestampError::UnsupportedShape)
        );
        assert_eq!(
            Timestamp::from_json(json!({ "when": "now" })).parse(),
            Err(TimestampError::UnsupportedShape)
        );
    }

    #[test]
    fn test_serialized_native_reads_back_as_iso() {
        let instant = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap();
        let text = serde_json::to_string(&Timestamp::Native(instant)).unwrap();
        let back: Timestamp = serde_json::from_str(&text).unwrap();

        assert!(matches!(back, Timestamp::Iso(_)));
        assert_eq!(back.parse().unwrap(), instant);
    }

    #[test]
    fn test_null_and_missing() {
        let ts: Timestamp = serde_json::from_str("null").unwrap();
        assert_eq!(ts, Timestamp::Missing);
        assert_eq!(serde_json::to_string(&Timestamp::Missing).unwrap(), "null");
    }
}
