//! Lenient serde codecs
//!
//! The REST API is not trusted to send well-formed timestamps, durations or
//! display strings.
//! A malformed value deserializes to `None` instead of rejecting the whole
//! record, so one bad pass never poisons a snapshot.

use chrono::{DateTime, TimeZone, Utc};
use passpilot_util::{format_timestamp, parse_timestamp};
use serde::{Deserialize, Deserializer, Serializer};
use serde_json::Value;

/// `Option<DateTime<Utc>>` as an RFC 3339 string.
///
/// Accepts RFC 3339 strings and epoch milliseconds; anything else is `None`.
pub mod lenient_timestamp {
    use super::*;

    pub fn serialize<S>(value: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(dt) => serializer.serialize_str(&format_timestamp(dt)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<Value>::deserialize(deserializer)?;
        Ok(raw.and_then(|v| match v {
            Value::String(s) => parse_timestamp(&s),
            Value::Number(n) => n
                .as_i64()
                .and_then(|ms| Utc.timestamp_millis_opt(ms).single()),
            _ => None,
        }))
    }
}

/// `Option<i64>` minutes.
///
/// Accepts integers, floats (rounded) and numeric strings; anything else is `None`.
pub mod lenient_minutes {
    use super::*;

    pub fn serialize<S>(value: &Option<i64>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(m) => serializer.serialize_i64(*m),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<Value>::deserialize(deserializer)?;
        Ok(raw.and_then(|v| match v {
            Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.round() as i64)),
            Value::String(s) => s.trim().parse::<i64>().ok(),
            _ => None,
        }))
    }
}

/// `String` that tolerates `null` (empty) and scalars (stringified)
pub mod lenient_string {
    use super::*;

    pub fn serialize<S>(value: &str, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(value)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<Value>::deserialize(deserializer)?;
        Ok(lenient_text(raw).unwrap_or_default())
    }
}

/// Strings pass through, numbers and booleans are stringified, anything else is `None`
pub(crate) fn lenient_text(value: Option<Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
