// Schema-tolerant decoding. Every lookup defaults instead of failing, so a drifting
// Nexus payload degrades to zeros/empty names rather than aborting the cycle.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Best-effort number: floats as-is, integers widened, numeric strings parsed.
/// Anything else (null, bool, object, unparsable or non-finite string) is 0.
pub fn coerce_f64(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|f| f.is_finite())
            .unwrap_or(0.0),
        _ => 0.0,
    }
}

/// RFC 3339 timestamp (Nexus emits e.g. `2024-01-02T03:04:05.678+00:00`).
pub fn coerce_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => DateTime::parse_from_rfc3339(s.trim())
            .ok()
            .map(|dt| dt.with_timezone(&Utc)),
        _ => None,
    }
}

/// Decodes each element on its own; an element of the wrong shape becomes `T::default()`.
pub fn lenient_items<T>(values: Vec<Value>) -> Vec<T>
where
    T: DeserializeOwned + Default,
{
    values
        .into_iter()
        .map(|v| T::deserialize(v).unwrap_or_default())
        .collect()
}

pub(crate) fn lenient_f64<'de, D>(d: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(coerce_f64(&Value::deserialize(d)?))
}

pub(crate) fn lenient_string<'de, D>(d: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(d)? {
        Value::String(s) => Ok(s),
        _ => Ok(String::new()),
    }
}

/// Absent, null, non-string and empty tokens all mean "last page".
pub(crate) fn lenient_token<'de, D>(d: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(d)? {
        Value::String(s) if !s.is_empty() => Ok(Some(s)),
        _ => Ok(None),
    }
}

pub(crate) fn lenient_seq<'de, D, T>(d: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    match Value::deserialize(d)? {
        Value::Array(values) => Ok(lenient_items(values)),
        _ => Ok(Vec::new()),
    }
}
