use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Event time in milliseconds since epoch.
pub type EventTime = i64;

/// Minimum possible event time. Used as the initial "no watermark" sentinel.
pub const EVENT_TIME_MIN: EventTime = i64::MIN;

/// Maximum possible event time. Used to represent no upper bound.
pub const EVENT_TIME_MAX: EventTime = i64::MAX;

/// A scalar payload value carried in event fields and dimension attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl FieldValue {
    /// Numeric view of the value. Strings are parsed, so `"21.5"` counts.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Int(v) => Some(*v as f64),
            FieldValue::Float(v) => Some(*v),
            FieldValue::Str(s) => s.trim().parse().ok(),
            FieldValue::Null | FieldValue::Bool(_) => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }
}

impl std::fmt::Display for FieldValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldValue::Null => f.write_str("null"),
            FieldValue::Bool(v) => write!(f, "{v}"),
            FieldValue::Int(v) => write!(f, "{v}"),
            FieldValue::Float(v) => write!(f, "{v}"),
            FieldValue::Str(s) => f.write_str(s),
        }
    }
}

impl From<serde_json::Value> for FieldValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => FieldValue::Null,
            serde_json::Value::Bool(b) => FieldValue::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => FieldValue::Int(i),
                None => FieldValue::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => FieldValue::Str(s),
            // Nested payloads are kept as their JSON text.
            other => FieldValue::Str(other.to_string()),
        }
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        FieldValue::Int(v)
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        FieldValue::Float(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        FieldValue::Str(v.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        FieldValue::Str(v)
    }
}

/// Named payload fields of an event or dimension record.
pub type Fields = BTreeMap<String, FieldValue>;

/// Event timestamp as delivered by the transport, before validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RawTimestamp {
    Millis(i64),
    Text(String),
}

/// An event exactly as the source adapter translated it.
///
/// Nothing here is validated yet; the engine turns it into an [`Event`] or
/// rejects it as malformed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawEvent {
    pub key: Option<String>,
    pub timestamp: Option<RawTimestamp>,
    pub fields: Fields,
}

impl RawEvent {
    /// Build a well-formed raw event with a millisecond timestamp.
    pub fn new(key: impl Into<String>, timestamp: EventTime) -> Self {
        Self {
            key: Some(key.into()),
            timestamp: Some(RawTimestamp::Millis(timestamp)),
            fields: Fields::new(),
        }
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }
}

/// A validated, immutable stream event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub key: String,
    pub timestamp: EventTime,
    pub fields: Fields,
}

impl Event {
    pub fn new(key: impl Into<String>, timestamp: EventTime) -> Self {
        Self {
            key: key.into(),
            timestamp,
            fields: Fields::new(),
        }
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }
}

/// Watermark indicates that no on-time elements with timestamp below this value will arrive.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub struct Watermark {
    pub timestamp: EventTime,
}

impl Watermark {
    /// Create a new watermark at the given timestamp.
    pub fn new(timestamp: EventTime) -> Self {
        Self { timestamp }
    }

    /// The "nothing observed yet" watermark.
    pub fn min() -> Self {
        Self::new(EVENT_TIME_MIN)
    }
}

impl std::fmt::Display for Watermark {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Watermark({}ms)", self.timestamp)
    }
}

/// One finalized `(window, group_key)` aggregate handed to the sink.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalizedWindow {
    pub window_start: EventTime,
    pub window_end: EventTime,
    pub group_key: String,
    pub mean: f64,
    pub sample_count: u64,
}

impl std::fmt::Display for FinalizedWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{}, {}) {} mean={:.3} n={}",
            self.window_start, self.window_end, self.group_key, self.mean, self.sample_count
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_value_as_f64() {
        assert_eq!(FieldValue::Int(20).as_f64(), Some(20.0));
        assert_eq!(FieldValue::Float(2.5).as_f64(), Some(2.5));
        assert_eq!(FieldValue::from(" 21.5 ").as_f64(), Some(21.5));
        assert_eq!(FieldValue::from("warm").as_f64(), None);
        assert_eq!(FieldValue::Null.as_f64(), None);
        assert_eq!(FieldValue::Bool(true).as_f64(), None);
    }

    #[test]
    fn test_field_value_from_json() {
        assert_eq!(FieldValue::from(serde_json::json!(7)), FieldValue::Int(7));
        assert_eq!(FieldValue::from(serde_json::json!(7.5)), FieldValue::Float(7.5));
        assert_eq!(
            FieldValue::from(serde_json::json!("Italy")),
            FieldValue::Str("Italy".to_string())
        );
        assert_eq!(FieldValue::from(serde_json::Value::Null), FieldValue::Null);
        assert_eq!(
            FieldValue::from(serde_json::json!([1, 2])),
            FieldValue::Str("[1,2]".to_string())
        );
    }

    #[test]
    fn test_field_value_untagged_serde() {
        let fields: Fields =
            serde_json::from_str(r#"{"a":1,"b":2.5,"c":"x","d":null,"e":true}"#).unwrap();
        assert_eq!(fields["a"], FieldValue::Int(1));
        assert_eq!(fields["b"], FieldValue::Float(2.5));
        assert_eq!(fields["c"], FieldValue::Str("x".to_string()));
        assert_eq!(fields["d"], FieldValue::Null);
        assert_eq!(fields["e"], FieldValue::Bool(true));
    }

    #[test]
    fn test_event_builder() {
        let ev = Event::new("1001", 3_000).with_field("temperature", 21i64);
        assert_eq!(ev.key, "1001");
        assert_eq!(ev.field("temperature"), Some(&FieldValue::Int(21)));
        assert_eq!(ev.field("missing"), None);
    }

    #[test]
    fn test_watermark_display_and_order() {
        assert_eq!(Watermark::new(42_000).to_string(), "Watermark(42000ms)");
        assert!(Watermark::min() < Watermark::new(0));
    }

    #[test]
    fn test_finalized_window_display() {
        let row = FinalizedWindow {
            window_start: 0,
            window_end: 3_000,
            group_key: "1001".to_string(),
            mean: 20.0,
            sample_count: 3,
        };
        assert_eq!(row.to_string(), "[0, 3000) 1001 mean=20.000 n=3");
    }
}
