//! Entry model and the persisted representation.
//!
//! Persisted format, one of two shapes:
//!
//! ```text
//! no expiration:   <value>
//! with expiration: {"value": <value>, "expiresAt": <epoch-ms>}
//! ```
//!
//! A value stored without expiration that itself looks like an envelope
//! (an object with exactly the keys `value` and `expiresAt`) is wrapped in
//! an envelope with `"expiresAt": null` so it reads back unchanged.

use std::time::Duration;

use gx_types::Timestamp;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{StoreError, StoreResult};

const VALUE_FIELD: &str = "value";
const EXPIRES_AT_FIELD: &str = "expiresAt";

/// When a written entry stops being readable.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Expiry {
    /// The entry lives until removed or overwritten.
    #[default]
    Never,
    /// Relative to the moment of the write.
    In(Duration),
    /// Absolute deadline.
    At(Timestamp),
}

impl Expiry {
    /// Build an expiry from a nullable millisecond count and a flag saying
    /// whether it is an absolute timestamp (`true`) or a duration (`false`).
    pub fn from_parts(expiration: Option<u64>, is_exact_time: bool) -> Self {
        match expiration {
            None => Self::Never,
            Some(ms) if is_exact_time => Self::At(Timestamp::from_millis(ms)),
            Some(ms) => Self::In(Duration::from_millis(ms)),
        }
    }

    /// Relative expiry of `ms` milliseconds.
    pub fn after_millis(ms: u64) -> Self {
        Self::In(Duration::from_millis(ms))
    }

    /// Absolute deadline for a write performed at `now`.
    pub fn resolve(&self, now: Timestamp) -> Option<Timestamp> {
        match self {
            Self::Never => None,
            Self::In(d) => Some(now.saturating_add(*d)),
            Self::At(t) => Some(*t),
        }
    }
}

/// A decoded entry as it sits in the backend.
#[derive(Clone, Debug, PartialEq)]
pub struct StoredEntry {
    pub value: Value,
    pub expires_at: Option<Timestamp>,
}

impl StoredEntry {
    pub fn new(value: Value, expires_at: Option<Timestamp>) -> Self {
        Self { value, expires_at }
    }

    /// Expired strictly after the deadline; an entry is still live at the
    /// exact millisecond it expires.
    pub fn is_expired(&self, now: Timestamp) -> bool {
        self.expires_at.is_some_and(|deadline| now.is_after(&deadline))
    }

    /// Render the persisted string for this entry.
    pub fn encode(&self) -> StoreResult<String> {
        let needs_envelope = self.expires_at.is_some() || looks_like_envelope(&self.value);
        let rendered = if needs_envelope {
            serde_json::to_string(&Envelope {
                value: &self.value,
                expires_at: self.expires_at,
            })
        } else {
            serde_json::to_string(&self.value)
        };
        rendered.map_err(|e| StoreError::Serialization(e.to_string()))
    }

    /// Parse a persisted string. Fails with [`StoreError::CorruptEntry`]
    /// when `raw` is not JSON.
    pub fn decode(key: &str, raw: &str) -> StoreResult<Self> {
        let parsed: Value = serde_json::from_str(raw).map_err(|e| StoreError::CorruptEntry {
            key: key.to_string(),
            reason: e.to_string(),
        })?;
        match parsed {
            Value::Object(map) if looks_like_envelope_map(&map) => Ok(split_envelope(map)),
            other => Ok(Self::new(other, None)),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Envelope<'a> {
    value: &'a Value,
    expires_at: Option<Timestamp>,
}

fn looks_like_envelope(value: &Value) -> bool {
    matches!(value, Value::Object(map) if looks_like_envelope_map(map))
}

fn looks_like_envelope_map(map: &Map<String, Value>) -> bool {
    map.len() == 2
        && map.contains_key(VALUE_FIELD)
        && matches!(
            map.get(EXPIRES_AT_FIELD),
            Some(Value::Null) | Some(Value::Number(_))
        )
}

fn split_envelope(mut map: Map<String, Value>) -> StoredEntry {
    let value = map.remove(VALUE_FIELD).unwrap_or(Value::Null);
    let expires_at = match map.remove(EXPIRES_AT_FIELD) {
        Some(Value::Number(n)) => Some(Timestamp::from_millis(
            n.as_u64()
                .or_else(|| n.as_f64().map(|f| f.max(0.0) as u64))
                .unwrap_or(0),
        )),
        _ => None,
    };
    StoredEntry::new(value, expires_at)
}

/// One element of a batch write.
#[derive(Clone, Debug, PartialEq)]
pub struct BatchItem<T> {
    pub key: String,
    pub value: T,
    pub expiry: Expiry,
}

impl<T> BatchItem<T> {
    /// An item that never expires.
    pub fn new(key: impl Into<String>, value: T) -> Self {
        Self {
            key: key.into(),
            value,
            expiry: Expiry::Never,
        }
    }

    pub fn with_expiry(mut self, expiry: Expiry) -> Self {
        self.expiry = expiry;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn from_parts_variants() {
        assert_eq!(Expiry::from_parts(None, false), Expiry::Never);
        assert_eq!(Expiry::from_parts(None, true), Expiry::Never);
        assert_eq!(
            Expiry::from_parts(Some(5000), false),
            Expiry::In(Duration::from_millis(5000))
        );
        assert_eq!(
            Expiry::from_parts(Some(5000), true),
            Expiry::At(Timestamp::from_millis(5000))
        );
    }

    #[test]
    fn resolve_relative_and_absolute() {
        let now = Timestamp::from_millis(1_000);
        assert_eq!(Expiry::Never.resolve(now), None);
        assert_eq!(
            Expiry::after_millis(500).resolve(now),
            Some(Timestamp::from_millis(1_500))
        );
        assert_eq!(
            Expiry::At(Timestamp::from_millis(42)).resolve(now),
            Some(Timestamp::from_millis(42))
        );
    }

    #[test]
    fn expiry_boundary_is_strict() {
        let entry = StoredEntry::new(json!(1), Some(Timestamp::from_millis(1_000)));
        assert!(!entry.is_expired(Timestamp::from_millis(999)));
        assert!(!entry.is_expired(Timestamp::from_millis(1_000)));
        assert!(entry.is_expired(Timestamp::from_millis(1_001)));
    }

    #[test]
    fn never_expiring_entry_is_never_expired() {
        let entry = StoredEntry::new(json!("x"), None);
        assert!(!entry.is_expired(Timestamp::from_millis(u64::MAX)));
    }

    #[test]
    fn encode_without_expiry_is_raw() {
        let entry = StoredEntry::new(json!({"id": 1}), None);
        assert_eq!(entry.encode().unwrap(), r#"{"id":1}"#);
    }

    #[test]
    fn encode_with_expiry_is_envelope() {
        let entry = StoredEntry::new(json!({"id": 1}), Some(Timestamp::from_millis(5000)));
        assert_eq!(
            entry.encode().unwrap(),
            r#"{"value":{"id":1},"expiresAt":5000}"#
        );
    }

    #[test]
    fn decode_raw_and_envelope() {
        let raw = StoredEntry::decode("k", "[1,2]").unwrap();
        assert_eq!(raw, StoredEntry::new(json!([1, 2]), None));

        let env = StoredEntry::decode("k", r#"{"value":"v","expiresAt":7}"#).unwrap();
        assert_eq!(env, StoredEntry::new(json!("v"), Some(Timestamp::from_millis(7))));
    }

    #[test]
    fn decode_null_expiry_envelope() {
        let env = StoredEntry::decode("k", r#"{"value":3,"expiresAt":null}"#).unwrap();
        assert_eq!(env, StoredEntry::new(json!(3), None));
    }

    #[test]
    fn envelope_shaped_value_survives_without_expiry() {
        let tricky = json!({"value": "inner", "expiresAt": 1});
        let entry = StoredEntry::new(tricky.clone(), None);
        let encoded = entry.encode().unwrap();
        let decoded = StoredEntry::decode("k", &encoded).unwrap();
        assert_eq!(decoded.value, tricky);
        assert_eq!(decoded.expires_at, None);
    }

    #[test]
    fn objects_with_extra_fields_are_raw() {
        let raw = r#"{"value":1,"expiresAt":2,"other":3}"#;
        let decoded = StoredEntry::decode("k", raw).unwrap();
        assert_eq!(decoded.expires_at, None);
        assert_eq!(decoded.value, json!({"value": 1, "expiresAt": 2, "other": 3}));
    }

    #[test]
    fn fractional_deadline_is_truncated() {
        let decoded = StoredEntry::decode("k", r#"{"value":1,"expiresAt":1500.7}"#).unwrap();
        assert_eq!(decoded.expires_at, Some(Timestamp::from_millis(1500)));
    }

    #[test]
    fn decode_garbage_is_corrupt() {
        let err = StoredEntry::decode("bad", "{not json").unwrap_err();
        assert!(matches!(err, StoreError::CorruptEntry { ref key, .. } if key == "bad"));
    }

    #[test]
    fn batch_item_builder() {
        let item = BatchItem::new("k", 5).with_expiry(Expiry::after_millis(10));
        assert_eq!(item.key, "k");
        assert_eq!(item.value, 5);
        assert_eq!(item.expiry, Expiry::after_millis(10));
    }
}
