//! Document models and DTOs for all domain entities.
//!
//! Records are decoded at the deserialization boundary with explicit defaults
//! so that services never deal with ad-hoc `field || fallback` logic.

pub mod admin;
pub mod booking;
pub mod order;
pub mod pagination;
pub mod product;
pub mod therapist;
pub mod timestamp;
pub mod user;

use serde::de::DeserializeOwned;

use crate::db::Document;
use timestamp::normalize_document;

/// Decode a document into `T` after normalizing provider timestamps.
///
/// Returns `None` (and logs) when the payload cannot be decoded at all.
pub fn decode_record<T: DeserializeOwned>(collection: &str, id_field: &str, doc: &Document) -> Option<T> {
    let normalized = Document::new(doc.id.clone(), normalize_document(doc.data.clone()));
    match normalized.decode(id_field) {
        Ok(record) => Some(record),
        Err(e) => {
            tracing::warn!(collection, id = %doc.id, error = %e, "Skipping malformed document");
            None
        }
    }
}

/// Treat empty strings the same as a missing value.
pub fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

/// Field deserializers that fall back to a default instead of failing the
/// whole record.
pub mod lenient {
    use serde::de::DeserializeOwned;
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    /// Numbers or numeric strings; anything else is `0.0`.
    pub fn number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        Ok(as_number(&Value::deserialize(deserializer)?).unwrap_or(0.0))
    }

    /// Like [`number`] but keeps absence distinguishable.
    pub fn optional_number<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<f64>, D::Error> {
        Ok(as_number(&Value::deserialize(deserializer)?))
    }

    /// Integral counters; fractional values are truncated.
    pub fn integer<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
        Ok(as_number(&Value::deserialize(deserializer)?)
            .map(|n| n as i64)
            .unwrap_or(0))
    }

    /// Booleans; `null` and non-boolean values are `false`.
    pub fn flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
        Ok(matches!(Value::deserialize(deserializer)?, Value::Bool(true)))
    }

    /// Strings; numbers are stringified, everything else is absent.
    pub fn string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
        Ok(match Value::deserialize(deserializer)? {
            Value::String(s) => Some(s),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
    }

    /// Strings only; any other JSON type is absent.
    pub fn label<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
        Ok(match Value::deserialize(deserializer)? {
            Value::String(s) => Some(s),
            _ => None,
        })
    }

    /// Record ids; numbers are stringified, anything else is empty.
    pub fn id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
        Ok(string(deserializer)?.unwrap_or_default())
    }

    /// Arrays; elements that fail to decode are dropped, non-arrays are empty.
    pub fn list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: DeserializeOwned,
    {
        Ok(match Value::deserialize(deserializer)? {
            Value::Array(items) => items
                .into_iter()
                .filter_map(|item| serde_json::from_value(item).ok())
                .collect(),
            _ => Vec::new(),
        })
    }

    fn as_number(value: &Value) -> Option<f64> {
        match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}
