//! Lenient timestamp handling for document date fields.
//!
//! Dates arrive either as ISO-8601 strings or as provider timestamp objects
//! (`{_seconds, _nanoseconds}` or `{seconds, nanoseconds}`). Both normalize to
//! the same UTC instant; unrecognised shapes are treated as absent.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

/// An optional instant read from a document field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(Option<DateTime<Utc>>);

impl Timestamp {
    pub fn new(at: DateTime<Utc>) -> Self {
        Self(Some(at))
    }

    pub fn absent() -> Self {
        Self(None)
    }

    pub fn get(&self) -> Option<DateTime<Utc>> {
        self.0
    }

    pub fn is_absent(&self) -> bool {
        self.0.is_none()
    }

    /// Parse any supported representation, yielding an absent timestamp for
    /// anything unrecognised.
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::String(s) => Self(parse_iso(s)),
            Value::Number(n) => Self(n.as_i64().and_then(|ms| Utc.timestamp_millis_opt(ms).single())),
            Value::Object(map) => Self(parse_provider_shape(map)),
            _ => Self(None),
        }
    }

    /// ISO-8601 string with millisecond precision, or empty when absent.
    pub fn to_iso(&self) -> String {
        self.0.map(iso_string).unwrap_or_default()
    }

    /// `YYYY-MM` bucket of the instant.
    pub fn month_key(&self) -> Option<String> {
        self.0.map(|at| month_key(&at))
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(at: DateTime<Utc>) -> Self {
        Self::new(at)
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(Self::from_value(&value))
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.0 {
            Some(at) => serializer.serialize_str(&iso_string(at)),
            None => serializer.serialize_none(),
        }
    }
}

/// `YYYY-MM` month key for a UTC instant.
pub fn month_key(at: &DateTime<Utc>) -> String {
    at.format("%Y-%m").to_string()
}

/// Format an instant the way the platform stores dates (`...T..:..:..sssZ`).
pub fn iso_string(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn parse_iso(raw: &str) -> Option<DateTime<Utc>> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

fn parse_provider_shape(map: &Map<String, Value>) -> Option<DateTime<Utc>> {
    let seconds = map
        .get("_seconds")
        .or_else(|| map.get("seconds"))
        .and_then(Value::as_i64)?;
    let nanos = map
        .get("_nanoseconds")
        .or_else(|| map.get("nanoseconds"))
        .and_then(Value::as_u64)
        .unwrap_or(0);
    let nanos = u32::try_from(nanos).ok().filter(|n| *n < 1_000_000_000)?;
    Utc.timestamp_opt(seconds, nanos).single()
}

fn is_provider_shape(map: &Map<String, Value>) -> bool {
    let underscored = map.contains_key("_seconds") && map.contains_key("_nanoseconds");
    let plain = map.len() == 2 && map.contains_key("seconds") && map.contains_key("nanoseconds");
    underscored || plain
}

/// Recursively rewrite provider timestamp objects into ISO strings so a
/// document can be returned to clients as plain JSON.
pub fn normalize_document(value: Value) -> Value {
    match value {
        Value::Object(map) if is_provider_shape(&map) => match parse_provider_shape(&map) {
            Some(at) => Value::String(iso_string(at)),
            None => Value::Null,
        },
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(k, v)| (k, normalize_document(v)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(normalize_document).collect()),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn provider_shape_and_iso_agree_on_month() {
        let provider = Timestamp::from_value(&json!({ "_seconds": 1_700_000_000, "_nanoseconds": 0 }));
        let iso = Timestamp::from_value(&json!("2023-11-14T22:13:20.000Z"));
        assert_eq!(provider, iso);
        assert_eq!(provider.month_key().as_deref(), Some("2023-11"));
        assert_eq!(provider.month_key(), iso.month_key());
    }

    #[test]
    fn plain_seconds_shape_is_accepted() {
        let ts = Timestamp::from_value(&json!({ "seconds": 1_700_000_000, "nanoseconds": 5 }));
        assert_eq!(ts.get().unwrap().timestamp(), 1_700_000_000);
    }

    #[test]
    fn date_only_strings_are_midnight_utc() {
        let ts = Timestamp::from_value(&json!("2024-03-09"));
        assert_eq!(ts.to_iso(), "2024-03-09T00:00:00.000Z");
    }

    #[test]
    fn malformed_values_are_absent() {
        for value in [json!(""), json!("not a date"), json!(true), json!(null), json!({ "x": 1 })] {
            assert!(Timestamp::from_value(&value).is_absent(), "{value}");
        }
    }

    #[test]
    fn deserializing_never_fails() {
        #[derive(Deserialize)]
        struct Row {
            #[serde(default)]
            at: Timestamp,
        }
        let row: Row = serde_json::from_value(json!({ "at": [1, 2, 3] })).unwrap();
        assert!(row.at.is_absent());
        let row: Row = serde_json::from_value(json!({})).unwrap();
        assert!(row.at.is_absent());
    }

    #[test]
    fn normalize_rewrites_nested_timestamps() {
        let doc = json!({
            "name": "Asha",
            "createdAt": { "_seconds": 1_700_000_000, "_nanoseconds": 0 },
            "reviews": [{ "date": { "_seconds": 0, "_nanoseconds": 0 } }],
            "stats": { "seconds": 3, "views": 9 }
        });
        let normalized = normalize_document(doc);
        assert_eq!(normalized["createdAt"], "2023-11-14T22:13:20.000Z");
        assert_eq!(normalized["reviews"][0]["date"], "1970-01-01T00:00:00.000Z");
        assert_eq!(normalized["stats"]["seconds"], 3);
    }

    #[test]
    fn serializes_as_iso_or_null() {
        let ts = Timestamp::from_value(&json!("2024-01-02T03:04:05Z"));
        assert_eq!(serde_json::to_value(ts).unwrap(), json!("2024-01-02T03:04:05.000Z"));
        assert_eq!(serde_json::to_value(Timestamp::absent()).unwrap(), Value::Null);
    }
}
