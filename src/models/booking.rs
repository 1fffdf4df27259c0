//! Booking model: a therapy session reserved by a user.

use serde::{Deserialize, Deserializer, Serialize};

use super::lenient;
use super::timestamp::Timestamp;

/// Booking lifecycle status.
///
/// Missing or empty values decode to `Unknown`; unrecognised labels are kept
/// verbatim in `Other` so breakdowns still show them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(into = "String")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Completed,
    Cancelled,
    Failed,
    Other(String),
    #[default]
    Unknown,
}

impl BookingStatus {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::Failed => "failed",
            Self::Other(label) => label,
            Self::Unknown => "unknown",
        }
    }

    /// Whether this is one of the statuses an administrator may set.
    pub fn is_assignable(&self) -> bool {
        !matches!(self, Self::Other(_) | Self::Unknown)
    }
}

impl From<Option<String>> for BookingStatus {
    fn from(raw: Option<String>) -> Self {
        match raw.as_deref() {
            None | Some("") => Self::Unknown,
            Some("pending") => Self::Pending,
            Some("confirmed") => Self::Confirmed,
            Some("completed") => Self::Completed,
            Some("cancelled") => Self::Cancelled,
            Some("failed") => Self::Failed,
            Some(other) => Self::Other(other.to_string()),
        }
    }
}

/// Non-string values decode to `Unknown` instead of failing the record.
impl<'de> Deserialize<'de> for BookingStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        lenient::label(deserializer).map(Self::from)
    }
}

impl From<BookingStatus> for String {
    fn from(status: BookingStatus) -> Self {
        status.as_str().to_string()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Booking {
    #[serde(deserialize_with = "lenient::id")]
    pub id: String,
    #[serde(deserialize_with = "lenient::string")]
    pub user_id: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    pub therapist_id: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    pub therapist_name: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    pub session_type: Option<String>,
    pub date: Timestamp,
    #[serde(deserialize_with = "lenient::string")]
    pub time_slot: Option<String>,
    #[serde(deserialize_with = "lenient::number")]
    pub amount: f64,
    #[serde(deserialize_with = "lenient::number")]
    pub discount: f64,
    #[serde(deserialize_with = "lenient::number")]
    pub tax_rate: f64,
    #[serde(deserialize_with = "lenient::string")]
    pub notes: Option<String>,
    pub status: BookingStatus,
    #[serde(deserialize_with = "lenient::string")]
    pub payment_id: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    pub order_id: Option<String>,
}

impl Booking {
    pub fn is_completed(&self) -> bool {
        self.status == BookingStatus::Completed
    }
}

/// Request body for an administrator status change.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateBookingStatus {
    pub status: BookingStatus,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn status_defaults_to_unknown() {
        let booking: Booking = serde_json::from_value(json!({ "id": "b1" })).unwrap();
        assert_eq!(booking.status, BookingStatus::Unknown);

        let booking: Booking =
            serde_json::from_value(json!({ "id": "b1", "status": null })).unwrap();
        assert_eq!(booking.status, BookingStatus::Unknown);

        let booking: Booking = serde_json::from_value(json!({ "id": "b1", "status": "" })).unwrap();
        assert_eq!(booking.status.as_str(), "unknown");
    }

    #[test]
    fn unrecognised_status_is_preserved() {
        let booking: Booking =
            serde_json::from_value(json!({ "id": "b1", "status": "refunded" })).unwrap();
        assert_eq!(booking.status, BookingStatus::Other("refunded".to_string()));
        assert!(!booking.status.is_assignable());
        assert_eq!(serde_json::to_value(&booking.status).unwrap(), json!("refunded"));
    }

    #[test]
    fn mistyped_status_keeps_the_record() {
        let booking: Booking = serde_json::from_value(json!({
            "id": "b1",
            "userId": "u1",
            "therapistName": "Dr. Rao",
            "status": 7
        }))
        .unwrap();
        assert_eq!(booking.status, BookingStatus::Unknown);
        assert_eq!(booking.user_id.as_deref(), Some("u1"));
        assert_eq!(booking.therapist_name.as_deref(), Some("Dr. Rao"));
    }

    #[test]
    fn decodes_camel_case_fields() {
        let booking: Booking = serde_json::from_value(json!({
            "id": "b1",
            "userId": "u1",
            "therapistName": "Dr. Rao",
            "sessionType": "Individual",
            "timeSlot": "10:00 AM",
            "amount": 1500,
            "status": "completed",
            "date": "2024-05-01T10:00:00.000Z"
        }))
        .unwrap();
        assert!(booking.is_completed());
        assert_eq!(booking.amount, 1500.0);
        assert_eq!(booking.user_id.as_deref(), Some("u1"));
        assert_eq!(booking.date.month_key().as_deref(), Some("2024-05"));
    }
}
