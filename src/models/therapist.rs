//! Therapist model with its embedded review list.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::lenient;
use super::timestamp::Timestamp;

/// Review embedded in a therapist document.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Review {
    #[serde(deserialize_with = "lenient::string")]
    pub id: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    pub reviewer_name: Option<String>,
    #[serde(deserialize_with = "lenient::number")]
    pub rating: f64,
    #[serde(deserialize_with = "lenient::string")]
    pub comment: Option<String>,
    pub date: Timestamp,
    #[serde(deserialize_with = "lenient::flag")]
    pub is_verified: bool,
    #[serde(deserialize_with = "lenient::integer")]
    pub helpful_count: i64,
    #[serde(deserialize_with = "lenient::flag")]
    pub flagged: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Review {
    pub fn has_id(&self, review_id: &str) -> bool {
        self.id.as_deref() == Some(review_id)
    }
}

/// Therapist document. Onboarding details the admin API does not interpret
/// stay in `extra`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Therapist {
    #[serde(deserialize_with = "lenient::id")]
    pub id: String,
    #[serde(deserialize_with = "lenient::string")]
    pub name: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    pub email: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    pub phone: Option<String>,
    #[serde(deserialize_with = "lenient::flag")]
    pub verified: bool,
    #[serde(deserialize_with = "lenient::number")]
    pub ratings: f64,
    #[serde(deserialize_with = "lenient::integer")]
    pub reviews_count: i64,
    #[serde(deserialize_with = "lenient::number")]
    pub experience: f64,
    #[serde(deserialize_with = "lenient::list")]
    pub specializations: Vec<String>,
    #[serde(deserialize_with = "lenient::list")]
    pub reviews: Vec<Review>,
    #[serde(deserialize_with = "lenient::flag")]
    pub onboarding_completed: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Therapist {
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("")
    }

    pub fn matches(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        self.display_name().to_lowercase().contains(&needle)
            || self
                .email
                .as_deref()
                .is_some_and(|e| e.to_lowercase().contains(&needle))
            || self
                .specializations
                .iter()
                .any(|s| s.to_lowercase().contains(&needle))
    }
}

/// Therapist profile fields an administrator may edit.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTherapist {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub experience: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub specializations: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub individual_session_fee: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_session_fee: Option<f64>,
}

/// Review as listed on the moderation page, tagged with its therapist.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewListing {
    #[serde(flatten)]
    pub review: Review,
    pub therapist_id: String,
    pub therapist_name: String,
}

/// Body for posting a new review on a therapist.
#[derive(Debug, Clone, Deserialize, validator::Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateReview {
    #[validate(length(min = 1, max = 100, message = "Reviewer name is required"))]
    pub reviewer_name: String,
    #[validate(range(min = 1.0, max = 5.0, message = "Rating must be between 1 and 5"))]
    pub rating: f64,
    #[validate(length(max = 2000, message = "Comment is too long"))]
    #[serde(default)]
    pub comment: String,
    #[serde(default)]
    pub is_verified: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn malformed_reviews_are_dropped_not_fatal() {
        let therapist: Therapist = serde_json::from_value(json!({
            "id": "t1",
            "name": "Dr. Rao",
            "reviews": [{ "id": "r1", "rating": 5 }, "garbage"],
            "reviewsCount": 2
        }))
        .unwrap();
        assert_eq!(therapist.reviews.len(), 1);
        assert_eq!(therapist.reviews_count, 2);
    }

    #[test]
    fn matches_specializations() {
        let therapist = Therapist {
            name: Some("Dr. Rao".to_string()),
            specializations: vec!["Anxiety".to_string()],
            ..Default::default()
        };
        assert!(therapist.matches("anx"));
        assert!(therapist.matches("rao"));
        assert!(!therapist.matches("sleep"));
    }

    #[test]
    fn review_listing_flattens_review() {
        let listing = ReviewListing {
            review: Review {
                id: Some("r1".to_string()),
                rating: 4.0,
                ..Default::default()
            },
            therapist_id: "t1".to_string(),
            therapist_name: "Dr. Rao".to_string(),
        };
        let value = serde_json::to_value(listing).unwrap();
        assert_eq!(value["id"], "r1");
        assert_eq!(value["therapistId"], "t1");
        assert_eq!(value["flagged"], false);
    }
}
