//! Platform user (client) profile.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::lenient;
use super::timestamp::Timestamp;

/// User profile document. Fields the admin API does not interpret are kept
/// in `extra` and returned unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserProfile {
    #[serde(deserialize_with = "lenient::id")]
    pub user_id: String,
    #[serde(deserialize_with = "lenient::string")]
    pub first_name: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    pub last_name: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    pub email: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    pub phone: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    pub city: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    pub state: Option<String>,
    #[serde(deserialize_with = "lenient::flag")]
    pub onboarding_completed: bool,
    /// Sign-in disabled at the identity provider.
    #[serde(deserialize_with = "lenient::flag")]
    pub is_disabled: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl UserProfile {
    /// "First Last", trimmed; empty when neither part is present.
    pub fn full_name(&self) -> String {
        format!(
            "{} {}",
            self.first_name.as_deref().unwrap_or(""),
            self.last_name.as_deref().unwrap_or("")
        )
        .trim()
        .to_string()
    }

    pub fn matches(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        self.full_name().to_lowercase().contains(&needle)
            || self
                .email
                .as_deref()
                .is_some_and(|e| e.to_lowercase().contains(&needle))
    }
}

/// Profile fields an administrator may edit.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUser {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub onboarding_completed: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn full_name_is_trimmed() {
        let user = UserProfile {
            first_name: Some("Asha".to_string()),
            ..Default::default()
        };
        assert_eq!(user.full_name(), "Asha");
        assert_eq!(UserProfile::default().full_name(), "");
    }

    #[test]
    fn unknown_fields_round_trip_through_extra() {
        let user: UserProfile = serde_json::from_value(json!({
            "userId": "u1",
            "firstName": "Asha",
            "pronouns": "she/her",
            "onboardingCompleted": true
        }))
        .unwrap();
        assert!(user.onboarding_completed);
        assert_eq!(user.extra["pronouns"], "she/her");

        let out = serde_json::to_value(&user).unwrap();
        assert_eq!(out["pronouns"], "she/her");
        assert_eq!(out["userId"], "u1");
    }

    #[test]
    fn search_matches_name_and_email() {
        let user = UserProfile {
            first_name: Some("Asha".to_string()),
            last_name: Some("Menon".to_string()),
            email: Some("asha@example.com".to_string()),
            ..Default::default()
        };
        assert!(user.matches("menon"));
        assert!(user.matches("EXAMPLE"));
        assert!(!user.matches("rahul"));
    }

    #[test]
    fn update_skips_unset_fields() {
        let patch = UpdateUser {
            phone: Some("+91 99999".to_string()),
            ..Default::default()
        };
        let value = serde_json::to_value(patch).unwrap();
        assert_eq!(value, json!({ "phone": "+91 99999" }));
    }
}
