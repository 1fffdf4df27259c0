//! Sign-in accounts held by the local identity provider.

use serde::{Deserialize, Serialize};

use super::lenient;
use super::timestamp::Timestamp;

/// Sign-in account held by the local identity provider
/// (includes password_hash: never serialize to API).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AuthAccount {
    pub uid: String,
    pub email: String,
    pub password_hash: String,
    #[serde(deserialize_with = "lenient::flag")]
    pub disabled: bool,
    #[serde(deserialize_with = "lenient::integer")]
    pub failed_login_attempts: i64,
    pub locked_until: Timestamp,
    pub last_login: Timestamp,
    pub created_at: Timestamp,
}

/// Public view of an identity account.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct IdentityUser {
    pub uid: String,
    pub email: Option<String>,
    pub disabled: bool,
}

impl From<AuthAccount> for IdentityUser {
    fn from(account: AuthAccount) -> Self {
        Self {
            uid: account.uid,
            email: Some(account.email).filter(|e| !e.is_empty()),
            disabled: account.disabled,
        }
    }
}
