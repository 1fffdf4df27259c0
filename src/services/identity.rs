//! Identity provider: sign-in accounts, id tokens, session cookies and
//! password-reset links.

use std::sync::Arc;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::db::{collections, new_document_id, DocumentStore};
use crate::errors::AppError;
use crate::models::admin::{AuthAccount, IdentityUser};
use crate::models::decode_record;
use crate::models::timestamp::iso_string;

/// Maximum failed sign-in attempts before the account is locked.
const MAX_FAILED_ATTEMPTS: i64 = 3;

/// Lockout duration in minutes after exceeding max failed attempts.
const LOCKOUT_DURATION_MINUTES: i64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    Id,
    Session,
    PasswordReset,
}

/// JWT claims shared by every token the provider issues.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    pub sub: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub kind: TokenKind,
    pub exp: i64,
    pub iat: i64,
}

impl TokenClaims {
    pub fn uid(&self) -> &str {
        &self.sub
    }
}

/// Operations the admin API needs from an identity provider.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Password sign-in; returns a short-lived id token.
    async fn sign_in(&self, email: &str, password: &str) -> Result<String, AppError>;

    async fn verify_id_token(&self, id_token: &str) -> Result<TokenClaims, AppError>;

    /// Exchange a valid id token for a session cookie value.
    async fn create_session_cookie(
        &self,
        id_token: &str,
        expires_in_secs: i64,
    ) -> Result<String, AppError>;

    /// Verify a session cookie and check the account is still enabled.
    async fn verify_session_cookie(&self, cookie: &str) -> Result<TokenClaims, AppError>;

    async fn get_user(&self, uid: &str) -> Result<Option<IdentityUser>, AppError>;

    /// Enable or disable sign-in for `uid`.
    async fn set_disabled(&self, uid: &str, disabled: bool) -> Result<(), AppError>;

    async fn generate_password_reset_link(&self, email: &str) -> Result<String, AppError>;
}

/// Hash a plaintext password with argon2id.
pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| AppError::Internal(format!("Password hashing failed: {e}")))
}

/// Verify a plaintext password against a stored hash.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, AppError> {
    let parsed_hash =
        PasswordHash::new(hash).map_err(|e| AppError::Internal(format!("Invalid hash: {e}")))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

/// Sign a token of `kind` for `uid`.
pub fn issue_token(
    uid: &str,
    email: Option<&str>,
    kind: TokenKind,
    expiry_secs: i64,
    secret: &str,
) -> Result<String, AppError> {
    let now = Utc::now();
    let claims = TokenClaims {
        sub: uid.to_string(),
        email: email.map(str::to_string),
        kind,
        exp: (now + Duration::seconds(expiry_secs)).timestamp(),
        iat: now.timestamp(),
    };
    jsonwebtoken::encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(format!("Token generation failed: {e}")))
}

/// Validate a token signature, expiry and kind.
pub fn validate_token(token: &str, secret: &str, kind: TokenKind) -> Result<TokenClaims, AppError> {
    let claims = jsonwebtoken::decode::<TokenClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| AppError::Unauthorized)?;

    if claims.kind != kind {
        return Err(AppError::Unauthorized);
    }
    Ok(claims)
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Identity provider backed by the `auth_accounts` collection.
#[derive(Clone)]
pub struct LocalIdentityProvider {
    store: Arc<dyn DocumentStore>,
    secret: String,
    id_token_expiry_secs: i64,
    password_reset_expiry_secs: i64,
    app_url: String,
}

impl LocalIdentityProvider {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        secret: impl Into<String>,
        id_token_expiry_secs: i64,
        password_reset_expiry_secs: i64,
        app_url: impl Into<String>,
    ) -> Self {
        Self {
            store,
            secret: secret.into(),
            id_token_expiry_secs,
            password_reset_expiry_secs,
            app_url: app_url.into(),
        }
    }

    /// Register a sign-in account. `uid` defaults to a fresh id.
    pub async fn create_account(
        &self,
        uid: Option<&str>,
        email: &str,
        password: &str,
    ) -> Result<IdentityUser, AppError> {
        let email = normalize_email(email);
        if self.find_by_email(&email).await?.is_some() {
            return Err(AppError::Conflict("Email already registered".to_string()));
        }

        let uid = uid.map(str::to_string).unwrap_or_else(new_document_id);
        let account = AuthAccount {
            uid: uid.clone(),
            email,
            password_hash: hash_password(password)?,
            created_at: Utc::now().into(),
            ..Default::default()
        };
        let data = serde_json::to_value(&account)
            .map_err(|e| AppError::Internal(format!("Account encoding failed: {e}")))?;
        self.store.put(collections::AUTH_ACCOUNTS, &uid, data).await?;

        tracing::info!(uid = %uid, "Created identity account");
        Ok(account.into())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<AuthAccount>, AppError> {
        let docs = self
            .store
            .list_where(collections::AUTH_ACCOUNTS, "email", &json!(email))
            .await?;
        Ok(docs
            .iter()
            .find_map(|doc| decode_record(collections::AUTH_ACCOUNTS, "uid", doc)))
    }

    async fn find_by_uid(&self, uid: &str) -> Result<Option<AuthAccount>, AppError> {
        Ok(self
            .store
            .get_by_id(collections::AUTH_ACCOUNTS, uid)
            .await?
            .and_then(|doc| decode_record(collections::AUTH_ACCOUNTS, "uid", &doc)))
    }

    async fn update_account(&self, uid: &str, fields: Map<String, Value>) -> Result<(), AppError> {
        self.store
            .merge(collections::AUTH_ACCOUNTS, uid, fields)
            .await
            .map(|_| ())
    }
}

#[async_trait]
impl IdentityProvider for LocalIdentityProvider {
    async fn sign_in(&self, email: &str, password: &str) -> Result<String, AppError> {
        let account = self
            .find_by_email(&normalize_email(email))
            .await?
            .ok_or(AppError::Unauthorized)?;

        let now = Utc::now();

        // Check account lockout
        if account.locked_until.get().is_some_and(|until| until > now) {
            return Err(AppError::Unauthorized);
        }

        if account.disabled {
            return Err(AppError::Unauthorized);
        }

        if !verify_password(password, &account.password_hash)? {
            let attempts = account.failed_login_attempts + 1;
            let mut fields = Map::new();
            fields.insert("failedLoginAttempts".into(), json!(attempts));
            if attempts >= MAX_FAILED_ATTEMPTS {
                let until = now + Duration::minutes(LOCKOUT_DURATION_MINUTES);
                fields.insert("lockedUntil".into(), json!(iso_string(until)));
                tracing::warn!(uid = %account.uid, "Account locked after failed sign-in attempts");
            }
            self.update_account(&account.uid, fields).await?;
            return Err(AppError::Unauthorized);
        }

        let mut fields = Map::new();
        fields.insert("failedLoginAttempts".into(), json!(0));
        fields.insert("lockedUntil".into(), Value::Null);
        fields.insert("lastLogin".into(), json!(iso_string(now)));
        self.update_account(&account.uid, fields).await?;

        issue_token(
            &account.uid,
            Some(&account.email),
            TokenKind::Id,
            self.id_token_expiry_secs,
            &self.secret,
        )
    }

    async fn verify_id_token(&self, id_token: &str) -> Result<TokenClaims, AppError> {
        validate_token(id_token, &self.secret, TokenKind::Id)
    }

    async fn create_session_cookie(
        &self,
        id_token: &str,
        expires_in_secs: i64,
    ) -> Result<String, AppError> {
        let claims = self.verify_id_token(id_token).await?;
        issue_token(
            claims.uid(),
            claims.email.as_deref(),
            TokenKind::Session,
            expires_in_secs,
            &self.secret,
        )
    }

    async fn verify_session_cookie(&self, cookie: &str) -> Result<TokenClaims, AppError> {
        let claims = validate_token(cookie, &self.secret, TokenKind::Session)?;
        match self.find_by_uid(claims.uid()).await? {
            Some(account) if !account.disabled => Ok(claims),
            _ => Err(AppError::Unauthorized),
        }
    }

    async fn get_user(&self, uid: &str) -> Result<Option<IdentityUser>, AppError> {
        Ok(self.find_by_uid(uid).await?.map(IdentityUser::from))
    }

    async fn set_disabled(&self, uid: &str, disabled: bool) -> Result<(), AppError> {
        let mut fields = Map::new();
        fields.insert("disabled".into(), json!(disabled));
        self.update_account(uid, fields).await.map_err(|e| match e {
            AppError::NotFound(_) => AppError::NotFound("Account not found".to_string()),
            other => other,
        })
    }

    async fn generate_password_reset_link(&self, email: &str) -> Result<String, AppError> {
        let account = self
            .find_by_email(&normalize_email(email))
            .await?
            .ok_or_else(|| AppError::NotFound("Account not found".to_string()))?;
        let token = issue_token(
            &account.uid,
            Some(&account.email),
            TokenKind::PasswordReset,
            self.password_reset_expiry_secs,
            &self.secret,
        )?;
        Ok(format!(
            "{}/reset-password?token={token}",
            self.app_url.trim_end_matches('/')
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryDocumentStore;

    const SECRET: &str = "test-session-secret";

    fn provider() -> LocalIdentityProvider {
        LocalIdentityProvider::new(
            Arc::new(MemoryDocumentStore::new()),
            SECRET,
            3600,
            3600,
            "https://admin.example.com/",
        )
    }

    #[test]
    fn password_hash_and_verify() {
        let hash = hash_password("SecurePassword123!").unwrap();
        assert_ne!(hash, "SecurePassword123!");
        assert!(verify_password("SecurePassword123!", &hash).unwrap());
        assert!(!verify_password("WrongPassword", &hash).unwrap());
    }

    #[test]
    fn token_kind_is_enforced() {
        let token = issue_token("u1", None, TokenKind::Id, 60, SECRET).unwrap();
        assert!(validate_token(&token, SECRET, TokenKind::Id).is_ok());
        assert!(validate_token(&token, SECRET, TokenKind::Session).is_err());
        assert!(validate_token(&token, "other-secret", TokenKind::Id).is_err());
    }

    #[test]
    fn expired_token_rejected() {
        // Well beyond the 60s leeway window
        let token = issue_token("u1", None, TokenKind::Session, -3600, SECRET).unwrap();
        assert!(validate_token(&token, SECRET, TokenKind::Session).is_err());
    }

    #[tokio::test]
    async fn sign_in_and_session_round_trip() {
        let idp = provider();
        let user = idp
            .create_account(Some("admin-1"), "Admin@Example.com", "correct horse")
            .await
            .unwrap();
        assert_eq!(user.email.as_deref(), Some("admin@example.com"));

        let id_token = idp.sign_in("admin@example.com", "correct horse").await.unwrap();
        let cookie = idp.create_session_cookie(&id_token, 600).await.unwrap();
        let claims = idp.verify_session_cookie(&cookie).await.unwrap();
        assert_eq!(claims.uid(), "admin-1");

        // An id token is not a session cookie.
        assert!(idp.verify_session_cookie(&id_token).await.is_err());
    }

    #[tokio::test]
    async fn disabled_account_loses_session() {
        let idp = provider();
        idp.create_account(Some("u1"), "u1@example.com", "pw").await.unwrap();
        let id_token = idp.sign_in("u1@example.com", "pw").await.unwrap();
        let cookie = idp.create_session_cookie(&id_token, 600).await.unwrap();

        idp.set_disabled("u1", true).await.unwrap();
        assert!(idp.get_user("u1").await.unwrap().unwrap().disabled);
        assert!(idp.verify_session_cookie(&cookie).await.is_err());
        assert!(idp.sign_in("u1@example.com", "pw").await.is_err());

        idp.set_disabled("u1", false).await.unwrap();
        assert!(idp.verify_session_cookie(&cookie).await.is_ok());
    }

    #[tokio::test]
    async fn repeated_failures_lock_account() {
        let idp = provider();
        idp.create_account(Some("u1"), "u1@example.com", "pw").await.unwrap();
        for _ in 0..MAX_FAILED_ATTEMPTS {
            assert!(idp.sign_in("u1@example.com", "nope").await.is_err());
        }
        // Correct password is refused while locked.
        assert!(idp.sign_in("u1@example.com", "pw").await.is_err());
    }

    #[tokio::test]
    async fn duplicate_email_conflicts() {
        let idp = provider();
        idp.create_account(None, "dup@example.com", "pw").await.unwrap();
        let err = idp.create_account(None, "DUP@example.com", "pw").await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn reset_link_points_at_app_url() {
        let idp = provider();
        idp.create_account(Some("u1"), "u1@example.com", "pw").await.unwrap();
        let link = idp.generate_password_reset_link("u1@example.com").await.unwrap();
        assert!(link.starts_with("https://admin.example.com/reset-password?token="));

        let token = link.rsplit('=').next().unwrap();
        let claims = validate_token(token, SECRET, TokenKind::PasswordReset).unwrap();
        assert_eq!(claims.uid(), "u1");

        let missing = idp.generate_password_reset_link("ghost@example.com").await;
        assert!(matches!(missing, Err(AppError::NotFound(_))));
    }
}
