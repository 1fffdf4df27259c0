//! Admin sessions: exchanging identity tokens for a session cookie.

use serde::Serialize;

use crate::db::{collections, DocumentStore};
use crate::errors::AppError;
use crate::services::identity::{IdentityProvider, TokenClaims};

/// Name of the session cookie.
pub const SESSION_COOKIE_NAME: &str = "__session";

/// The administrator behind a request.
#[derive(Debug, Clone, Serialize)]
pub struct AdminSession {
    pub uid: String,
    pub email: Option<String>,
    /// Expiry as a unix timestamp.
    pub expires_at: i64,
}

impl From<TokenClaims> for AdminSession {
    fn from(claims: TokenClaims) -> Self {
        Self {
            uid: claims.sub,
            email: claims.email,
            expires_at: claims.exp,
        }
    }
}

/// A freshly minted session and its cookie value.
#[derive(Debug, Clone)]
pub struct NewSession {
    pub cookie: String,
    pub session: AdminSession,
}

/// Whether `uid` has an entry in the admins collection.
pub async fn is_admin(store: &dyn DocumentStore, uid: &str) -> Result<bool, AppError> {
    Ok(store.get_by_id(collections::ADMINS, uid).await?.is_some())
}

/// Verify an id token, require admin access and mint a session cookie.
pub async fn create_session(
    store: &dyn DocumentStore,
    identity: &dyn IdentityProvider,
    id_token: &str,
    expiry_secs: i64,
) -> Result<NewSession, AppError> {
    let claims = identity.verify_id_token(id_token).await?;

    if !is_admin(store, claims.uid()).await? {
        tracing::warn!(uid = %claims.uid(), "Session refused for non-admin account");
        return Err(AppError::Forbidden("Not an admin".to_string()));
    }

    let cookie = identity.create_session_cookie(id_token, expiry_secs).await?;
    let session = identity.verify_session_cookie(&cookie).await?.into();
    tracing::info!(uid = %claims.uid(), "Admin session created");
    Ok(NewSession { cookie, session })
}

/// Password sign-in followed by [`create_session`].
pub async fn login(
    store: &dyn DocumentStore,
    identity: &dyn IdentityProvider,
    email: &str,
    password: &str,
    expiry_secs: i64,
) -> Result<NewSession, AppError> {
    let id_token = identity.sign_in(email, password).await?;
    create_session(store, identity, &id_token, expiry_secs).await
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::*;
    use crate::db::MemoryDocumentStore;
    use crate::services::identity::LocalIdentityProvider;

    async fn setup() -> (Arc<MemoryDocumentStore>, LocalIdentityProvider) {
        let store = Arc::new(MemoryDocumentStore::new());
        let idp = LocalIdentityProvider::new(store.clone(), "secret", 3600, 3600, "http://localhost");
        idp.create_account(Some("admin-1"), "admin@example.com", "pw").await.unwrap();
        idp.create_account(Some("user-1"), "user@example.com", "pw").await.unwrap();
        store
            .put(collections::ADMINS, "admin-1", json!({ "email": "admin@example.com" }))
            .await
            .unwrap();
        (store, idp)
    }

    #[tokio::test]
    async fn admin_login_yields_session() {
        let (store, idp) = setup().await;
        let new = login(store.as_ref(), &idp, "admin@example.com", "pw", 600)
            .await
            .unwrap();
        assert_eq!(new.session.uid, "admin-1");
        assert_eq!(new.session.email.as_deref(), Some("admin@example.com"));
        let claims = idp.verify_session_cookie(&new.cookie).await.unwrap();
        assert_eq!(claims.uid(), "admin-1");
    }

    #[tokio::test]
    async fn non_admin_is_forbidden() {
        let (store, idp) = setup().await;
        let err = login(store.as_ref(), &idp, "user@example.com", "pw", 600)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[tokio::test]
    async fn admin_entry_lookup() {
        let (store, _) = setup().await;
        assert!(is_admin(store.as_ref(), "admin-1").await.unwrap());
        assert!(!is_admin(store.as_ref(), "user-1").await.unwrap());
    }

    #[tokio::test]
    async fn bad_password_is_unauthorized() {
        let (store, idp) = setup().await;
        let err = login(store.as_ref(), &idp, "admin@example.com", "wrong", 600)
            .await
            .unwrap_err();
        assert!(err.is_unauthorized());
    }
}
