//! Client account administration: profiles, sign-in status and password resets.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::db::{collections, DocumentStore};
use crate::errors::AppError;
use crate::models::booking::Booking;
use crate::models::decode_record;
use crate::models::pagination::{PagedResult, Pagination};
use crate::models::timestamp::iso_string;
use crate::models::user::{UpdateUser, UserProfile};
use crate::services::booking as booking_service;
use crate::services::identity::IdentityProvider;
use crate::services::page_cache::PageCache;
use crate::services::{decode_all, search_term, sort_newest_first};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserFilters {
    pub search: Option<String>,
}

/// User detail page: the profile plus that user's bookings.
#[derive(Debug, Clone, Serialize)]
pub struct UserDetail {
    pub user: UserProfile,
    pub bookings: Vec<Booking>,
}

/// Password-reset link generated on an administrator's behalf.
#[derive(Debug, Clone, Serialize)]
pub struct PasswordResetLink {
    pub link: String,
}

fn user_paths(id: &str) -> Vec<String> {
    vec!["/users".to_string(), format!("/users/{id}")]
}

/// List user profiles, newest signup first.
pub async fn list(
    store: &dyn DocumentStore,
    filters: &UserFilters,
    pagination: &Pagination,
) -> Result<PagedResult<UserProfile>, AppError> {
    let docs = store.list_all(collections::USERS).await?;
    let search = search_term(&filters.search);
    let mut users: Vec<UserProfile> = decode_all::<UserProfile>(collections::USERS, "userId", &docs)
        .into_iter()
        .filter(|u| search.map_or(true, |needle| u.matches(needle)))
        .collect();
    sort_newest_first(&mut users, |u| u.created_at.get());
    Ok(PagedResult::paginate(users, pagination))
}

async fn find_profile(store: &dyn DocumentStore, id: &str) -> Result<UserProfile, AppError> {
    store
        .get_by_id(collections::USERS, id)
        .await?
        .and_then(|doc| decode_record(collections::USERS, "userId", &doc))
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))
}

/// Profile, sign-in status from the identity provider and bookings.
pub async fn find_by_id(
    store: &dyn DocumentStore,
    identity: &dyn IdentityProvider,
    id: &str,
) -> Result<UserDetail, AppError> {
    let mut user = find_profile(store, id).await?;
    user.is_disabled = identity
        .get_user(id)
        .await?
        .is_some_and(|account| account.disabled);
    let bookings = booking_service::list_for(store, "userId", id).await?;
    Ok(UserDetail { user, bookings })
}

/// Merge administrator edits into a profile and stamp `updatedAt`.
pub async fn update(
    store: &dyn DocumentStore,
    cache: &PageCache,
    id: &str,
    patch: UpdateUser,
    now: DateTime<Utc>,
) -> Result<UserProfile, AppError> {
    let mut fields = match serde_json::to_value(patch) {
        Ok(Value::Object(fields)) => fields,
        Ok(_) => serde_json::Map::new(),
        Err(e) => return Err(AppError::Internal(format!("User patch encoding failed: {e}"))),
    };
    fields.insert("updatedAt".into(), Value::String(iso_string(now)));

    let doc = store
        .merge(collections::USERS, id, fields)
        .await
        .map_err(|e| match e {
            AppError::NotFound(_) => AppError::NotFound("User not found".to_string()),
            other => other,
        })?;
    cache.invalidate(&user_paths(id)).await;

    tracing::info!(user_id = %id, "User profile updated");
    decode_record(collections::USERS, "userId", &doc)
        .ok_or_else(|| AppError::Internal(format!("User {id} could not be decoded")))
}

/// Disable or re-enable sign-in for a user.
pub async fn set_disabled(
    identity: &dyn IdentityProvider,
    cache: &PageCache,
    id: &str,
    disabled: bool,
) -> Result<(), AppError> {
    identity.set_disabled(id, disabled).await?;
    cache.invalidate(&user_paths(id)).await;
    tracing::info!(user_id = %id, disabled, "User sign-in status changed");
    Ok(())
}

/// Generate a password-reset link the administrator can share.
pub async fn reset_password(
    identity: &dyn IdentityProvider,
    id: &str,
) -> Result<PasswordResetLink, AppError> {
    let account = identity
        .get_user(id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
    let email = account
        .email
        .ok_or_else(|| AppError::Validation("User has no email".to_string()))?;
    let link = identity.generate_password_reset_link(&email).await?;
    tracing::info!(user_id = %id, "Password reset link generated");
    Ok(PasswordResetLink { link })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::TimeZone;
    use serde_json::json;

    use super::*;
    use crate::db::MemoryDocumentStore;
    use crate::services::identity::LocalIdentityProvider;
    use crate::services::page_cache::DEFAULT_TTL;

    async fn setup() -> (Arc<MemoryDocumentStore>, LocalIdentityProvider, PageCache) {
        let store = Arc::new(MemoryDocumentStore::new());
        for (id, first, email, created) in [
            ("u1", "Asha", "asha@example.com", "2024-01-05T00:00:00Z"),
            ("u2", "Rahul", "rahul@example.com", "2024-03-05T00:00:00Z"),
        ] {
            store
                .put(
                    collections::USERS,
                    id,
                    json!({ "firstName": first, "email": email, "createdAt": created }),
                )
                .await
                .unwrap();
        }
        store
            .put(collections::BOOKINGS, "b1", json!({ "userId": "u1", "status": "pending" }))
            .await
            .unwrap();
        let idp = LocalIdentityProvider::new(store.clone(), "secret", 3600, 3600, "http://admin.local");
        idp.create_account(Some("u1"), "asha@example.com", "pw").await.unwrap();
        (store, idp, PageCache::in_memory(DEFAULT_TTL))
    }

    #[tokio::test]
    async fn list_newest_first_with_search() {
        let (store, _, _) = setup().await;
        let page = list(store.as_ref(), &UserFilters::default(), &Pagination::default())
            .await
            .unwrap();
        let ids: Vec<_> = page.items.iter().map(|u| u.user_id.as_str()).collect();
        assert_eq!(ids, vec!["u2", "u1"]);

        let filters = UserFilters {
            search: Some("asha".to_string()),
        };
        let page = list(store.as_ref(), &filters, &Pagination::default()).await.unwrap();
        assert_eq!(page.total, 1);
    }

    #[tokio::test]
    async fn detail_reflects_identity_status_and_bookings() {
        let (store, idp, cache) = setup().await;
        set_disabled(&idp, &cache, "u1", true).await.unwrap();

        let detail = find_by_id(store.as_ref(), &idp, "u1").await.unwrap();
        assert!(detail.user.is_disabled);
        assert_eq!(detail.bookings.len(), 1);

        // No identity account at all reads as enabled.
        let detail = find_by_id(store.as_ref(), &idp, "u2").await.unwrap();
        assert!(!detail.user.is_disabled);
    }

    #[tokio::test]
    async fn update_stamps_updated_at() {
        let (store, _, cache) = setup().await;
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 8, 30, 0).unwrap();
        let patch = UpdateUser {
            city: Some("Pune".to_string()),
            ..Default::default()
        };
        let user = update(store.as_ref(), &cache, "u1", patch, now).await.unwrap();
        assert_eq!(user.city.as_deref(), Some("Pune"));
        assert_eq!(user.first_name.as_deref(), Some("Asha"));
        assert_eq!(user.updated_at.get(), Some(now));

        let err = update(store.as_ref(), &cache, "ghost", UpdateUser::default(), now)
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn reset_password_requires_account() {
        let (_, idp, _) = setup().await;
        let link = reset_password(&idp, "u1").await.unwrap();
        assert!(link.link.starts_with("http://admin.local/reset-password?token="));
        assert!(reset_password(&idp, "u2").await.unwrap_err().is_not_found());
    }
}
