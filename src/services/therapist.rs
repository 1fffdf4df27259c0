//! Therapist directory administration: listing, profile edits and verification.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::db::{collections, DocumentStore};
use crate::errors::AppError;
use crate::models::booking::Booking;
use crate::models::decode_record;
use crate::models::pagination::{PagedResult, Pagination};
use crate::models::therapist::{Therapist, UpdateTherapist};
use crate::models::timestamp::iso_string;
use crate::services::booking as booking_service;
use crate::services::page_cache::PageCache;
use crate::services::{decode_all, search_term};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TherapistFilters {
    pub verified: Option<bool>,
    pub search: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TherapistDetail {
    pub therapist: Therapist,
    pub bookings: Vec<Booking>,
}

pub(crate) fn therapist_paths(id: &str) -> Vec<String> {
    vec!["/therapists".to_string(), format!("/therapists/{id}")]
}

pub async fn list(
    store: &dyn DocumentStore,
    filters: &TherapistFilters,
    pagination: &Pagination,
) -> Result<PagedResult<Therapist>, AppError> {
    let docs = store.list_all(collections::THERAPISTS).await?;
    let search = search_term(&filters.search);
    let therapists: Vec<Therapist> = decode_all::<Therapist>(collections::THERAPISTS, "id", &docs)
        .into_iter()
        .filter(|t| filters.verified.map_or(true, |v| t.verified == v))
        .filter(|t| search.map_or(true, |needle| t.matches(needle)))
        .collect();
    Ok(PagedResult::paginate(therapists, pagination))
}

pub async fn find_by_id(store: &dyn DocumentStore, id: &str) -> Result<TherapistDetail, AppError> {
    let therapist = store
        .get_by_id(collections::THERAPISTS, id)
        .await?
        .and_then(|doc| decode_record(collections::THERAPISTS, "id", &doc))
        .ok_or_else(|| AppError::NotFound("Therapist not found".to_string()))?;
    let bookings = booking_service::list_for(store, "therapistId", id).await?;
    Ok(TherapistDetail { therapist, bookings })
}

async fn merge_stamped(
    store: &dyn DocumentStore,
    cache: &PageCache,
    id: &str,
    mut fields: Map<String, Value>,
    now: DateTime<Utc>,
) -> Result<Therapist, AppError> {
    fields.insert("updatedAt".into(), Value::String(iso_string(now)));
    let doc = store
        .merge(collections::THERAPISTS, id, fields)
        .await
        .map_err(|e| match e {
            AppError::NotFound(_) => AppError::NotFound("Therapist not found".to_string()),
            other => other,
        })?;
    cache.invalidate(&therapist_paths(id)).await;
    decode_record(collections::THERAPISTS, "id", &doc)
        .ok_or_else(|| AppError::Internal(format!("Therapist {id} could not be decoded")))
}

/// Merge administrator edits into a therapist profile.
pub async fn update(
    store: &dyn DocumentStore,
    cache: &PageCache,
    id: &str,
    patch: UpdateTherapist,
    now: DateTime<Utc>,
) -> Result<Therapist, AppError> {
    let renamed = patch.name.is_some();
    let fields = match serde_json::to_value(patch) {
        Ok(Value::Object(fields)) => fields,
        Ok(_) => Map::new(),
        Err(e) => {
            return Err(AppError::Internal(format!(
                "Therapist patch encoding failed: {e}"
            )))
        }
    };
    let therapist = merge_stamped(store, cache, id, fields, now).await?;
    // Review listings carry the therapist's name.
    if renamed {
        cache.invalidate(&["/reviews".to_string()]).await;
    }
    tracing::info!(therapist_id = %id, "Therapist profile updated");
    Ok(therapist)
}

/// Verify (`true`) or reject (`false`) a therapist.
pub async fn set_verified(
    store: &dyn DocumentStore,
    cache: &PageCache,
    id: &str,
    verified: bool,
    now: DateTime<Utc>,
) -> Result<Therapist, AppError> {
    let mut fields = Map::new();
    fields.insert("verified".into(), Value::Bool(verified));
    let therapist = merge_stamped(store, cache, id, fields, now).await?;
    tracing::info!(therapist_id = %id, verified, "Therapist verification changed");
    Ok(therapist)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryDocumentStore;
    use crate::services::page_cache::DEFAULT_TTL;
    use chrono::TimeZone;
    use serde_json::json;

    async fn seeded() -> MemoryDocumentStore {
        let store = MemoryDocumentStore::new();
        store
            .put(
                collections::THERAPISTS,
                "t1",
                json!({ "name": "Dr. Rao", "verified": false, "specializations": ["Anxiety"], "bio": "Hello" }),
            )
            .await
            .unwrap();
        store
            .put(collections::THERAPISTS, "t2", json!({ "name": "Dr. Iyer", "verified": true }))
            .await
            .unwrap();
        store
            .put(collections::BOOKINGS, "b1", json!({ "therapistId": "t1", "status": "completed" }))
            .await
            .unwrap();
        store
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn list_filters_by_verification_and_search() {
        let store = seeded().await;
        let filters = TherapistFilters {
            verified: Some(true),
            ..Default::default()
        };
        let page = list(&store, &filters, &Pagination::default()).await.unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].id, "t2");

        let filters = TherapistFilters {
            search: Some("anxiety".to_string()),
            ..Default::default()
        };
        let page = list(&store, &filters, &Pagination::default()).await.unwrap();
        assert_eq!(page.items[0].id, "t1");
    }

    #[tokio::test]
    async fn detail_includes_bookings() {
        let store = seeded().await;
        let detail = find_by_id(&store, "t1").await.unwrap();
        assert_eq!(detail.bookings.len(), 1);
        assert!(find_by_id(&store, "t9").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn verify_then_reject() {
        let store = seeded().await;
        let cache = PageCache::in_memory(DEFAULT_TTL);

        let therapist = set_verified(&store, &cache, "t1", true, now()).await.unwrap();
        assert!(therapist.verified);
        assert_eq!(therapist.updated_at.get(), Some(now()));

        let therapist = set_verified(&store, &cache, "t1", false, now()).await.unwrap();
        assert!(!therapist.verified);
    }

    #[tokio::test]
    async fn update_keeps_unrelated_fields() {
        let store = seeded().await;
        let cache = PageCache::in_memory(DEFAULT_TTL);
        let patch = UpdateTherapist {
            experience: Some(7.0),
            ..Default::default()
        };
        let therapist = update(&store, &cache, "t1", patch, now()).await.unwrap();
        assert_eq!(therapist.experience, 7.0);
        assert_eq!(therapist.extra["bio"], "Hello");
        assert_eq!(therapist.specializations, vec!["Anxiety"]);
    }

    #[tokio::test]
    async fn rename_drops_cached_review_listings() {
        let store = seeded().await;
        let cache = PageCache::in_memory(DEFAULT_TTL);
        cache.put("/reviews", "flagged=true", &json!([])).await;

        let patch = UpdateTherapist {
            experience: Some(9.0),
            ..Default::default()
        };
        update(&store, &cache, "t1", patch, now()).await.unwrap();
        assert!(cache.get("/reviews", "flagged=true").await.is_some());

        let patch = UpdateTherapist {
            name: Some("Dr. Meera Rao".to_string()),
            ..Default::default()
        };
        let therapist = update(&store, &cache, "t1", patch, now()).await.unwrap();
        assert_eq!(therapist.display_name(), "Dr. Meera Rao");
        assert!(cache.get("/reviews", "flagged=true").await.is_none());
    }
}
