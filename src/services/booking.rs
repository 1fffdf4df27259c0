//! Booking queries and the administrator status override.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{json, Map, Value};

use crate::db::{collections, DocumentStore};
use crate::errors::AppError;
use crate::models::booking::{Booking, BookingStatus};
use crate::models::decode_record;
use crate::models::pagination::{PagedResult, Pagination};
use crate::services::page_cache::PageCache;
use crate::services::{decode_all, sort_newest_first};

/// Filters for listing bookings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BookingFilters {
    pub status: Option<String>,
    pub user_id: Option<String>,
    pub therapist_id: Option<String>,
}

impl BookingFilters {
    fn matches(&self, booking: &Booking) -> bool {
        self.status
            .as_deref()
            .map_or(true, |s| booking.status.as_str() == s)
            && self
                .user_id
                .as_deref()
                .map_or(true, |u| booking.user_id.as_deref() == Some(u))
            && self
                .therapist_id
                .as_deref()
                .map_or(true, |t| booking.therapist_id.as_deref() == Some(t))
    }
}

fn booking_date(booking: &Booking) -> Option<DateTime<Utc>> {
    booking.date.get()
}

/// List bookings, newest session first.
pub async fn list(
    store: &dyn DocumentStore,
    filters: &BookingFilters,
    pagination: &Pagination,
) -> Result<PagedResult<Booking>, AppError> {
    let docs = store.list_all(collections::BOOKINGS).await?;
    let mut bookings: Vec<Booking> = decode_all::<Booking>(collections::BOOKINGS, "id", &docs)
        .into_iter()
        .filter(|b| filters.matches(b))
        .collect();
    sort_newest_first(&mut bookings, booking_date);
    Ok(PagedResult::paginate(bookings, pagination))
}

/// Bookings whose `field` equals `id`, newest first.
pub async fn list_for(
    store: &dyn DocumentStore,
    field: &str,
    id: &str,
) -> Result<Vec<Booking>, AppError> {
    let docs = store.list_where(collections::BOOKINGS, field, &json!(id)).await?;
    let mut bookings = decode_all(collections::BOOKINGS, "id", &docs);
    sort_newest_first(&mut bookings, booking_date);
    Ok(bookings)
}

pub async fn find_by_id(store: &dyn DocumentStore, id: &str) -> Result<Booking, AppError> {
    store
        .get_by_id(collections::BOOKINGS, id)
        .await?
        .and_then(|doc| decode_record(collections::BOOKINGS, "id", &doc))
        .ok_or_else(|| AppError::NotFound("Booking not found".to_string()))
}

/// Set a booking's status and drop the cached pages showing it.
pub async fn update_status(
    store: &dyn DocumentStore,
    cache: &PageCache,
    id: &str,
    status: BookingStatus,
) -> Result<Booking, AppError> {
    if !status.is_assignable() {
        return Err(AppError::Validation(format!(
            "status: '{}' is not a valid booking status",
            status.as_str()
        )));
    }

    let mut fields = Map::new();
    fields.insert("status".into(), Value::from(status.as_str()));
    let doc = store
        .merge(collections::BOOKINGS, id, fields)
        .await
        .map_err(|e| match e {
            AppError::NotFound(_) => AppError::NotFound("Booking not found".to_string()),
            other => other,
        })?;

    let mut paths = vec!["/bookings".to_string(), format!("/bookings/{id}")];
    for (field, page) in [("userId", "/users"), ("therapistId", "/therapists")] {
        if let Some(linked) = doc.data.get(field).and_then(Value::as_str).filter(|v| !v.is_empty()) {
            paths.push(format!("{page}/{linked}"));
        }
    }
    cache.invalidate(&paths).await;

    tracing::info!(booking_id = %id, status = status.as_str(), "Booking status updated");
    decode_record(collections::BOOKINGS, "id", &doc)
        .ok_or_else(|| AppError::Internal(format!("Booking {id} could not be decoded")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryDocumentStore;
    use crate::services::page_cache::DEFAULT_TTL;

    async fn seeded() -> MemoryDocumentStore {
        let store = MemoryDocumentStore::new();
        for (id, user, status, date) in [
            ("b1", "u1", "pending", "2024-05-01T10:00:00Z"),
            ("b2", "u2", "completed", "2024-06-01T10:00:00Z"),
            ("b3", "u1", "cancelled", "2024-04-01T10:00:00Z"),
        ] {
            store
                .put(
                    collections::BOOKINGS,
                    id,
                    json!({ "userId": user, "therapistId": "t1", "status": status, "date": date }),
                )
                .await
                .unwrap();
        }
        store
    }

    #[tokio::test]
    async fn list_sorts_and_filters() {
        let store = seeded().await;
        let all = list(&store, &BookingFilters::default(), &Pagination::default())
            .await
            .unwrap();
        let ids: Vec<_> = all.items.iter().map(|b| b.id.as_str()).collect();
        assert_eq!(ids, vec!["b2", "b1", "b3"]);

        let filters = BookingFilters {
            user_id: Some("u1".to_string()),
            status: Some("cancelled".to_string()),
            ..Default::default()
        };
        let some = list(&store, &filters, &Pagination::default()).await.unwrap();
        assert_eq!(some.total, 1);
        assert_eq!(some.items[0].id, "b3");
    }

    #[tokio::test]
    async fn list_for_user_is_newest_first() {
        let store = seeded().await;
        let bookings = list_for(&store, "userId", "u1").await.unwrap();
        let ids: Vec<_> = bookings.iter().map(|b| b.id.as_str()).collect();
        assert_eq!(ids, vec!["b1", "b3"]);
    }

    #[tokio::test]
    async fn update_status_writes_and_invalidates() {
        let store = seeded().await;
        let cache = PageCache::in_memory(DEFAULT_TTL);
        cache.put("/bookings", "", &json!([])).await;
        cache.put("/users/u1", "", &json!({})).await;

        let booking = update_status(&store, &cache, "b1", BookingStatus::Confirmed)
            .await
            .unwrap();
        assert_eq!(booking.status, BookingStatus::Confirmed);
        assert_eq!(find_by_id(&store, "b1").await.unwrap().status, BookingStatus::Confirmed);
        assert!(cache.get("/bookings", "").await.is_none());
        assert!(cache.get("/users/u1", "").await.is_none());
    }

    #[tokio::test]
    async fn update_status_on_malformed_booking_still_invalidates() {
        let store = seeded().await;
        store
            .put(
                collections::BOOKINGS,
                "b9",
                json!({ "userId": "u3", "therapistId": "t2", "status": 4, "date": "garbage", "amount": "n/a" }),
            )
            .await
            .unwrap();
        let cache = PageCache::in_memory(DEFAULT_TTL);
        for path in ["/bookings", "/bookings/b9", "/users/u3", "/therapists/t2"] {
            cache.put(path, "", &json!({})).await;
        }

        let booking = update_status(&store, &cache, "b9", BookingStatus::Cancelled)
            .await
            .unwrap();
        assert_eq!(booking.status, BookingStatus::Cancelled);
        assert_eq!(booking.user_id.as_deref(), Some("u3"));
        for path in ["/bookings", "/bookings/b9", "/users/u3", "/therapists/t2"] {
            assert!(cache.get(path, "").await.is_none(), "{path} still cached");
        }
    }

    #[tokio::test]
    async fn update_status_rejects_unknown_and_missing() {
        let store = seeded().await;
        let cache = PageCache::in_memory(DEFAULT_TTL);
        let err = update_status(&store, &cache, "b1", BookingStatus::Other("lost".into()))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let err = update_status(&store, &cache, "nope", BookingStatus::Completed)
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }
}
