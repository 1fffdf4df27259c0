//! Shop order queries and fulfilment status changes.

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::db::{collections, DocumentStore};
use crate::errors::AppError;
use crate::models::decode_record;
use crate::models::order::{OrderStatus, ShopOrder};
use crate::models::pagination::{PagedResult, Pagination};
use crate::services::page_cache::PageCache;
use crate::services::{decode_all, sort_newest_first};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrderFilters {
    pub status: Option<String>,
}

/// List orders, most recently placed first.
pub async fn list(
    store: &dyn DocumentStore,
    filters: &OrderFilters,
    pagination: &Pagination,
) -> Result<PagedResult<ShopOrder>, AppError> {
    let docs = store.list_all(collections::ORDERS).await?;
    let mut orders: Vec<ShopOrder> = decode_all::<ShopOrder>(collections::ORDERS, "orderId", &docs)
        .into_iter()
        .filter(|o| {
            filters
                .status
                .as_deref()
                .map_or(true, |s| o.status.as_str() == s)
        })
        .collect();
    sort_newest_first(&mut orders, |o| o.created_at.get());
    Ok(PagedResult::paginate(orders, pagination))
}

pub async fn find_by_id(store: &dyn DocumentStore, id: &str) -> Result<ShopOrder, AppError> {
    store
        .get_by_id(collections::ORDERS, id)
        .await?
        .and_then(|doc| decode_record(collections::ORDERS, "orderId", &doc))
        .ok_or_else(|| AppError::NotFound("Order not found".to_string()))
}

pub async fn update_status(
    store: &dyn DocumentStore,
    cache: &PageCache,
    id: &str,
    status: OrderStatus,
) -> Result<ShopOrder, AppError> {
    if !status.is_assignable() {
        return Err(AppError::Validation(format!(
            "status: '{}' is not a valid order status",
            status.as_str()
        )));
    }

    let mut fields = Map::new();
    fields.insert("status".into(), Value::from(status.as_str()));
    let doc = store
        .merge(collections::ORDERS, id, fields)
        .await
        .map_err(|e| match e {
            AppError::NotFound(_) => AppError::NotFound("Order not found".to_string()),
            other => other,
        })?;

    cache
        .invalidate(&["/orders".to_string(), format!("/orders/{id}")])
        .await;

    tracing::info!(order_id = %id, status = status.as_str(), "Order status updated");
    decode_record(collections::ORDERS, "orderId", &doc)
        .ok_or_else(|| AppError::Internal(format!("Order {id} could not be decoded")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryDocumentStore;
    use crate::services::page_cache::DEFAULT_TTL;
    use serde_json::json;

    async fn seeded() -> MemoryDocumentStore {
        let store = MemoryDocumentStore::new();
        store
            .put(
                collections::ORDERS,
                "o-old",
                json!({ "status": "delivered", "createdAt": { "_seconds": 1_700_000_000, "_nanoseconds": 0 } }),
            )
            .await
            .unwrap();
        store
            .put(
                collections::ORDERS,
                "o-new",
                json!({ "status": "pending", "createdAt": "2024-06-01T00:00:00Z", "items": [] }),
            )
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn list_is_newest_first_with_order_ids() {
        let store = seeded().await;
        let page = list(&store, &OrderFilters::default(), &Pagination::default())
            .await
            .unwrap();
        let ids: Vec<_> = page.items.iter().map(|o| o.order_id.as_str()).collect();
        assert_eq!(ids, vec!["o-new", "o-old"]);

        let value = serde_json::to_value(&page.items[1]).unwrap();
        assert_eq!(value["orderId"], "o-old");
        assert_eq!(value["createdAt"], "2023-11-14T22:13:20.000Z");
    }

    #[tokio::test]
    async fn status_filter_applies() {
        let store = seeded().await;
        let filters = OrderFilters {
            status: Some("delivered".to_string()),
        };
        let page = list(&store, &filters, &Pagination::default()).await.unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].order_id, "o-old");
    }

    #[tokio::test]
    async fn update_status_persists() {
        let store = seeded().await;
        let cache = PageCache::in_memory(DEFAULT_TTL);
        cache.put("/orders/o-new", "", &json!({})).await;

        let order = update_status(&store, &cache, "o-new", OrderStatus::Shipped)
            .await
            .unwrap();
        assert_eq!(order.status, OrderStatus::Shipped);
        assert!(cache.get("/orders/o-new", "").await.is_none());

        let err = update_status(&store, &cache, "o-new", OrderStatus::Unknown)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn missing_order_is_not_found() {
        let store = seeded().await;
        assert!(find_by_id(&store, "ghost").await.unwrap_err().is_not_found());
    }
}
