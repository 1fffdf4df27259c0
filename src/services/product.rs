//! Wellness-shop catalogue management.

use serde::Deserialize;
use serde_json::Value;
use validator::Validate;

use crate::db::{collections, DocumentStore};
use crate::errors::AppError;
use crate::models::decode_record;
use crate::models::pagination::{PagedResult, Pagination};
use crate::models::product::{Product, ProductInput, ProductUpdate};
use crate::services::page_cache::PageCache;
use crate::services::{decode_all, search_term};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductFilters {
    pub category: Option<String>,
    pub search: Option<String>,
}

pub async fn list(
    store: &dyn DocumentStore,
    filters: &ProductFilters,
    pagination: &Pagination,
) -> Result<PagedResult<Product>, AppError> {
    let docs = store.list_all(collections::PRODUCTS).await?;
    let search = search_term(&filters.search).map(str::to_lowercase);
    let products: Vec<Product> = decode_all::<Product>(collections::PRODUCTS, "id", &docs)
        .into_iter()
        .filter(|p| {
            filters
                .category
                .as_deref()
                .map_or(true, |c| p.category.as_deref() == Some(c))
        })
        .filter(|p| {
            search.as_deref().map_or(true, |needle| {
                p.name
                    .as_deref()
                    .is_some_and(|n| n.to_lowercase().contains(needle))
            })
        })
        .collect();
    Ok(PagedResult::paginate(products, pagination))
}

pub async fn find_by_id(store: &dyn DocumentStore, id: &str) -> Result<Product, AppError> {
    store
        .get_by_id(collections::PRODUCTS, id)
        .await?
        .and_then(|doc| decode_record(collections::PRODUCTS, "id", &doc))
        .ok_or_else(|| AppError::NotFound("Product not found".to_string()))
}

/// Create a product from validated form input.
pub async fn create(
    store: &dyn DocumentStore,
    cache: &PageCache,
    input: ProductInput,
) -> Result<Product, AppError> {
    input.validate()?;
    let doc = store
        .insert(collections::PRODUCTS, Value::Object(input.into_document()))
        .await?;
    cache.invalidate(&["/products".to_string()]).await;

    tracing::info!(product_id = %doc.id, "Product created");
    decode_record(collections::PRODUCTS, "id", &doc)
        .ok_or_else(|| AppError::Internal(format!("Product {} could not be decoded", doc.id)))
}

pub async fn update(
    store: &dyn DocumentStore,
    cache: &PageCache,
    id: &str,
    update: ProductUpdate,
) -> Result<Product, AppError> {
    update.validate()?;
    let doc = store
        .merge(collections::PRODUCTS, id, update.into_fields())
        .await
        .map_err(|e| match e {
            AppError::NotFound(_) => AppError::NotFound("Product not found".to_string()),
            other => other,
        })?;
    cache
        .invalidate(&["/products".to_string(), format!("/products/{id}")])
        .await;

    tracing::info!(product_id = %id, "Product updated");
    decode_record(collections::PRODUCTS, "id", &doc)
        .ok_or_else(|| AppError::Internal(format!("Product {id} could not be decoded")))
}

pub async fn delete(store: &dyn DocumentStore, cache: &PageCache, id: &str) -> Result<(), AppError> {
    if !store.delete(collections::PRODUCTS, id).await? {
        return Err(AppError::NotFound("Product not found".to_string()));
    }
    cache
        .invalidate(&["/products".to_string(), format!("/products/{id}")])
        .await;
    tracing::info!(product_id = %id, "Product deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryDocumentStore;
    use crate::services::page_cache::DEFAULT_TTL;
    use serde_json::json;

    fn input(name: &str, category: &str) -> ProductInput {
        serde_json::from_value(json!({
            "name": name,
            "description": "A calming blend",
            "price": 499.0,
            "imageUrl": "https://cdn.example.com/p.png",
            "category": category,
            "stock": 10,
            "tags": "calm, tea"
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn create_list_update_delete() {
        let store = MemoryDocumentStore::new();
        let cache = PageCache::in_memory(DEFAULT_TTL);

        let tea = create(&store, &cache, input("Chamomile Tea", "sleep")).await.unwrap();
        create(&store, &cache, input("Yoga Mat", "body")).await.unwrap();
        assert_eq!(tea.rating, 0.0);
        assert_eq!(tea.review_count, 0);
        assert_eq!(tea.tags, vec!["calm", "tea"]);

        let filters = ProductFilters {
            category: Some("sleep".to_string()),
            ..Default::default()
        };
        let page = list(&store, &filters, &Pagination::default()).await.unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].id, tea.id);

        let patch = ProductUpdate {
            stock: Some(0),
            ..Default::default()
        };
        let updated = update(&store, &cache, &tea.id, patch).await.unwrap();
        assert_eq!(updated.stock, 0);
        assert_eq!(updated.name.as_deref(), Some("Chamomile Tea"));

        delete(&store, &cache, &tea.id).await.unwrap();
        assert!(find_by_id(&store, &tea.id).await.unwrap_err().is_not_found());
        assert!(delete(&store, &cache, &tea.id).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn invalid_input_is_rejected_before_write() {
        let store = MemoryDocumentStore::new();
        let cache = PageCache::in_memory(DEFAULT_TTL);
        let mut bad = input("", "mind");
        bad.price = -1.0;

        let err = create(&store, &cache, bad).await.unwrap_err();
        match err {
            AppError::Validation(msg) => {
                assert!(msg.contains("name"));
                assert!(msg.contains("price"));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
        assert!(store.list_all(collections::PRODUCTS).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn search_matches_name() {
        let store = MemoryDocumentStore::new();
        let cache = PageCache::in_memory(DEFAULT_TTL);
        create(&store, &cache, input("Lavender Mist", "sleep")).await.unwrap();
        create(&store, &cache, input("Focus App", "digital")).await.unwrap();

        let filters = ProductFilters {
            search: Some("lavender".to_string()),
            ..Default::default()
        };
        let page = list(&store, &filters, &Pagination::default()).await.unwrap();
        assert_eq!(page.total, 1);
    }
}
