//! Product routes: catalogue CRUD for the wellness shop.

use axum::{
    extract::{Path, Query, RawQuery, State},
    Json,
};
use serde_json::Value;

use crate::errors::{ApiResponse, AppError};
use crate::middleware::rbac::RequireAdmin;
use crate::models::pagination::Pagination;
use crate::models::product::{Product, ProductInput, ProductUpdate};
use crate::routes::cached;
use crate::services::product::{self as product_service, ProductFilters};
use crate::AppState;

/// GET /api/v1/products: optional category and search filters.
pub async fn list(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    RawQuery(query): RawQuery,
    Query(pagination): Query<Pagination>,
    Query(filters): Query<ProductFilters>,
) -> Result<Json<ApiResponse<Value>>, AppError> {
    cached(
        &state,
        "/products",
        query.as_deref(),
        product_service::list(state.store.as_ref(), &filters, &pagination),
    )
    .await
}

/// POST /api/v1/products
pub async fn create(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Json(body): Json<ProductInput>,
) -> Result<Json<ApiResponse<Product>>, AppError> {
    let product = product_service::create(state.store.as_ref(), &state.cache, body).await?;
    Ok(ApiResponse::success(product))
}

/// GET /api/v1/products/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Value>>, AppError> {
    cached(
        &state,
        &format!("/products/{id}"),
        None,
        product_service::find_by_id(state.store.as_ref(), &id),
    )
    .await
}

/// PUT /api/v1/products/{id}: partial update, validated.
pub async fn update(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Path(id): Path<String>,
    Json(body): Json<ProductUpdate>,
) -> Result<Json<ApiResponse<Product>>, AppError> {
    let product = product_service::update(state.store.as_ref(), &state.cache, &id, body).await?;
    Ok(ApiResponse::success(product))
}

/// DELETE /api/v1/products/{id}
pub async fn delete(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<&'static str>>, AppError> {
    product_service::delete(state.store.as_ref(), &state.cache, &id).await?;
    Ok(ApiResponse::success("Product deleted"))
}
