//! Order routes: list, detail and fulfilment status.

use axum::{
    extract::{Path, Query, RawQuery, State},
    Json,
};
use serde_json::Value;

use crate::errors::{ApiResponse, AppError};
use crate::middleware::rbac::RequireAdmin;
use crate::models::order::{ShopOrder, UpdateOrderStatus};
use crate::models::pagination::Pagination;
use crate::routes::cached;
use crate::services::order::{self as order_service, OrderFilters};
use crate::AppState;

/// GET /api/v1/orders: most recent first, optional status filter.
pub async fn list(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    RawQuery(query): RawQuery,
    Query(pagination): Query<Pagination>,
    Query(filters): Query<OrderFilters>,
) -> Result<Json<ApiResponse<Value>>, AppError> {
    cached(
        &state,
        "/orders",
        query.as_deref(),
        order_service::list(state.store.as_ref(), &filters, &pagination),
    )
    .await
}

/// GET /api/v1/orders/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Value>>, AppError> {
    cached(
        &state,
        &format!("/orders/{id}"),
        None,
        order_service::find_by_id(state.store.as_ref(), &id),
    )
    .await
}

/// PATCH /api/v1/orders/{id}/status
pub async fn update_status(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Path(id): Path<String>,
    Json(body): Json<UpdateOrderStatus>,
) -> Result<Json<ApiResponse<ShopOrder>>, AppError> {
    let order =
        order_service::update_status(state.store.as_ref(), &state.cache, &id, body.status).await?;
    Ok(ApiResponse::success(order))
}
