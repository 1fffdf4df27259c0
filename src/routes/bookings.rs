//! Booking routes: list, detail and status override.

use axum::{
    extract::{Path, Query, RawQuery, State},
    Json,
};
use serde_json::Value;

use crate::errors::{ApiResponse, AppError};
use crate::middleware::rbac::RequireAdmin;
use crate::models::booking::{Booking, UpdateBookingStatus};
use crate::models::pagination::Pagination;
use crate::routes::cached;
use crate::services::booking::{self as booking_service, BookingFilters};
use crate::AppState;

/// GET /api/v1/bookings: newest first, filter by status, user_id or therapist_id.
pub async fn list(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    RawQuery(query): RawQuery,
    Query(pagination): Query<Pagination>,
    Query(filters): Query<BookingFilters>,
) -> Result<Json<ApiResponse<Value>>, AppError> {
    cached(
        &state,
        "/bookings",
        query.as_deref(),
        booking_service::list(state.store.as_ref(), &filters, &pagination),
    )
    .await
}

/// GET /api/v1/bookings/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Value>>, AppError> {
    cached(
        &state,
        &format!("/bookings/{id}"),
        None,
        booking_service::find_by_id(state.store.as_ref(), &id),
    )
    .await
}

/// PATCH /api/v1/bookings/{id}/status
pub async fn update_status(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<String>,
    Json(body): Json<UpdateBookingStatus>,
) -> Result<Json<ApiResponse<Booking>>, AppError> {
    tracing::debug!(admin = %admin.uid, booking_id = %id, "Booking status change requested");
    let booking =
        booking_service::update_status(state.store.as_ref(), &state.cache, &id, body.status)
            .await?;
    Ok(ApiResponse::success(booking))
}
