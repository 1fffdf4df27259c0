//! Review moderation routes.

use axum::{
    extract::{Path, Query, RawQuery, State},
    Json,
};
use serde::Serialize;
use serde_json::Value;

use crate::errors::{ApiResponse, AppError};
use crate::middleware::rbac::RequireAdmin;
use crate::models::pagination::Pagination;
use crate::models::therapist::{CreateReview, Review};
use crate::routes::cached;
use crate::services::review::{self as review_service, ReviewFilters};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct RemovedReviews {
    pub removed: usize,
}

/// GET /api/v1/reviews: all reviews across therapists, optional flagged filter.
pub async fn list(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    RawQuery(query): RawQuery,
    Query(pagination): Query<Pagination>,
    Query(filters): Query<ReviewFilters>,
) -> Result<Json<ApiResponse<Value>>, AppError> {
    cached(
        &state,
        "/reviews",
        query.as_deref(),
        review_service::list(state.store.as_ref(), &filters, &pagination),
    )
    .await
}

/// POST /api/v1/therapists/{id}/reviews
pub async fn create(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Path(id): Path<String>,
    Json(body): Json<CreateReview>,
) -> Result<Json<ApiResponse<Review>>, AppError> {
    let review = review_service::add_review(
        state.store.as_ref(),
        &state.cache,
        &id,
        body,
        state.clock.now(),
    )
    .await?;
    Ok(ApiResponse::success(review))
}

/// POST /api/v1/therapists/{id}/reviews/{review_id}/flag
pub async fn flag(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Path((id, review_id)): Path<(String, String)>,
) -> Result<Json<ApiResponse<&'static str>>, AppError> {
    review_service::set_flag(state.store.as_ref(), &state.cache, &id, &review_id, true).await?;
    Ok(ApiResponse::success("Review flagged"))
}

/// POST /api/v1/therapists/{id}/reviews/{review_id}/unflag
pub async fn unflag(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Path((id, review_id)): Path<(String, String)>,
) -> Result<Json<ApiResponse<&'static str>>, AppError> {
    review_service::set_flag(state.store.as_ref(), &state.cache, &id, &review_id, false).await?;
    Ok(ApiResponse::success("Review unflagged"))
}

/// DELETE /api/v1/therapists/{id}/reviews/{review_id}
pub async fn remove(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Path((id, review_id)): Path<(String, String)>,
) -> Result<Json<ApiResponse<RemovedReviews>>, AppError> {
    let removed =
        review_service::remove(state.store.as_ref(), &state.cache, &id, &review_id).await?;
    Ok(ApiResponse::success(RemovedReviews { removed }))
}
