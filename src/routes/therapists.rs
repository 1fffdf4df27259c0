//! Therapist routes: directory, profile edits and verification.

use axum::{
    extract::{Path, Query, RawQuery, State},
    Json,
};
use serde_json::Value;

use crate::errors::{ApiResponse, AppError};
use crate::middleware::rbac::RequireAdmin;
use crate::models::pagination::Pagination;
use crate::models::therapist::{Therapist, UpdateTherapist};
use crate::routes::cached;
use crate::services::therapist::{self as therapist_service, TherapistFilters};
use crate::AppState;

/// GET /api/v1/therapists: filter by verified, optional search.
pub async fn list(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    RawQuery(query): RawQuery,
    Query(pagination): Query<Pagination>,
    Query(filters): Query<TherapistFilters>,
) -> Result<Json<ApiResponse<Value>>, AppError> {
    cached(
        &state,
        "/therapists",
        query.as_deref(),
        therapist_service::list(state.store.as_ref(), &filters, &pagination),
    )
    .await
}

/// GET /api/v1/therapists/{id}: profile with reviews and bookings.
pub async fn get_by_id(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Value>>, AppError> {
    cached(
        &state,
        &format!("/therapists/{id}"),
        None,
        therapist_service::find_by_id(state.store.as_ref(), &id),
    )
    .await
}

/// PATCH /api/v1/therapists/{id}
pub async fn update(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Path(id): Path<String>,
    Json(body): Json<UpdateTherapist>,
) -> Result<Json<ApiResponse<Therapist>>, AppError> {
    let therapist = therapist_service::update(
        state.store.as_ref(),
        &state.cache,
        &id,
        body,
        state.clock.now(),
    )
    .await?;
    Ok(ApiResponse::success(therapist))
}

async fn set_verified(
    state: &AppState,
    id: &str,
    verified: bool,
) -> Result<Json<ApiResponse<Therapist>>, AppError> {
    let therapist = therapist_service::set_verified(
        state.store.as_ref(),
        &state.cache,
        id,
        verified,
        state.clock.now(),
    )
    .await?;
    Ok(ApiResponse::success(therapist))
}

/// POST /api/v1/therapists/{id}/verify
pub async fn verify(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Therapist>>, AppError> {
    set_verified(&state, &id, true).await
}

/// POST /api/v1/therapists/{id}/reject
pub async fn reject(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Therapist>>, AppError> {
    set_verified(&state, &id, false).await
}
