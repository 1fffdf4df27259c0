//! User routes: directory, profile edits, sign-in control and password resets.

use axum::{
    extract::{Path, Query, RawQuery, State},
    Json,
};
use serde_json::Value;

use crate::errors::{ApiResponse, AppError};
use crate::middleware::rbac::RequireAdmin;
use crate::models::pagination::Pagination;
use crate::models::user::{UpdateUser, UserProfile};
use crate::routes::cached;
use crate::services::user::{self as user_service, PasswordResetLink, UserFilters};
use crate::AppState;

/// GET /api/v1/users: newest signup first, optional search.
pub async fn list(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    RawQuery(query): RawQuery,
    Query(pagination): Query<Pagination>,
    Query(filters): Query<UserFilters>,
) -> Result<Json<ApiResponse<Value>>, AppError> {
    cached(
        &state,
        "/users",
        query.as_deref(),
        user_service::list(state.store.as_ref(), &filters, &pagination),
    )
    .await
}

/// GET /api/v1/users/{id}: profile, sign-in status and bookings.
pub async fn get_by_id(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Value>>, AppError> {
    cached(
        &state,
        &format!("/users/{id}"),
        None,
        user_service::find_by_id(state.store.as_ref(), state.identity.as_ref(), &id),
    )
    .await
}

/// PATCH /api/v1/users/{id}
pub async fn update(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Path(id): Path<String>,
    Json(body): Json<UpdateUser>,
) -> Result<Json<ApiResponse<UserProfile>>, AppError> {
    let user = user_service::update(
        state.store.as_ref(),
        &state.cache,
        &id,
        body,
        state.clock.now(),
    )
    .await?;
    Ok(ApiResponse::success(user))
}

/// POST /api/v1/users/{id}/deactivate
pub async fn deactivate(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<&'static str>>, AppError> {
    if admin.uid == id {
        return Err(AppError::Validation(
            "Cannot deactivate your own account".to_string(),
        ));
    }
    user_service::set_disabled(state.identity.as_ref(), &state.cache, &id, true).await?;
    Ok(ApiResponse::success("User deactivated"))
}

/// POST /api/v1/users/{id}/reactivate
pub async fn reactivate(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<&'static str>>, AppError> {
    user_service::set_disabled(state.identity.as_ref(), &state.cache, &id, false).await?;
    Ok(ApiResponse::success("User reactivated"))
}

/// POST /api/v1/users/{id}/reset-password: returns a shareable reset link.
pub async fn reset_password(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<PasswordResetLink>>, AppError> {
    let link = user_service::reset_password(state.identity.as_ref(), &id).await?;
    Ok(ApiResponse::success(link))
}
