//! Administrator access control extractor for Axum handlers.

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::errors::AppError;
use crate::middleware::auth::CurrentSession;
use crate::services::auth as auth_service;
use crate::AppState;

/// Extractor that requires the session's uid to have an admin entry.
#[derive(Debug, Clone)]
pub struct RequireAdmin(pub CurrentSession);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let session = CurrentSession::from_request_parts(parts, state).await?;
        if !auth_service::is_admin(state.store.as_ref(), &session.uid).await? {
            return Err(AppError::Forbidden("Admin access required".to_string()));
        }
        Ok(RequireAdmin(session))
    }
}
