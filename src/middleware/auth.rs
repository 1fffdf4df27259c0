//! Session-cookie authentication extractor for Axum handlers.

use axum::{extract::FromRequestParts, http::request::Parts};
use axum_extra::extract::cookie::CookieJar;

use crate::errors::AppError;
use crate::services::auth::SESSION_COOKIE_NAME;
use crate::AppState;

/// Signed-in identity extracted from the `__session` cookie.
///
/// Only proves the cookie is valid and the account enabled; use
/// [`RequireAdmin`](crate::middleware::rbac::RequireAdmin) on admin routes.
#[derive(Debug, Clone)]
pub struct CurrentSession {
    pub uid: String,
    pub email: Option<String>,
    pub expires_at: i64,
}

impl FromRequestParts<AppState> for CurrentSession {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let cookie = jar
            .get(SESSION_COOKIE_NAME)
            .map(|c| c.value().to_string())
            .filter(|v| !v.is_empty())
            .ok_or(AppError::Unauthorized)?;

        let claims = state.identity.verify_session_cookie(&cookie).await?;

        Ok(CurrentSession {
            uid: claims.sub,
            email: claims.email,
            expires_at: claims.exp,
        })
    }
}
