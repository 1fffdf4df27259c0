//! Authentication routes: password login, id-token exchange, logout, current session.

use axum::{extract::State, Json};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Deserialize;

use crate::errors::{ApiResponse, AppError};
use crate::middleware::rbac::RequireAdmin;
use crate::services::auth::{self as auth_service, AdminSession, NewSession, SESSION_COOKIE_NAME};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct SessionRequest {
    pub id_token: String,
}

fn session_cookie(state: &AppState, value: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE_NAME, value))
        .path("/")
        .http_only(true)
        .secure(state.config.is_prod())
        .same_site(SameSite::Lax)
        .max_age(time::Duration::seconds(state.config.session_expiry_secs))
        .build()
}

fn with_cookie(
    state: &AppState,
    jar: CookieJar,
    new: NewSession,
) -> (CookieJar, Json<ApiResponse<AdminSession>>) {
    let jar = jar.add(session_cookie(state, new.cookie));
    (jar, ApiResponse::success(new.session))
}

/// POST /api/v1/auth/login: password sign-in, sets the session cookie
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(body): Json<LoginRequest>,
) -> Result<(CookieJar, Json<ApiResponse<AdminSession>>), AppError> {
    let new = auth_service::login(
        state.store.as_ref(),
        state.identity.as_ref(),
        &body.email,
        &body.password,
        state.config.session_expiry_secs,
    )
    .await?;

    Ok(with_cookie(&state, jar, new))
}

/// POST /api/v1/auth/session: exchange an id token for the session cookie
pub async fn session(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(body): Json<SessionRequest>,
) -> Result<(CookieJar, Json<ApiResponse<AdminSession>>), AppError> {
    let new = auth_service::create_session(
        state.store.as_ref(),
        state.identity.as_ref(),
        &body.id_token,
        state.config.session_expiry_secs,
    )
    .await?;

    Ok(with_cookie(&state, jar, new))
}

/// POST /api/v1/auth/logout: clears the session cookie
pub async fn logout(jar: CookieJar) -> (CookieJar, Json<ApiResponse<&'static str>>) {
    let jar = jar.remove(Cookie::build(SESSION_COOKIE_NAME).path("/"));
    (jar, ApiResponse::success("Logged out successfully"))
}

/// GET /api/v1/auth/me: current admin session
pub async fn me(RequireAdmin(session): RequireAdmin) -> Json<ApiResponse<AdminSession>> {
    ApiResponse::success(AdminSession {
        uid: session.uid,
        email: session.email,
        expires_at: session.expires_at,
    })
}
