//! Route definitions for the wellness admin API.

pub mod auth;
pub mod bookings;
pub mod dashboard;
pub mod health;
pub mod orders;
pub mod products;
pub mod reviews;
pub mod therapists;
pub mod users;

use std::future::Future;

use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderValue, Method};
use axum::routing::{delete, get, patch, post};
use axum::{Json, Router};
use serde::Serialize;
use serde_json::Value;
use tower::ServiceBuilder;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::errors::{ApiResponse, AppError};
use crate::AppState;

/// Maximum accepted request body.
const BODY_LIMIT_BYTES: usize = 1024 * 1024;

/// Serve a page from the page cache, or load, cache and serve it.
///
/// `path` is the logical page (`/bookings`, `/bookings/{id}`) that mutations
/// invalidate; `query` distinguishes filtered and paged variants.
pub(crate) async fn cached<T, F>(
    state: &AppState,
    path: &str,
    query: Option<&str>,
    load: F,
) -> Result<Json<ApiResponse<Value>>, AppError>
where
    T: Serialize,
    F: Future<Output = Result<T, AppError>>,
{
    let variant = query.unwrap_or("");
    if let Some(hit) = state.cache.get(path, variant).await {
        return Ok(ApiResponse::success(hit));
    }

    let value = serde_json::to_value(load.await?)
        .map_err(|e| AppError::Internal(format!("Response encoding failed: {e}")))?;
    state.cache.put(path, variant, &value).await;
    Ok(ApiResponse::success(value))
}

fn cors_layer(frontend_url: &str) -> CorsLayer {
    let origin = match frontend_url.parse::<HeaderValue>() {
        Ok(origin) => AllowOrigin::exact(origin),
        Err(e) => {
            tracing::warn!(frontend_url, error = %e, "Invalid FRONTEND_URL, CORS disabled");
            AllowOrigin::list(Vec::<HeaderValue>::new())
        }
    };
    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([header::CONTENT_TYPE])
        .allow_credentials(true)
}

/// Build the full application router.
pub fn router(state: AppState) -> Router {
    let auth_routes = Router::new()
        .route("/auth/login", post(auth::login))
        .route("/auth/session", post(auth::session))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/me", get(auth::me));

    let dashboard_routes = Router::new().route("/dashboard/metrics", get(dashboard::metrics));

    let user_routes = Router::new()
        .route("/users", get(users::list))
        .route("/users/{id}", get(users::get_by_id).patch(users::update))
        .route("/users/{id}/deactivate", post(users::deactivate))
        .route("/users/{id}/reactivate", post(users::reactivate))
        .route("/users/{id}/reset-password", post(users::reset_password));

    let therapist_routes = Router::new()
        .route("/therapists", get(therapists::list))
        .route(
            "/therapists/{id}",
            get(therapists::get_by_id).patch(therapists::update),
        )
        .route("/therapists/{id}/verify", post(therapists::verify))
        .route("/therapists/{id}/reject", post(therapists::reject))
        .route("/therapists/{id}/reviews", post(reviews::create))
        .route(
            "/therapists/{id}/reviews/{review_id}",
            delete(reviews::remove),
        )
        .route(
            "/therapists/{id}/reviews/{review_id}/flag",
            post(reviews::flag),
        )
        .route(
            "/therapists/{id}/reviews/{review_id}/unflag",
            post(reviews::unflag),
        );

    let booking_routes = Router::new()
        .route("/bookings", get(bookings::list))
        .route("/bookings/{id}", get(bookings::get_by_id))
        .route("/bookings/{id}/status", patch(bookings::update_status));

    let order_routes = Router::new()
        .route("/orders", get(orders::list))
        .route("/orders/{id}", get(orders::get_by_id))
        .route("/orders/{id}/status", patch(orders::update_status));

    let product_routes = Router::new()
        .route("/products", get(products::list).post(products::create))
        .route(
            "/products/{id}",
            get(products::get_by_id)
                .put(products::update)
                .delete(products::delete),
        );

    let review_routes = Router::new().route("/reviews", get(reviews::list));

    let api = Router::new()
        .merge(auth_routes)
        .merge(dashboard_routes)
        .merge(user_routes)
        .merge(therapist_routes)
        .merge(booking_routes)
        .merge(order_routes)
        .merge(product_routes)
        .merge(review_routes);

    Router::new()
        .route("/health/live", get(health::live))
        .route("/health/ready", get(health::ready))
        .nest("/api/v1", api)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer(&state.config.frontend_url))
                .layer(CompressionLayer::new()),
        )
        .layer(DefaultBodyLimit::max(BODY_LIMIT_BYTES))
        .with_state(state)
}
