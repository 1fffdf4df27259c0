//! Dashboard routes: the consolidated metrics for the overview page.

use axum::{extract::State, Json};

use crate::errors::{ApiResponse, AppError};
use crate::middleware::rbac::RequireAdmin;
use crate::services::dashboard::{self, DashboardMetrics};
use crate::AppState;

/// GET /api/v1/dashboard/metrics: KPIs, trends, breakdowns, rankings and activity.
pub async fn metrics(
    State(state): State<AppState>,
    _admin: RequireAdmin,
) -> Result<Json<ApiResponse<DashboardMetrics>>, AppError> {
    let metrics = dashboard::get_metrics(
        state.store.as_ref(),
        state.clock.now(),
        state.config.store_timeout(),
    )
    .await?;
    Ok(ApiResponse::success(metrics))
}
