use axum::{extract::State, response::IntoResponse, routing::get, Router};
use std::sync::Arc;

use crate::{
    errors::ApiError,
    handlers::common::{map_service_error, success_response},
    services::dashboard::DashboardSummary,
    AppState,
};

#[utoipa::path(
    get,
    path = "/api/dashboard",
    responses(
        (status = 200, description = "Today's and this month's figures", body = DashboardSummary),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "dashboard"
)]
pub async fn dashboard(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    let summary = state
        .services
        .dashboard
        .summary()
        .await
        .map_err(map_service_error)?;
    Ok(success_response(summary))
}

pub fn dashboard_routes() -> Router<Arc<AppState>> {
    Router::new().route("/", get(dashboard))
}
