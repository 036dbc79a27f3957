use axum::{extract::State, response::IntoResponse, routing::get, Json, Router};
use serde_json::json;

use crate::{errors::ServiceError, AppState};

pub fn dashboard_router() -> Router<AppState> {
    Router::new().route("/dashboard", get(get_dashboard))
}

/// Daily statistics, queue summary, inventory alerts, and recent activity
#[utoipa::path(
    get,
    path = "/pharmacist/dashboard",
    responses(
        (status = 200, description = "Dashboard data returned"),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse)
    ),
    tag = "dashboard"
)]
pub async fn get_dashboard(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ServiceError> {
    let overview = state.services.dashboard.overview().await?;

    Ok(Json(json!({ "success": true, "dashboard": overview })))
}
