use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};

use crate::controllers::dashboard_controller::DashboardController;
use crate::dto::dashboard_dto::AlertsQuery;
use crate::services::dashboard_service::{DashboardSummary, ExpiryAlert};
use crate::state::AppState;
use crate::utils::errors::{field_error, AppError};

pub fn create_dashboard_router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_summary))
        .route("/alerts", get(get_alerts))
}

async fn get_summary(State(state): State<AppState>) -> Result<Json<DashboardSummary>, AppError> {
    let controller = DashboardController::new(state.pool.clone());
    Ok(Json(controller.summary(state.config.expiry_alert_days).await?))
}

async fn get_alerts(
    State(state): State<AppState>,
    Query(query): Query<AlertsQuery>,
) -> Result<Json<Vec<ExpiryAlert>>, AppError> {
    let days = query.days.unwrap_or(state.config.expiry_alert_days);
    if !(0..=365).contains(&days) {
        return Err(field_error("days", "La ventana debe estar entre 0 y 365 días"));
    }

    let controller = DashboardController::new(state.pool.clone());
    Ok(Json(controller.alerts(days).await?))
}
