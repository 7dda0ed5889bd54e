use axum::{
    extract::{Path, Query, State},
    routing::get,
    Extension, Json, Router,
};
use tracing::debug;
use uuid::Uuid;

use crate::controllers::event_controller::EventController;
use crate::dto::event_dto::{EventDetails, EventFilters, EventRegistered, RegisterEventRequest, UpdateEventRequest};
use crate::dto::{ApiResponse, IdQuery};
use crate::middleware::AuthenticatedManager;
use crate::models::Event;
use crate::services::ledger_audit::LedgerAuditReport;
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_event_router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(list_events)
                .post(register_event)
                .put(update_event)
                .delete(delete_event),
        )
        .route("/audit", get(audit_ledger))
        .route("/:id", get(get_event))
}

async fn register_event(
    State(state): State<AppState>,
    Extension(session): Extension<AuthenticatedManager>,
    Json(request): Json<RegisterEventRequest>,
) -> Result<Json<ApiResponse<EventRegistered>>, AppError> {
    debug!("📋 Registro de evento solicitado por {}", session.email);
    let controller = EventController::new(state.pool.clone());
    Ok(Json(controller.register(request).await?))
}

async fn list_events(
    State(state): State<AppState>,
    Query(filters): Query<EventFilters>,
) -> Result<Json<Vec<EventDetails>>, AppError> {
    let controller = EventController::new(state.pool.clone());
    Ok(Json(controller.list(filters).await?))
}

async fn get_event(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Event>, AppError> {
    let controller = EventController::new(state.pool.clone());
    Ok(Json(controller.get_by_id(id).await?))
}

async fn update_event(
    State(state): State<AppState>,
    Query(IdQuery { id }): Query<IdQuery>,
    Json(request): Json<UpdateEventRequest>,
) -> Result<Json<ApiResponse<Event>>, AppError> {
    let controller = EventController::new(state.pool.clone());
    Ok(Json(controller.update(id, request).await?))
}

async fn delete_event(
    State(state): State<AppState>,
    Query(IdQuery { id }): Query<IdQuery>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    let controller = EventController::new(state.pool.clone());
    controller.delete(id).await?;
    Ok(Json(ApiResponse::message("Evento eliminado exitosamente")))
}

async fn audit_ledger(State(state): State<AppState>) -> Result<Json<LedgerAuditReport>, AppError> {
    let controller = EventController::new(state.pool.clone());
    Ok(Json(controller.audit().await?))
}
