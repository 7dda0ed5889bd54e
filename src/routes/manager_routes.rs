use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use uuid::Uuid;

use crate::controllers::manager_controller::ManagerController;
use crate::dto::manager_dto::{CreateManagerRequest, UpdateManagerRequest};
use crate::dto::{ApiResponse, IdQuery, SearchQuery};
use crate::models::Manager;
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_manager_router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(list_managers)
                .post(create_manager)
                .put(update_manager)
                .delete(delete_manager),
        )
        .route("/:id", get(get_manager))
}

async fn create_manager(
    State(state): State<AppState>,
    Json(request): Json<CreateManagerRequest>,
) -> Result<Json<ApiResponse<Manager>>, AppError> {
    let controller = ManagerController::new(state.pool.clone());
    Ok(Json(controller.create(request).await?))
}

async fn get_manager(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Manager>, AppError> {
    let controller = ManagerController::new(state.pool.clone());
    Ok(Json(controller.get_by_id(id).await?))
}

async fn list_managers(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<Manager>>, AppError> {
    let controller = ManagerController::new(state.pool.clone());
    Ok(Json(controller.list(query.pattern().as_deref()).await?))
}

async fn update_manager(
    State(state): State<AppState>,
    Query(IdQuery { id }): Query<IdQuery>,
    Json(request): Json<UpdateManagerRequest>,
) -> Result<Json<ApiResponse<Manager>>, AppError> {
    let controller = ManagerController::new(state.pool.clone());
    Ok(Json(controller.update(id, request).await?))
}

async fn delete_manager(
    State(state): State<AppState>,
    Query(IdQuery { id }): Query<IdQuery>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    let controller = ManagerController::new(state.pool.clone());
    controller.delete(id).await?;
    Ok(Json(ApiResponse::message("Gestor eliminado exitosamente")))
}
