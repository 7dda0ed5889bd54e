//! Router de la API
//!
//! Todo lo que cuelga de `/api` exige token bearer, salvo el login.

pub mod auth_routes;
pub mod dashboard_routes;
pub mod driver_routes;
pub mod event_routes;
pub mod manager_routes;
pub mod vehicle_routes;

use axum::{middleware, response::Json, routing::get, Router};
use serde_json::{json, Value};
use tower::limit::ConcurrencyLimitLayer;
use tower_http::{compression::CompressionLayer, trace::TraceLayer};

use crate::middleware::{cors_layer, require_auth};
use crate::state::AppState;

/// Peticiones simultáneas atendidas antes de encolar
const MAX_CONCURRENT_REQUESTS: usize = 512;

pub fn create_app_router(state: AppState) -> Router {
    let protected = Router::new()
        .nest("/vehicles", vehicle_routes::create_vehicle_router())
        .nest("/drivers", driver_routes::create_driver_router())
        .nest("/managers", manager_routes::create_manager_router())
        .nest("/events", event_routes::create_event_router())
        .nest("/dashboard", dashboard_routes::create_dashboard_router())
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    let api = Router::new()
        .nest("/auth", auth_routes::create_auth_router())
        .merge(protected);

    Router::new()
        .route("/health", get(health))
        .nest("/api", api)
        .layer(CompressionLayer::new())
        .layer(ConcurrencyLimitLayer::new(MAX_CONCURRENT_REQUESTS))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&state.config.cors_origins))
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
