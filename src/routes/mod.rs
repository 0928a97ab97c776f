//! Routers de la API

pub mod mountain_routes;
pub mod registration_routes;

use axum::{response::Json, routing::get, Router};
use serde_json::json;

use crate::state::AppState;

/// Router principal con todos los endpoints de la API
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .nest(
            "/api/registration",
            registration_routes::create_registration_router(),
        )
        .nest("/api/mountain", mountain_routes::create_mountain_router())
}

/// Health check simple
async fn health() -> Json<serde_json::Value> {
    Json(json!({
        "service": "hiking-registration",
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}
