//! Motor de capacidad para inscripciones de montaña
//!
//! El backend garantiza que las aprobaciones nunca excedan el cupo
//! declarado de cada ruta, incluso con varios admins aprobando en
//! paralelo, y restaura el cupo cuando una inscripción aprobada se
//! cancela. Toda la contención se resuelve en el document store con
//! commits condicionales y reintentos; no hay locks locales.

pub mod config;
pub mod controllers;
pub mod database;
pub mod dto;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
pub mod store;
pub mod utils;

use axum::Router;
use state::AppState;

/// Arma el router completo de la aplicación sobre un estado ya construido
pub fn build_app(state: AppState) -> Router {
    let cors = if state.config.is_development() {
        middleware::cors::cors_middleware()
    } else {
        middleware::cors::cors_middleware_with_origins(&state.config.cors_origins)
    };

    routes::create_api_router().layer(cors).with_state(state)
}
