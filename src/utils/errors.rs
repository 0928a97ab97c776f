//! Sistema de manejo de errores
//!
//! Este módulo define todos los tipos de errores del sistema
//! y su conversión a respuestas HTTP apropiadas.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::models::InvalidTransition;
use crate::store::StoreError;

/// Errores principales de la aplicación.
///
/// Las violaciones lógicas (RouteFull, RouteClosed, InvalidTransition) son
/// resultados deterministas y nunca se reintentan; Contention y
/// StoreUnavailable aparecen recién cuando el presupuesto de reintentos
/// internos se agotó.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Mountain not found: {0}")]
    MountainNotFound(String),

    #[error("Route not found: {0}")]
    RouteNotFound(String),

    #[error("Registration not found: {0}")]
    RegistrationNotFound(String),

    #[error("Route is closed: {0}")]
    RouteClosed(String),

    #[error("Route is full: {0}")]
    RouteFull(String),

    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    #[error("Cannot shrink route '{route}' below its committed usage ({used_capacity} used, {new_max} requested)")]
    CapacityBelowUsage {
        route: String,
        used_capacity: u32,
        new_max: u32,
    },

    #[error("Operation aborted after {attempts} attempts due to contention")]
    Contention { attempts: u32 },

    #[error("Document store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl From<InvalidTransition> for AppError {
    fn from(e: InvalidTransition) -> Self {
        AppError::InvalidTransition(e.to_string())
    }
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        match e {
            // Los conflictos se manejan en el loop de reintentos del
            // servicio; uno que llega hasta acá es un bug
            StoreError::Conflict => {
                AppError::Internal("unexpected write conflict outside retry loop".to_string())
            }
            StoreError::Unavailable(msg) => AppError::StoreUnavailable(msg),
            StoreError::Corrupt { id, reason } => {
                AppError::Internal(format!("corrupt document '{}': {}", id, reason))
            }
        }
    }
}

/// Respuesta de error para la API
#[derive(Debug, serde::Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<String>,
}

impl AppError {
    /// Código estable que los clientes móviles usan para clasificar el error
    pub fn code(&self) -> &'static str {
        match self {
            AppError::MountainNotFound(_) => "MOUNTAIN_NOT_FOUND",
            AppError::RouteNotFound(_) => "ROUTE_NOT_FOUND",
            AppError::RegistrationNotFound(_) => "REGISTRATION_NOT_FOUND",
            AppError::RouteClosed(_) => "ROUTE_CLOSED",
            AppError::RouteFull(_) => "ROUTE_FULL",
            AppError::InvalidTransition(_) => "INVALID_TRANSITION",
            AppError::CapacityBelowUsage { .. } => "CAPACITY_BELOW_USAGE",
            AppError::Contention { .. } => "CONTENTION",
            AppError::StoreUnavailable(_) => "STORE_UNAVAILABLE",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::BadRequest(_) => "BAD_REQUEST",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            AppError::MountainNotFound(_)
            | AppError::RouteNotFound(_)
            | AppError::RegistrationNotFound(_) => StatusCode::NOT_FOUND,
            AppError::RouteClosed(_)
            | AppError::RouteFull(_)
            | AppError::InvalidTransition(_) => StatusCode::CONFLICT,
            AppError::CapacityBelowUsage { .. }
            | AppError::Validation(_)
            | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Contention { .. } | AppError::StoreUnavailable(_) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.code().to_string();

        let error_response = match &self {
            AppError::Validation(e) => ErrorResponse {
                error: "Validation Error".to_string(),
                message: "The provided data is invalid".to_string(),
                details: Some(json!(e)),
                code: Some(code),
            },
            AppError::Internal(msg) => {
                tracing::error!("❌ Error interno: {}", msg);
                ErrorResponse {
                    error: "Internal Server Error".to_string(),
                    message: "An unexpected error occurred".to_string(),
                    details: Some(json!({ "internal_error": msg })),
                    code: Some(code),
                }
            }
            AppError::StoreUnavailable(msg) => {
                tracing::error!("❌ Document store no disponible: {}", msg);
                ErrorResponse {
                    error: "Store Unavailable".to_string(),
                    message: "The document store is unavailable. Please retry".to_string(),
                    details: Some(json!({ "store_error": msg })),
                    code: Some(code),
                }
            }
            AppError::Contention { attempts } => ErrorResponse {
                error: "Contention".to_string(),
                message: "Too many concurrent updates on this route. Please retry".to_string(),
                details: Some(json!({ "attempts": attempts })),
                code: Some(code),
            },
            other => ErrorResponse {
                error: status.canonical_reason().unwrap_or("Error").to_string(),
                message: other.to_string(),
                details: None,
                code: Some(code),
            },
        };

        (status, Json(error_response)).into_response()
    }
}

/// Resultado tipado para operaciones que pueden fallar
pub type AppResult<T> = Result<T, AppError>;
