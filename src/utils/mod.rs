//! Utilidades del sistema
//!
//! Este módulo contiene utilidades para manejo de errores y la política
//! de reintentos con backoff.

pub mod backoff;
pub mod errors;

pub use backoff::RetryConfig;
pub use errors::{AppError, AppResult};
