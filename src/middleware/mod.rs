//! Middleware del sistema
//!
//! Este módulo contiene el middleware de CORS para las apps cliente.

pub mod cors;

pub use cors::*;
