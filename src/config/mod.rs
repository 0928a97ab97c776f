//! Configuración del proyecto
//!
//! Este módulo contiene la configuración de variables de entorno
//! y la selección de backend del document store.

pub mod environment;

pub use environment::*;
