//! Shared application state
//!
//! Este módulo define el estado compartido de la aplicación que se pasa
//! a través del router de Axum. No hay estado mutable propio: toda la
//! contención vive en el document store.

use std::sync::Arc;

use crate::config::environment::EnvironmentConfig;
use crate::store::DocumentStore;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DocumentStore>,
    pub config: EnvironmentConfig,
}

impl AppState {
    pub fn new(store: Arc<dyn DocumentStore>, config: EnvironmentConfig) -> Self {
        Self { store, config }
    }
}
