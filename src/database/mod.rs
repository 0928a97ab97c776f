//! Módulo de base de datos
//!
//! Maneja la conexión con PostgreSQL para el backend persistente del
//! document store.

pub mod connection;
