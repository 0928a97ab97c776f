//! Controllers de la API
//!
//! Capa fina entre los handlers de axum y los servicios: validación de
//! requests y armado de responses.

pub mod mountain_controller;
pub mod registration_controller;

pub use mountain_controller::MountainController;
pub use registration_controller::RegistrationController;
