//! Services module
//!
//! Este módulo contiene la lógica de negocio de la aplicación: el
//! servicio transaccional de capacidad y el reporting de solo lectura.

pub mod capacity_service;
pub mod reporting_service;

pub use capacity_service::{CapacityService, NewRegistration};
pub use reporting_service::{MountainReport, ReportingService};
