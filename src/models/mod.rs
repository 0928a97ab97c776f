//! Modelos del sistema
//!
//! Este módulo contiene los documentos persistidos (Mountain, Registration)
//! y la lógica pura asociada: ledger de capacidad y máquina de estados.

pub mod mountain;
pub mod registration;

pub use mountain::{CapacityExceeded, Mountain, Route, RouteAvailability, RouteStatus};
pub use registration::{
    CapacityEffect, InvalidTransition, Registration, RegistrationEvent, RegistrationStatus,
};
