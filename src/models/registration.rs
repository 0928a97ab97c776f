//! Modelo de Registration y su máquina de estados
//!
//! Una inscripción nace PENDING sin reservar cupo; solo la aprobación
//! ejecuta la reserva vinculante. Las transiciones válidas y su efecto
//! sobre la capacidad están codificadas en `apply`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// Estado de una inscripción
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RegistrationStatus {
    Pending,
    Approved,
    Rejected,
    Cancelled,
}

/// Evento aplicable a una inscripción
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationEvent {
    Approve,
    Reject,
    Cancel,
}

impl fmt::Display for RegistrationEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistrationEvent::Approve => write!(f, "approve"),
            RegistrationEvent::Reject => write!(f, "reject"),
            RegistrationEvent::Cancel => write!(f, "cancel"),
        }
    }
}

/// Efecto de una transición sobre el contador de la ruta referenciada
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapacityEffect {
    None,
    Reserve,
    Release,
}

/// Transición inválida según la máquina de estados
#[derive(Debug, Error, PartialEq, Eq)]
#[error("cannot {event} a registration in status {from:?}")]
pub struct InvalidTransition {
    pub from: RegistrationStatus,
    pub event: RegistrationEvent,
}

/// Inscripción de un usuario a una ruta específica.
/// `routeId` puede faltar en datos legacy; `routeName` se guarda
/// denormalizado como fallback de resolución.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    pub registration_id: Uuid,
    pub user_id: String,
    pub mountain_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route_id: Option<String>,
    pub route_name: String,
    pub status: RegistrationStatus,
    pub created_at: DateTime<Utc>,
}

impl Registration {
    pub fn new(
        user_id: String,
        mountain_id: String,
        route_id: Option<String>,
        route_name: String,
    ) -> Self {
        Self {
            registration_id: Uuid::new_v4(),
            user_id,
            mountain_id,
            route_id,
            route_name,
            status: RegistrationStatus::Pending,
            created_at: Utc::now(),
        }
    }

    /// Aplica un evento y devuelve la inscripción resultante junto con el
    /// efecto de capacidad que el servicio debe ejecutar en la misma
    /// transacción. Cualquier combinación fuera de la tabla falla.
    pub fn apply(
        &self,
        event: RegistrationEvent,
    ) -> Result<(Registration, CapacityEffect), InvalidTransition> {
        use RegistrationEvent::*;
        use RegistrationStatus::*;

        let (next, effect) = match (self.status, event) {
            (Pending, Approve) => (Approved, CapacityEffect::Reserve),
            (Pending, Reject) => (Rejected, CapacityEffect::None),
            (Pending, Cancel) => (Cancelled, CapacityEffect::None),
            (Approved, Cancel) => (Cancelled, CapacityEffect::Release),
            (from, event) => return Err(InvalidTransition { from, event }),
        };

        let mut updated = self.clone();
        updated.status = next;
        Ok((updated, effect))
    }
}
