//! Modelo de Mountain y Route
//!
//! Este módulo contiene el documento Mountain con sus rutas embebidas y la
//! lógica pura de capacidad: disponibilidad, reserva y liberación de cupos.
//! Toda la semántica transaccional vive una capa arriba, en el servicio.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Estado de la ruta - una ruta cerrada bloquea nuevas aprobaciones
/// sin importar el cupo restante
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RouteStatus {
    #[default]
    Open,
    Closed,
}

/// Disponibilidad derivada de una ruta
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteAvailability {
    Available,
    Full,
    Closed,
}

/// Error de reserva: la ruta no admite un cupo adicional.
/// Conserva la disponibilidad que bloqueó la reserva para que el
/// servicio pueda distinguir "llena" de "cerrada".
#[derive(Debug, Error, PartialEq, Eq)]
#[error("route '{route}' cannot accept a reservation: {availability:?}")]
pub struct CapacityExceeded {
    pub route: String,
    pub availability: RouteAvailability,
}

/// Ruta embebida dentro de un documento Mountain.
/// Los documentos legacy pueden venir sin `routeId`, sin `usedCapacity`
/// y sin `status`; los defaults de serde resuelven esos campos una sola
/// vez en la frontera con el store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Route {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route_id: Option<String>,
    pub name: String,
    pub max_capacity: u32,
    #[serde(default)]
    pub used_capacity: u32,
    #[serde(default)]
    pub status: RouteStatus,
}

impl Route {
    /// Cupo restante, nunca negativo aunque el almacenamiento tenga drift
    pub fn remaining_capacity(&self) -> u32 {
        self.max_capacity.saturating_sub(self.used_capacity)
    }

    pub fn is_full(&self) -> bool {
        self.remaining_capacity() == 0
    }

    pub fn is_available(&self) -> bool {
        self.availability() == RouteAvailability::Available
    }

    pub fn availability(&self) -> RouteAvailability {
        if self.status == RouteStatus::Closed {
            RouteAvailability::Closed
        } else if self.is_full() {
            RouteAvailability::Full
        } else {
            RouteAvailability::Available
        }
    }

    /// Reserva un cupo: devuelve una copia con `usedCapacity + 1`.
    /// Requiere que la ruta esté disponible.
    pub fn reserve(&self) -> Result<Route, CapacityExceeded> {
        match self.availability() {
            RouteAvailability::Available => Ok(Route {
                used_capacity: self.used_capacity + 1,
                ..self.clone()
            }),
            availability => Err(CapacityExceeded {
                route: self.name.clone(),
                availability,
            }),
        }
    }

    /// Libera un cupo: devuelve una copia con `usedCapacity - 1`, con
    /// clamp en cero. Un cupo previamente aprobado siempre es liberable,
    /// incluso después de una reparación que ya bajó el contador.
    pub fn release(&self) -> Route {
        Route {
            used_capacity: self.used_capacity.saturating_sub(1),
            ..self.clone()
        }
    }
}

/// Documento Mountain con su lista ordenada de rutas embebidas
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Mountain {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub routes: Vec<Route>,
}

impl Mountain {
    /// Resuelve una ruta embebida a partir de una referencia débil.
    ///
    /// `routeId` es autoritativo: si la referencia lo trae, solo se acepta
    /// una coincidencia exacta de id. El match por `name` queda únicamente
    /// como fallback para referencias legacy que no traen id; un rename
    /// nunca redirige una referencia que sí tiene `routeId`.
    pub fn find_route(&self, route_id: Option<&str>, name: Option<&str>) -> Option<usize> {
        if let Some(route_id) = route_id {
            return self
                .routes
                .iter()
                .position(|r| r.route_id.as_deref() == Some(route_id));
        }
        name.and_then(|name| self.routes.iter().position(|r| r.name == name))
    }

    pub fn route(&self, route_id: Option<&str>, name: Option<&str>) -> Option<&Route> {
        self.find_route(route_id, name).map(|idx| &self.routes[idx])
    }
}
