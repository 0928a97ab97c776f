//! DTOs de montañas y rutas

use crate::models::{Mountain, Route, RouteStatus};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Request para crear o reemplazar una montaña (consola admin)
#[derive(Debug, Deserialize, Validate)]
pub struct PutMountainRequest {
    #[validate(length(min = 1, max = 120))]
    pub name: String,

    pub description: Option<String>,

    #[validate]
    #[serde(default)]
    pub routes: Vec<RouteInput>,
}

/// Entrada de ruta dentro de un PutMountainRequest. El `route_id` se
/// asigna en el servicio si no viene.
#[derive(Debug, Deserialize, Validate)]
pub struct RouteInput {
    pub route_id: Option<String>,

    #[validate(length(min = 1, max = 120))]
    pub name: String,

    pub max_capacity: u32,

    #[serde(default)]
    pub used_capacity: u32,

    #[serde(default)]
    pub status: RouteStatus,
}

impl From<PutMountainRequest> for Mountain {
    fn from(request: PutMountainRequest) -> Self {
        Mountain {
            name: request.name,
            description: request.description,
            routes: request
                .routes
                .into_iter()
                .map(|r| Route {
                    route_id: r.route_id,
                    name: r.name,
                    max_capacity: r.max_capacity,
                    used_capacity: r.used_capacity,
                    status: r.status,
                })
                .collect(),
        }
    }
}

/// Request para redimensionar una ruta existente
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateRouteCapacityRequest {
    pub max_capacity: u32,
    pub status: Option<RouteStatus>,
}

/// Response de ruta con los campos derivados que consumen las pantallas
#[derive(Debug, Serialize)]
pub struct RouteResponse {
    pub route_id: Option<String>,
    pub name: String,
    pub max_capacity: u32,
    pub used_capacity: u32,
    pub remaining_capacity: u32,
    pub status: RouteStatus,
    pub is_available: bool,
    pub is_full: bool,
}

impl From<&Route> for RouteResponse {
    fn from(route: &Route) -> Self {
        Self {
            route_id: route.route_id.clone(),
            name: route.name.clone(),
            max_capacity: route.max_capacity,
            used_capacity: route.used_capacity,
            remaining_capacity: route.remaining_capacity(),
            status: route.status,
            is_available: route.is_available(),
            is_full: route.is_full(),
        }
    }
}

/// Response de montaña para la API
#[derive(Debug, Serialize)]
pub struct MountainResponse {
    pub mountain_id: String,
    pub name: String,
    pub description: Option<String>,
    pub routes: Vec<RouteResponse>,
}

impl MountainResponse {
    pub fn from_mountain(mountain_id: &str, mountain: Mountain) -> Self {
        Self {
            mountain_id: mountain_id.to_string(),
            name: mountain.name,
            description: mountain.description,
            routes: mountain.routes.iter().map(RouteResponse::from).collect(),
        }
    }
}
