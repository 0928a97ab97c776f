//! DTOs de inscripciones

use crate::models::{Registration, RegistrationStatus};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Request para crear una inscripción. Debe traer `route_id` o, para
/// clientes viejos que todavía no lo conocen, `route_name`.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateRegistrationRequest {
    #[validate(length(min = 1, max = 64))]
    pub user_id: String,

    #[validate(length(min = 1, max = 64))]
    pub mountain_id: String,

    #[validate(length(min = 1, max = 64))]
    pub route_id: Option<String>,

    #[validate(length(min = 1, max = 120))]
    pub route_name: Option<String>,
}

/// Response de inscripción para la API
#[derive(Debug, Serialize)]
pub struct RegistrationResponse {
    pub registration_id: String,
    pub user_id: String,
    pub mountain_id: String,
    pub route_id: Option<String>,
    pub route_name: String,
    pub status: RegistrationStatus,
    pub created_at: String,
}

impl From<Registration> for RegistrationResponse {
    fn from(registration: Registration) -> Self {
        Self {
            registration_id: registration.registration_id.to_string(),
            user_id: registration.user_id,
            mountain_id: registration.mountain_id,
            route_id: registration.route_id,
            route_name: registration.route_name,
            status: registration.status,
            created_at: registration.created_at.to_rfc3339(),
        }
    }
}
