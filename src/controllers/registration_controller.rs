//! Controller de inscripciones
//!
//! Valida requests y delega en el servicio de capacidad. Tanto la app
//! móvil como la consola admin pasan por acá: hay una sola copia de la
//! lógica de aprobación.

use crate::dto::registration_dto::{CreateRegistrationRequest, RegistrationResponse};
use crate::dto::ApiResponse;
use crate::services::capacity_service::{CapacityService, NewRegistration};
use crate::state::AppState;
use crate::utils::errors::AppError;
use validator::Validate;

pub struct RegistrationController {
    service: CapacityService,
}

impl RegistrationController {
    pub fn new(state: &AppState) -> Self {
        Self {
            service: CapacityService::new(state.store.clone(), state.config.retry.clone()),
        }
    }

    pub async fn create(
        &self,
        request: CreateRegistrationRequest,
    ) -> Result<ApiResponse<RegistrationResponse>, AppError> {
        request.validate()?;

        if request.route_id.is_none() && request.route_name.is_none() {
            return Err(AppError::BadRequest(
                "either route_id or route_name is required".to_string(),
            ));
        }

        let registration = self
            .service
            .create_registration(NewRegistration {
                user_id: request.user_id,
                mountain_id: request.mountain_id,
                route_id: request.route_id,
                route_name: request.route_name,
            })
            .await?;

        Ok(ApiResponse::success_with_message(
            registration.into(),
            "Inscripción creada, pendiente de aprobación".to_string(),
        ))
    }

    pub async fn approve(
        &self,
        registration_id: &str,
    ) -> Result<ApiResponse<RegistrationResponse>, AppError> {
        let registration = self.service.approve(registration_id).await?;
        Ok(ApiResponse::success(registration.into()))
    }

    pub async fn reject(
        &self,
        registration_id: &str,
    ) -> Result<ApiResponse<RegistrationResponse>, AppError> {
        let registration = self.service.reject(registration_id).await?;
        Ok(ApiResponse::success(registration.into()))
    }

    pub async fn cancel(
        &self,
        registration_id: &str,
    ) -> Result<ApiResponse<RegistrationResponse>, AppError> {
        let registration = self.service.cancel(registration_id).await?;
        Ok(ApiResponse::success(registration.into()))
    }

    pub async fn list_by_mountain(
        &self,
        mountain_id: &str,
    ) -> Result<ApiResponse<Vec<RegistrationResponse>>, AppError> {
        let registrations = self.service.list_registrations(mountain_id).await?;
        Ok(ApiResponse::success(
            registrations
                .into_iter()
                .map(RegistrationResponse::from)
                .collect(),
        ))
    }
}
