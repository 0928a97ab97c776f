//! Controller de montañas y rutas (consola admin)

use crate::dto::mountain_dto::{
    MountainResponse, PutMountainRequest, RouteResponse, UpdateRouteCapacityRequest,
};
use crate::dto::ApiResponse;
use crate::services::capacity_service::CapacityService;
use crate::services::reporting_service::{MountainReport, ReportingService};
use crate::state::AppState;
use crate::utils::errors::AppError;
use validator::Validate;

pub struct MountainController {
    service: CapacityService,
    reporting: ReportingService,
}

impl MountainController {
    pub fn new(state: &AppState) -> Self {
        Self {
            service: CapacityService::new(state.store.clone(), state.config.retry.clone()),
            reporting: ReportingService::new(state.store.clone()),
        }
    }

    pub async fn get(&self, mountain_id: &str) -> Result<ApiResponse<MountainResponse>, AppError> {
        let mountain = self.service.get_mountain(mountain_id).await?;
        Ok(ApiResponse::success(MountainResponse::from_mountain(
            mountain_id,
            mountain,
        )))
    }

    pub async fn put(
        &self,
        mountain_id: &str,
        request: PutMountainRequest,
    ) -> Result<ApiResponse<MountainResponse>, AppError> {
        request.validate()?;
        let mountain = self.service.put_mountain(mountain_id, request.into()).await?;
        Ok(ApiResponse::success_with_message(
            MountainResponse::from_mountain(mountain_id, mountain),
            "Montaña guardada".to_string(),
        ))
    }

    pub async fn update_route_capacity(
        &self,
        mountain_id: &str,
        route_id: &str,
        request: UpdateRouteCapacityRequest,
    ) -> Result<ApiResponse<RouteResponse>, AppError> {
        request.validate()?;
        let route = self
            .service
            .update_route_capacity(mountain_id, route_id, request.max_capacity, request.status)
            .await?;
        Ok(ApiResponse::success(RouteResponse::from(&route)))
    }

    pub async fn reconcile(
        &self,
        mountain_id: &str,
    ) -> Result<ApiResponse<MountainResponse>, AppError> {
        let mountain = self.service.reconcile(mountain_id).await?;
        Ok(ApiResponse::success_with_message(
            MountainResponse::from_mountain(mountain_id, mountain),
            "Contadores reconciliados contra las inscripciones aprobadas".to_string(),
        ))
    }

    pub async fn report(&self, mountain_id: &str) -> Result<ApiResponse<MountainReport>, AppError> {
        let report = self.reporting.mountain_report(mountain_id).await?;
        Ok(ApiResponse::success(report))
    }
}
