use axum::{
    extract::{Path, State},
    routing::{get, post, put},
    Json, Router,
};

use crate::controllers::mountain_controller::MountainController;
use crate::dto::mountain_dto::{
    MountainResponse, PutMountainRequest, RouteResponse, UpdateRouteCapacityRequest,
};
use crate::dto::ApiResponse;
use crate::services::reporting_service::MountainReport;
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_mountain_router() -> Router<AppState> {
    Router::new()
        .route("/:id", get(get_mountain).put(put_mountain))
        .route("/:id/route/:route_id/capacity", put(update_route_capacity))
        .route("/:id/reconcile", post(reconcile))
        .route("/:id/report", get(report))
}

async fn get_mountain(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<MountainResponse>>, AppError> {
    let controller = MountainController::new(&state);
    let response = controller.get(&id).await?;
    Ok(Json(response))
}

async fn put_mountain(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<PutMountainRequest>,
) -> Result<Json<ApiResponse<MountainResponse>>, AppError> {
    let controller = MountainController::new(&state);
    let response = controller.put(&id, request).await?;
    Ok(Json(response))
}

async fn update_route_capacity(
    State(state): State<AppState>,
    Path((id, route_id)): Path<(String, String)>,
    Json(request): Json<UpdateRouteCapacityRequest>,
) -> Result<Json<ApiResponse<RouteResponse>>, AppError> {
    let controller = MountainController::new(&state);
    let response = controller.update_route_capacity(&id, &route_id, request).await?;
    Ok(Json(response))
}

async fn reconcile(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<MountainResponse>>, AppError> {
    let controller = MountainController::new(&state);
    let response = controller.reconcile(&id).await?;
    Ok(Json(response))
}

async fn report(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<MountainReport>>, AppError> {
    let controller = MountainController::new(&state);
    let response = controller.report(&id).await?;
    Ok(Json(response))
}
