use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};

use crate::controllers::registration_controller::RegistrationController;
use crate::dto::registration_dto::{CreateRegistrationRequest, RegistrationResponse};
use crate::dto::ApiResponse;
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_registration_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create))
        .route("/:id/approve", post(approve))
        .route("/:id/reject", post(reject))
        .route("/:id/cancel", post(cancel))
        .route("/mountain/:mountain_id", get(list_by_mountain))
}

async fn create(
    State(state): State<AppState>,
    Json(request): Json<CreateRegistrationRequest>,
) -> Result<Json<ApiResponse<RegistrationResponse>>, AppError> {
    let controller = RegistrationController::new(&state);
    let response = controller.create(request).await?;
    Ok(Json(response))
}

async fn approve(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<RegistrationResponse>>, AppError> {
    let controller = RegistrationController::new(&state);
    let response = controller.approve(&id).await?;
    Ok(Json(response))
}

async fn reject(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<RegistrationResponse>>, AppError> {
    let controller = RegistrationController::new(&state);
    let response = controller.reject(&id).await?;
    Ok(Json(response))
}

async fn cancel(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<RegistrationResponse>>, AppError> {
    let controller = RegistrationController::new(&state);
    let response = controller.cancel(&id).await?;
    Ok(Json(response))
}

async fn list_by_mountain(
    State(state): State<AppState>,
    Path(mountain_id): Path<String>,
) -> Result<Json<ApiResponse<Vec<RegistrationResponse>>>, AppError> {
    let controller = RegistrationController::new(&state);
    let response = controller.list_by_mountain(&mountain_id).await?;
    Ok(Json(response))
}
