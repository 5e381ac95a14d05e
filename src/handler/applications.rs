// handler/applications.rs
use std::sync::Arc;

use axum::{
    extract::Path,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, put},
    Extension, Json, Router,
};
use serde_json::json;
use uuid::Uuid;

use crate::{
    dtos::missiondtos::DecisionDto,
    error::HttpError,
    middleware::JWTAuthMiddeware,
    AppState,
};

pub fn applications_handler() -> Router {
    Router::new()
        .route("/mine", get(my_applications))
        .route("/:application_id/decision", put(decide_application))
}

pub async fn apply_to_mission(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Path(mission_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let application = app_state
        .application_service
        .apply(mission_id, &user.actor())
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "status": "success",
            "data": application
        })),
    ))
}

pub async fn list_mission_applications(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Path(mission_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let applications = app_state
        .application_service
        .list_for_mission(mission_id, &user.actor())
        .await?;

    Ok(Json(json!({
        "status": "success",
        "results": applications.len(),
        "data": applications
    })))
}

pub async fn accepted_application(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Path(mission_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let application = app_state
        .application_service
        .accepted_for(mission_id, &user.actor())
        .await?;

    Ok(Json(json!({
        "status": "success",
        "data": application
    })))
}

pub async fn decide_application(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Path(application_id): Path<Uuid>,
    Json(body): Json<DecisionDto>,
) -> Result<impl IntoResponse, HttpError> {
    let application = app_state
        .application_service
        .decide(application_id, &user.actor(), body.decision)
        .await?;

    Ok(Json(json!({
        "status": "success",
        "data": application
    })))
}

pub async fn my_applications(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let applications = app_state.application_service.mine(&user.actor()).await?;

    Ok(Json(json!({
        "status": "success",
        "results": applications.len(),
        "data": applications
    })))
}
