// handler/missions.rs
use std::sync::Arc;

use axum::{
    extract::{Path, Query},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, patch, post, put},
    Extension, Json, Router,
};
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dtos::missiondtos::{
        AvailableMissionsQuery, ChangeStatusDto, CompleteMissionDto, CreateMissionDto,
        MissionListQuery, MyMissionsQuery, SearchMissionsQuery, UpdateMissionDto,
    },
    error::HttpError,
    handler::applications::{accepted_application, apply_to_mission, list_mission_applications},
    middleware::{auth, JWTAuthMiddeware},
    AppState,
};

pub fn missions_handler() -> Router {
    let protected = Router::new()
        .route("/mine", get(my_missions))
        .route("/available", get(available_missions))
        .route("/stats", get(mission_stats))
        .route("/export", get(export_missions))
        .route("/:mission_id/publish", post(publish_mission))
        .route("/:mission_id/status", patch(change_status))
        .route("/:mission_id/cancel", put(cancel_mission))
        .route("/:mission_id/complete", put(complete_mission))
        .route(
            "/:mission_id/applications",
            get(list_mission_applications).post(apply_to_mission),
        )
        .route("/:mission_id/applications/accepted", get(accepted_application))
        .layer(middleware::from_fn(auth));

    // reads are public, writes on the same paths need a token
    Router::new()
        .route(
            "/",
            get(list_missions).merge(post(create_mission).layer(middleware::from_fn(auth))),
        )
        .route("/search", get(search_missions))
        .route(
            "/:mission_id",
            get(get_mission).merge(
                put(update_mission)
                    .delete(delete_mission)
                    .layer(middleware::from_fn(auth)),
            ),
        )
        .merge(protected)
}

pub async fn create_mission(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Json(body): Json<CreateMissionDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let mission = app_state
        .mission_service
        .create(&user.actor(), body.into())
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "status": "success",
            "data": mission
        })),
    ))
}

pub async fn list_missions(
    Extension(app_state): Extension<Arc<AppState>>,
    Query(query): Query<MissionListQuery>,
) -> Result<impl IntoResponse, HttpError> {
    query.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;
    query.pagination()
        .validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let page = app_state.mission_service.list_public(query).await?;

    Ok(Json(json!({
        "status": "success",
        "data": page
    })))
}

pub async fn search_missions(
    Extension(app_state): Extension<Arc<AppState>>,
    Query(query): Query<SearchMissionsQuery>,
) -> Result<impl IntoResponse, HttpError> {
    query.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;
    query.pagination()
        .validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let page = app_state.mission_service.search(query).await?;

    Ok(Json(json!({
        "status": "success",
        "data": page
    })))
}

pub async fn get_mission(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(mission_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let mission = app_state.mission_service.get(mission_id).await?;

    Ok(Json(json!({
        "status": "success",
        "data": mission
    })))
}

pub async fn update_mission(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Path(mission_id): Path<Uuid>,
    Json(body): Json<UpdateMissionDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let mission = app_state
        .mission_service
        .update(mission_id, &user.actor(), body.into())
        .await?;

    Ok(Json(json!({
        "status": "success",
        "data": mission
    })))
}

pub async fn delete_mission(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Path(mission_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    app_state
        .mission_service
        .delete(mission_id, &user.actor())
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn publish_mission(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Path(mission_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let mission = app_state
        .mission_service
        .publish(mission_id, &user.actor())
        .await?;

    Ok(Json(json!({
        "status": "success",
        "data": mission
    })))
}

pub async fn change_status(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Path(mission_id): Path<Uuid>,
    Json(body): Json<ChangeStatusDto>,
) -> Result<impl IntoResponse, HttpError> {
    let mission = app_state
        .mission_service
        .change_status(mission_id, &user.actor(), body.status)
        .await?;

    Ok(Json(json!({
        "status": "success",
        "data": mission
    })))
}

pub async fn cancel_mission(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Path(mission_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let mission = app_state
        .mission_service
        .cancel(mission_id, &user.actor())
        .await?;

    Ok(Json(json!({
        "status": "success",
        "data": mission
    })))
}

pub async fn complete_mission(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Path(mission_id): Path<Uuid>,
    body: Option<Json<CompleteMissionDto>>,
) -> Result<impl IntoResponse, HttpError> {
    let body = body.map(|Json(b)| b).unwrap_or_default();
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let mission = app_state
        .mission_service
        .complete(mission_id, &user.actor(), body.rating, body.feedback)
        .await?;

    Ok(Json(json!({
        "status": "success",
        "data": mission
    })))
}

pub async fn my_missions(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Query(query): Query<MyMissionsQuery>,
) -> Result<impl IntoResponse, HttpError> {
    query.pagination()
        .validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let page = app_state
        .mission_service
        .my_missions(&user.actor(), query)
        .await?;

    Ok(Json(json!({
        "status": "success",
        "data": page
    })))
}

pub async fn available_missions(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Query(query): Query<AvailableMissionsQuery>,
) -> Result<impl IntoResponse, HttpError> {
    query.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;
    query.pagination()
        .validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let page = app_state
        .mission_service
        .available(&user.actor(), query)
        .await?;

    Ok(Json(json!({
        "status": "success",
        "data": page
    })))
}

pub async fn mission_stats(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let stats = app_state.mission_service.stats(&user.actor()).await?;

    Ok(Json(json!({
        "status": "success",
        "data": stats
    })))
}

pub async fn export_missions(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let rows = app_state
        .mission_service
        .export_projection(&user.actor())
        .await?;

    Ok(Json(json!({
        "status": "success",
        "results": rows.len(),
        "data": rows
    })))
}
