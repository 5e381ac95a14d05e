// handler/freelancers.rs
use std::sync::Arc;

use axum::{
    extract::{Path, Query},
    response::IntoResponse,
    routing::get,
    Extension, Json, Router,
};
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dtos::{commondtos::RequestQueryDto, profiledtos::FreelancerSearchQuery},
    error::HttpError,
    AppState,
};

pub fn freelancers_handler() -> Router {
    Router::new()
        .route("/", get(list_freelancers))
        .route("/search", get(search_freelancers))
        .route("/stats", get(freelancer_stats))
        .route("/:user_id", get(get_freelancer))
}

pub async fn list_freelancers(
    Extension(app_state): Extension<Arc<AppState>>,
    Query(query): Query<RequestQueryDto>,
) -> Result<impl IntoResponse, HttpError> {
    query.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let page = app_state.profile_service.list_freelancers(query).await?;

    Ok(Json(json!({
        "status": "success",
        "data": page
    })))
}

pub async fn search_freelancers(
    Extension(app_state): Extension<Arc<AppState>>,
    Query(query): Query<FreelancerSearchQuery>,
) -> Result<impl IntoResponse, HttpError> {
    query.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;
    query.pagination()
        .validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let page = app_state.profile_service.search_freelancers(query).await?;

    Ok(Json(json!({
        "status": "success",
        "data": page
    })))
}

pub async fn freelancer_stats(
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpError> {
    let stats = app_state.profile_service.stats().await?;

    Ok(Json(json!({
        "status": "success",
        "data": stats
    })))
}

pub async fn get_freelancer(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let detail = app_state.profile_service.freelancer(user_id).await?;

    Ok(Json(json!({
        "status": "success",
        "data": detail
    })))
}
