// handler/admin.rs
use std::sync::Arc;

use axum::{
    extract::{Path, Query, Request},
    http::StatusCode,
    middleware::{self, Next},
    response::IntoResponse,
    routing::{delete, get, post},
    Extension, Json, Router,
};
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dtos::{
        admindtos::{AdminActionQuery, ComplaintQuery, CreateComplaintDto, ReviewNotesDto},
        commondtos::RequestQueryDto,
        userdtos::FilterUserDto,
    },
    error::HttpError,
    middleware::{role_check, JWTAuthMiddeware},
    models::usermodel::UserRole,
    AppState,
};

pub fn admin_handler() -> Router {
    let admin_only = Router::new()
        .route("/complaints", get(list_complaints))
        .route("/complaints/:complaint_id/approve", post(approve_complaint))
        .route("/complaints/:complaint_id/reject", post(reject_complaint))
        .route("/complaints/:complaint_id", delete(delete_complaint))
        .route("/blocked-accounts", get(blocked_accounts))
        .route("/unblock/:user_id", post(unblock_user))
        .route("/actions", get(list_actions))
        .route("/actions/me", get(my_actions))
        .layer(middleware::from_fn(|req: Request, next: Next| {
            role_check(req, next, vec![UserRole::Admin])
        }));

    Router::new()
        .route("/complaints", post(file_complaint))
        .route("/complaints/mine", get(my_complaints))
        .merge(admin_only)
}

fn notes_of(body: Option<Json<ReviewNotesDto>>) -> Result<Option<String>, HttpError> {
    let body = body.map(|Json(b)| b).unwrap_or_default();
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;
    Ok(body.notes)
}

pub async fn file_complaint(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Json(body): Json<CreateComplaintDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let complaint = app_state
        .moderation_service
        .file_complaint(&user.actor(), &body.reported_email, &body.reason)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "status": "success",
            "data": complaint
        })),
    ))
}

pub async fn my_complaints(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let complaints = app_state
        .moderation_service
        .my_complaints(&user.actor())
        .await?;

    Ok(Json(json!({
        "status": "success",
        "results": complaints.len(),
        "data": complaints
    })))
}

pub async fn list_complaints(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Query(query): Query<ComplaintQuery>,
) -> Result<impl IntoResponse, HttpError> {
    query.pagination()
        .validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let page = app_state
        .moderation_service
        .list_complaints(&user.actor(), query)
        .await?;

    Ok(Json(json!({
        "status": "success",
        "data": page
    })))
}

pub async fn approve_complaint(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Path(complaint_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let complaint = app_state
        .moderation_service
        .approve(&user.actor(), complaint_id)
        .await?;

    Ok(Json(json!({
        "status": "success",
        "data": complaint
    })))
}

pub async fn reject_complaint(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Path(complaint_id): Path<Uuid>,
    body: Option<Json<ReviewNotesDto>>,
) -> Result<impl IntoResponse, HttpError> {
    let notes = notes_of(body)?;
    let complaint = app_state
        .moderation_service
        .reject(&user.actor(), complaint_id, notes)
        .await?;

    Ok(Json(json!({
        "status": "success",
        "data": complaint
    })))
}

pub async fn delete_complaint(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Path(complaint_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    app_state
        .moderation_service
        .delete(&user.actor(), complaint_id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn blocked_accounts(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Query(query): Query<RequestQueryDto>,
) -> Result<impl IntoResponse, HttpError> {
    query.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let page = app_state
        .moderation_service
        .blocked_accounts(&user.actor(), query)
        .await?;

    Ok(Json(json!({
        "status": "success",
        "data": {
            "items": FilterUserDto::filter_users(&page.items),
            "total": page.total,
            "page": page.page,
            "per_page": page.per_page,
            "pages": page.pages,
        }
    })))
}

pub async fn unblock_user(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Path(user_id): Path<Uuid>,
    body: Option<Json<ReviewNotesDto>>,
) -> Result<impl IntoResponse, HttpError> {
    let notes = notes_of(body)?;
    let unblocked = app_state
        .moderation_service
        .unblock(&user.actor(), user_id, notes)
        .await?;

    Ok(Json(json!({
        "status": "success",
        "data": { "user": FilterUserDto::filter_user(&unblocked) }
    })))
}

pub async fn list_actions(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Query(query): Query<AdminActionQuery>,
) -> Result<impl IntoResponse, HttpError> {
    query.pagination()
        .validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let page = app_state
        .moderation_service
        .actions(&user.actor(), query)
        .await?;

    Ok(Json(json!({
        "status": "success",
        "data": page
    })))
}

pub async fn my_actions(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Query(query): Query<RequestQueryDto>,
) -> Result<impl IntoResponse, HttpError> {
    query.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let page = app_state
        .moderation_service
        .my_actions(&user.actor(), query)
        .await?;

    Ok(Json(json!({
        "status": "success",
        "data": page
    })))
}
