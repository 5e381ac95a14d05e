// handler/deliverables.rs
use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, Multipart, Path},
    http::{header, HeaderValue, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dtos::deliverabledtos::{DeliverableFieldsDto, ReviewFeedbackDto, UploadedFile},
    error::HttpError,
    middleware::JWTAuthMiddeware,
    service::{deliverable_service::DeliverableContent, file_storage::sanitize_file_name},
    AppState,
};

// room for the text parts and multipart framing around the file
const MULTIPART_OVERHEAD: usize = 64 * 1024;

pub fn deliverables_handler(max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/", post(create_deliverable))
        .route("/mine", get(my_deliverables))
        .route("/client", get(client_deliverables))
        .route("/mission/:mission_id", get(mission_deliverables))
        .route(
            "/:deliverable_id",
            get(get_deliverable)
                .put(update_deliverable)
                .delete(delete_deliverable),
        )
        .route("/:deliverable_id/download", get(download_deliverable))
        .route("/:deliverable_id/submit", post(submit_deliverable))
        .route("/:deliverable_id/review", post(start_review))
        .route("/:deliverable_id/accept", post(accept_deliverable))
        .route("/:deliverable_id/reject", post(reject_deliverable))
        .route("/:deliverable_id/request-revision", post(request_revision))
        .layer(DefaultBodyLimit::max(max_upload_bytes + MULTIPART_OVERHEAD))
}

/// Splits a deliverable form into its text fields and the optional file part.
async fn read_form(
    mut multipart: Multipart,
) -> Result<(DeliverableFieldsDto, Option<UploadedFile>), HttpError> {
    let mut fields = DeliverableFieldsDto::default();
    let mut file = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| HttpError::bad_request(e.to_string()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                let file_name = field
                    .file_name()
                    .map(str::to_string)
                    .ok_or_else(|| HttpError::bad_request("File part has no file name"))?;
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| HttpError::bad_request(e.to_string()))?;
                if !bytes.is_empty() {
                    file = Some(UploadedFile {
                        file_name,
                        bytes: bytes.to_vec(),
                    });
                }
            }
            "mission_id" | "title" | "description" => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| HttpError::bad_request(e.to_string()))?;
                match name.as_str() {
                    "mission_id" => {
                        let id = Uuid::parse_str(value.trim())
                            .map_err(|_| HttpError::bad_request("mission_id is not a valid id"))?;
                        fields.mission_id = Some(id);
                    }
                    "title" => fields.title = value,
                    _ => fields.description = Some(value),
                }
            }
            other => tracing::debug!("Ignoring multipart field {}", other),
        }
    }

    fields
        .validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    Ok((fields, file))
}

fn content_of(fields: DeliverableFieldsDto) -> DeliverableContent {
    DeliverableContent {
        title: fields.title,
        description: fields.description,
    }
}

pub async fn create_deliverable(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    multipart: Multipart,
) -> Result<impl IntoResponse, HttpError> {
    let (fields, file) = read_form(multipart).await?;
    let mission_id = fields
        .mission_id
        .ok_or_else(|| HttpError::bad_request("mission_id is required"))?;

    let deliverable = app_state
        .deliverable_service
        .create(&user.actor(), mission_id, content_of(fields), file)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "status": "success",
            "data": deliverable
        })),
    ))
}

pub async fn update_deliverable(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Path(deliverable_id): Path<Uuid>,
    multipart: Multipart,
) -> Result<impl IntoResponse, HttpError> {
    let (fields, file) = read_form(multipart).await?;

    let deliverable = app_state
        .deliverable_service
        .update(deliverable_id, &user.actor(), content_of(fields), file)
        .await?;

    Ok(Json(json!({
        "status": "success",
        "data": deliverable
    })))
}

pub async fn delete_deliverable(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Path(deliverable_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    app_state
        .deliverable_service
        .delete(deliverable_id, &user.actor())
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_deliverable(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Path(deliverable_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let deliverable = app_state
        .deliverable_service
        .get(deliverable_id, &user.actor())
        .await?;

    Ok(Json(json!({
        "status": "success",
        "data": deliverable
    })))
}

pub async fn download_deliverable(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Path(deliverable_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let file = app_state
        .deliverable_service
        .download(deliverable_id, &user.actor())
        .await?;

    let disposition = HeaderValue::from_str(&format!(
        "attachment; filename=\"{}\"",
        sanitize_file_name(&file.file_name)
    ))
    .map_err(|e| HttpError::server_error(e.to_string()))?;

    Ok((
        [
            (
                header::CONTENT_TYPE,
                HeaderValue::from_static("application/octet-stream"),
            ),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        file.bytes,
    ))
}

pub async fn submit_deliverable(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Path(deliverable_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let deliverable = app_state
        .deliverable_service
        .submit(deliverable_id, &user.actor())
        .await?;

    Ok(Json(json!({
        "status": "success",
        "data": deliverable
    })))
}

pub async fn start_review(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Path(deliverable_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let deliverable = app_state
        .deliverable_service
        .start_review(deliverable_id, &user.actor())
        .await?;

    Ok(Json(json!({
        "status": "success",
        "data": deliverable
    })))
}

fn feedback_of(body: Option<Json<ReviewFeedbackDto>>) -> Result<Option<String>, HttpError> {
    let body = body.map(|Json(b)| b).unwrap_or_default();
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;
    Ok(body.feedback)
}

pub async fn accept_deliverable(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Path(deliverable_id): Path<Uuid>,
    body: Option<Json<ReviewFeedbackDto>>,
) -> Result<impl IntoResponse, HttpError> {
    let feedback = feedback_of(body)?;
    let deliverable = app_state
        .deliverable_service
        .accept(deliverable_id, &user.actor(), feedback)
        .await?;

    Ok(Json(json!({
        "status": "success",
        "data": deliverable
    })))
}

pub async fn reject_deliverable(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Path(deliverable_id): Path<Uuid>,
    body: Option<Json<ReviewFeedbackDto>>,
) -> Result<impl IntoResponse, HttpError> {
    let feedback = feedback_of(body)?;
    let deliverable = app_state
        .deliverable_service
        .reject(deliverable_id, &user.actor(), feedback)
        .await?;

    Ok(Json(json!({
        "status": "success",
        "data": deliverable
    })))
}

pub async fn request_revision(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Path(deliverable_id): Path<Uuid>,
    body: Option<Json<ReviewFeedbackDto>>,
) -> Result<impl IntoResponse, HttpError> {
    let feedback = feedback_of(body)?;
    let deliverable = app_state
        .deliverable_service
        .request_revision(deliverable_id, &user.actor(), feedback)
        .await?;

    Ok(Json(json!({
        "status": "success",
        "data": deliverable
    })))
}

pub async fn mission_deliverables(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Path(mission_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let deliverables = app_state
        .deliverable_service
        .list_for_mission(mission_id, &user.actor())
        .await?;

    Ok(Json(json!({
        "status": "success",
        "results": deliverables.len(),
        "data": deliverables
    })))
}

pub async fn my_deliverables(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let deliverables = app_state.deliverable_service.mine(&user.actor()).await?;

    Ok(Json(json!({
        "status": "success",
        "results": deliverables.len(),
        "data": deliverables
    })))
}

pub async fn client_deliverables(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let deliverables = app_state
        .deliverable_service
        .for_client(&user.actor())
        .await?;

    Ok(Json(json!({
        "status": "success",
        "results": deliverables.len(),
        "data": deliverables
    })))
}
