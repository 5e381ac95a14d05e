// handler/chat.rs
use std::sync::Arc;

use axum::{
    extract::Path,
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, put},
    Extension, Json, Router,
};
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dtos::chatdtos::{ChatWithMessagesDto, SendMessageDto},
    error::HttpError,
    middleware::JWTAuthMiddeware,
    models::chatmodel::Chat,
    AppState,
};

pub fn chat_handler() -> Router {
    Router::new()
        .route("/mission/:mission_id", get(open_mission_chat))
        .route("/support", get(open_support_chat))
        .route("/support/all", get(list_support_chats))
        .route("/status", get(check_status))
        .route("/chats", get(list_my_chats))
        .route("/:chat_id/messages", get(get_messages).post(send_message))
        .route("/:chat_id/read", put(mark_chat_as_read))
        .route("/messages/:message_id", delete(delete_message))
}

async fn with_messages(
    app_state: &AppState,
    chat: Chat,
    user: &JWTAuthMiddeware,
) -> Result<ChatWithMessagesDto, HttpError> {
    let messages = app_state
        .chat_service
        .list_messages(chat.id, &user.actor())
        .await?;

    Ok(ChatWithMessagesDto { chat, messages })
}

pub async fn open_mission_chat(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Path(mission_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let chat = app_state
        .chat_service
        .get_or_create_mission_chat(mission_id, &user.actor())
        .await?;
    let data = with_messages(&app_state, chat, &user).await?;

    Ok(Json(json!({
        "status": "success",
        "data": data
    })))
}

pub async fn open_support_chat(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let chat = app_state
        .chat_service
        .get_or_create_support_chat(&user.actor())
        .await?;
    let data = with_messages(&app_state, chat, &user).await?;

    Ok(Json(json!({
        "status": "success",
        "data": data
    })))
}

pub async fn list_support_chats(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let chats = app_state
        .chat_service
        .list_support_chats(&user.actor())
        .await?;

    Ok(Json(json!({
        "status": "success",
        "results": chats.len(),
        "data": chats
    })))
}

pub async fn check_status(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let status = app_state.chat_service.check_status(&user.actor()).await?;

    Ok(Json(json!({
        "status": "success",
        "data": status
    })))
}

pub async fn list_my_chats(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let chats = app_state.chat_service.list_my_chats(&user.actor()).await?;

    Ok(Json(json!({
        "status": "success",
        "results": chats.len(),
        "data": chats
    })))
}

pub async fn get_messages(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Path(chat_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let messages = app_state
        .chat_service
        .list_messages(chat_id, &user.actor())
        .await?;

    Ok(Json(json!({
        "status": "success",
        "results": messages.len(),
        "data": messages
    })))
}

pub async fn send_message(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Path(chat_id): Path<Uuid>,
    Json(body): Json<SendMessageDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let message = app_state
        .chat_service
        .send_message(chat_id, &user.actor(), &body.content)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "status": "success",
            "data": message
        })),
    ))
}

pub async fn mark_chat_as_read(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Path(chat_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let chat = app_state
        .chat_service
        .mark_read(chat_id, &user.actor())
        .await?;

    Ok(Json(json!({
        "status": "success",
        "data": chat
    })))
}

pub async fn delete_message(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Path(message_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    app_state
        .chat_service
        .delete_message(message_id, &user.actor())
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
