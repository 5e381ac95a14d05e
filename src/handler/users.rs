// handler/users.rs
use std::sync::Arc;

use axum::{
    extract::Path,
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Extension, Json, Router,
};
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dtos::{
        profiledtos::{CreatePortfolioItemDto, UpdatePortfolioItemDto},
        userdtos::{FilterUserDto, UpsertProfileDto, UserData, UserResponseDto},
    },
    error::HttpError,
    middleware::JWTAuthMiddeware,
    AppState,
};

pub fn users_handler() -> Router {
    Router::new()
        .route("/me", get(get_me))
        .route("/profile", get(get_my_profile).put(upsert_profile))
        .route("/:user_id/profile", get(get_profile))
        .route("/portfolio", get(my_portfolio).post(add_portfolio_item))
        .route(
            "/portfolio/:item_id",
            get(get_portfolio_item)
                .put(update_portfolio_item)
                .delete(delete_portfolio_item),
        )
        .route("/:user_id/portfolio", get(user_portfolio))
}

pub async fn get_me(
    Extension(user): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    Ok(Json(UserResponseDto {
        status: "success".to_string(),
        data: UserData {
            user: FilterUserDto::filter_user(&user.user),
        },
    }))
}

pub async fn get_my_profile(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let profile = app_state.account_service.get_profile(user.user.id).await?;

    Ok(Json(json!({
        "status": "success",
        "data": profile
    })))
}

pub async fn upsert_profile(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Json(body): Json<UpsertProfileDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let (common, details) = body.into_parts();
    let profile = app_state
        .account_service
        .upsert_profile(&user.actor(), common, details)
        .await?;

    Ok(Json(json!({
        "status": "success",
        "data": profile
    })))
}

pub async fn get_profile(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let profile = app_state.account_service.get_profile(user_id).await?;

    Ok(Json(json!({
        "status": "success",
        "data": profile
    })))
}

pub async fn add_portfolio_item(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Json(body): Json<CreatePortfolioItemDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let item = app_state
        .profile_service
        .add_portfolio_item(&user.actor(), body.into())
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "status": "success",
            "data": item
        })),
    ))
}

pub async fn my_portfolio(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let items = app_state.profile_service.my_portfolio(&user.actor()).await?;

    Ok(Json(json!({
        "status": "success",
        "results": items.len(),
        "data": items
    })))
}

pub async fn user_portfolio(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let items = app_state.profile_service.portfolio_of(user_id).await?;

    Ok(Json(json!({
        "status": "success",
        "results": items.len(),
        "data": items
    })))
}

pub async fn get_portfolio_item(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(item_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let item = app_state.profile_service.get_portfolio_item(item_id).await?;

    Ok(Json(json!({
        "status": "success",
        "data": item
    })))
}

pub async fn update_portfolio_item(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Path(item_id): Path<Uuid>,
    Json(body): Json<UpdatePortfolioItemDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let item = app_state
        .profile_service
        .update_portfolio_item(item_id, &user.actor(), body.into())
        .await?;

    Ok(Json(json!({
        "status": "success",
        "data": item
    })))
}

pub async fn delete_portfolio_item(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Path(item_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    app_state
        .profile_service
        .delete_portfolio_item(item_id, &user.actor())
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
