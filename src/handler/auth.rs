// handler/auth.rs
use std::sync::Arc;

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::IntoResponse,
    routing::post,
    Extension, Json, Router,
};
use axum_extra::extract::cookie::Cookie;
use serde_json::json;
use validator::Validate;

use crate::{
    dtos::{
        commondtos::Response,
        userdtos::{
            FilterUserDto, LoginUserDto, RegisterUserDto, ResendCodeDto, UserData,
            UserLoginResponseDto, UserResponseDto, VerifyEmailDto,
        },
    },
    error::HttpError,
    AppState,
};

pub fn auth_handler() -> Router {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/verify", post(verify_email))
        .route("/resend-code", post(resend_code))
}

pub async fn register(
    Extension(app_state): Extension<Arc<AppState>>,
    Json(body): Json<RegisterUserDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let user = app_state
        .account_service
        .register(&body.email, &body.password, body.role)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(UserResponseDto {
            status: "success".to_string(),
            data: UserData {
                user: FilterUserDto::filter_user(&user),
            },
        }),
    ))
}

pub async fn login(
    Extension(app_state): Extension<Arc<AppState>>,
    Json(body): Json<LoginUserDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let (token, _user) = app_state
        .account_service
        .login(&body.email, &body.password)
        .await?;

    let cookie_duration =
        time::Duration::seconds(app_state.account_service.token_maxage_seconds());
    let cookie = Cookie::build(("token", token.clone()))
        .path("/")
        .max_age(cookie_duration)
        .http_only(true)
        .build();

    let cookie_header = HeaderValue::from_str(&cookie.to_string())
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    let mut response = Json(UserLoginResponseDto {
        status: "success".to_string(),
        token,
    })
    .into_response();
    response.headers_mut().append(header::SET_COOKIE, cookie_header);

    Ok(response)
}

pub async fn verify_email(
    Extension(app_state): Extension<Arc<AppState>>,
    Json(body): Json<VerifyEmailDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let user = app_state
        .account_service
        .verify(&body.email, &body.code)
        .await?;

    Ok(Json(json!({
        "status": "success",
        "data": { "user": FilterUserDto::filter_user(&user) }
    })))
}

pub async fn resend_code(
    Extension(app_state): Extension<Arc<AppState>>,
    Json(body): Json<ResendCodeDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    app_state.account_service.resend_code(&body.email).await?;

    Ok(Json(Response {
        status: "success",
        message: "A new verification code has been sent".to_string(),
    }))
}
