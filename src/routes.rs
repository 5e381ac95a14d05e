// routes.rs
use std::sync::Arc;

use axum::{middleware, routing::get, Extension, Json, Router};
use serde_json::json;
use tower_http::trace::TraceLayer;

use crate::{
    handler::{
        admin::admin_handler, applications::applications_handler, auth::auth_handler,
        chat::chat_handler, deliverables::deliverables_handler, freelancers::freelancers_handler,
        missions::missions_handler, users::users_handler,
    },
    middleware::auth,
    AppState,
};

async fn health_check() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "message": "Server is running"
    }))
}

pub fn create_router(app_state: Arc<AppState>) -> Router {
    let api_route = Router::new()
        .nest("/auth", auth_handler())
        .nest(
            "/users",
            users_handler().layer(middleware::from_fn(auth)),
        )
        .nest(
            "/freelancers",
            freelancers_handler().layer(middleware::from_fn(auth)),
        )
        .nest("/missions", missions_handler())
        .nest(
            "/applications",
            applications_handler().layer(middleware::from_fn(auth)),
        )
        .nest(
            "/deliverables",
            deliverables_handler(app_state.env.max_upload_bytes)
                .layer(middleware::from_fn(auth)),
        )
        .nest("/chat", chat_handler().layer(middleware::from_fn(auth)))
        .nest("/admin", admin_handler().layer(middleware::from_fn(auth)))
        .layer(TraceLayer::new_for_http())
        .layer(Extension(app_state));

    Router::new()
        .route("/health", get(health_check))
        .nest("/api", api_route)
}
