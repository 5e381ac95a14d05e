mod config;
mod db;
mod dtos;
mod error;
mod handler;
mod mail;
mod middleware;
mod models;
mod routes;
mod service;
mod utils;

use std::{str::FromStr, sync::Arc};

use anyhow::Context;
use axum::http::{
    header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
    HeaderValue, Method,
};
use config::Config;
use db::{db::DBClient, MarketStore};
use dotenv::dotenv;
use mail::mails::{CodeMailer, LogMailer, SmtpMailer};
use routes::create_router;
use service::{
    account_service::{AccountService, AccountSettings},
    application_service::ApplicationService,
    chat_service::ChatService,
    deliverable_service::DeliverableService,
    file_storage::{FileStorage, LocalFileStorage},
    mission_service::MissionService,
    moderation_service::ModerationService,
    profile_service::ProfileService,
};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing_subscriber::filter::LevelFilter;

#[derive(Clone)]
pub struct AppState {
    pub env: Config,
    pub store: Arc<dyn MarketStore>,
    pub account_service: Arc<AccountService>,
    pub mission_service: Arc<MissionService>,
    pub application_service: Arc<ApplicationService>,
    pub deliverable_service: Arc<DeliverableService>,
    pub chat_service: Arc<ChatService>,
    pub moderation_service: Arc<ModerationService>,
    pub profile_service: Arc<ProfileService>,
}

impl AppState {
    pub fn new(
        config: Config,
        store: Arc<dyn MarketStore>,
        mailer: Arc<dyn CodeMailer>,
        files: Arc<dyn FileStorage>,
    ) -> Self {
        let account_service = Arc::new(AccountService::new(
            store.clone(),
            mailer,
            AccountSettings {
                jwt_secret: config.jwt_secret.clone(),
                jwt_maxage: config.jwt_maxage,
                code_ttl: config.code_ttl,
            },
        ));

        Self {
            account_service,
            mission_service: Arc::new(MissionService::new(store.clone())),
            application_service: Arc::new(ApplicationService::new(store.clone())),
            deliverable_service: Arc::new(DeliverableService::new(store.clone(), files)),
            chat_service: Arc::new(ChatService::new(store.clone())),
            moderation_service: Arc::new(ModerationService::new(store.clone())),
            profile_service: Arc::new(ProfileService::new(store.clone())),
            store,
            env: config,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let config = Config::init().context("invalid configuration")?;

    let level = LevelFilter::from_str(&config.log_level).unwrap_or(LevelFilter::INFO);
    tracing_subscriber::fmt().with_max_level(level).init();

    let db_client = DBClient::connect(&config.database_url, config.db_max_connections)
        .await
        .context("failed to connect to the database")?;
    tracing::info!("Connection to the database is successful: {:?}", db_client);

    db_client.migrate().await.context("failed to run migrations")?;

    let store: Arc<dyn MarketStore> = Arc::new(db_client);

    let mailer: Arc<dyn CodeMailer> = match config.smtp.clone() {
        Some(settings) => Arc::new(SmtpMailer::new(settings)),
        None => {
            tracing::warn!("SMTP_HOST not set, verification codes will only be logged");
            Arc::new(LogMailer)
        }
    };

    let files: Arc<dyn FileStorage> = Arc::new(LocalFileStorage::new(
        &config.upload_dir,
        config.max_upload_bytes,
    ));

    let allowed_origins = config
        .cors_origins
        .iter()
        .map(|origin| origin.parse::<HeaderValue>())
        .collect::<Result<Vec<_>, _>>()
        .context("invalid CORS origin")?;

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed_origins))
        .allow_headers([AUTHORIZATION, ACCEPT, CONTENT_TYPE])
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ]);

    let app_state = Arc::new(AppState::new(config.clone(), store, mailer, files));

    let app = create_router(app_state).layer(cors);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port))
        .await
        .with_context(|| format!("failed to bind port {}", config.port))?;
    tracing::info!("Server is running on http://localhost:{}", config.port);

    axum::serve(listener, app).await?;

    Ok(())
}
