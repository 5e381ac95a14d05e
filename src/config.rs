// config.rs
use std::{env, str::FromStr};

use thiserror::Error;

use crate::{mail::sendmail::SmtpSettings, service::file_storage::DEFAULT_MAX_UPLOAD_BYTES};

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} has an invalid value: {value}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub db_max_connections: u32,
    pub jwt_secret: String,
    /// Minutes.
    pub jwt_maxage: i64,
    pub port: u16,
    pub upload_dir: String,
    pub max_upload_bytes: usize,
    /// Minutes.
    pub code_ttl: i64,
    pub cors_origins: Vec<String>,
    pub log_level: String,
    /// None when `SMTP_HOST` is not set; codes are then only logged.
    pub smtp: Option<SmtpSettings>,
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .ok_or(ConfigError::Missing(name))
}

fn optional(name: &'static str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parsed<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match optional(name) {
        Some(value) => value
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::Invalid { name, value }),
        None => Ok(default),
    }
}

impl Config {
    pub fn init() -> Result<Config, ConfigError> {
        let database_url = required("DATABASE_URL")?;
        let jwt_secret = required("JWT_SECRET_KEY")?;

        let smtp = match optional("SMTP_HOST") {
            Some(host) => Some(SmtpSettings {
                host,
                port: parsed("SMTP_PORT", 587)?,
                username: optional("SMTP_USERNAME").unwrap_or_default(),
                password: optional("SMTP_PASSWORD").unwrap_or_default(),
                from_email: required("FROM_EMAIL")?,
            }),
            None => None,
        };

        let cors_origins = optional("CORS_ORIGINS")
            .map(|origins| {
                origins
                    .split(',')
                    .map(|o| o.trim().to_string())
                    .filter(|o| !o.is_empty())
                    .collect()
            })
            .unwrap_or_else(|| {
                vec![
                    "http://localhost:5173".to_string(),
                    "http://localhost:8000".to_string(),
                ]
            });

        Ok(Config {
            database_url,
            db_max_connections: parsed("DB_MAX_CONNECTIONS", 20)?,
            jwt_secret,
            jwt_maxage: parsed("JWT_MAXAGE", 60)?,
            port: parsed("PORT", 8000)?,
            upload_dir: optional("UPLOAD_DIR").unwrap_or_else(|| "./uploads".to_string()),
            max_upload_bytes: parsed("MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES)?,
            code_ttl: parsed("VERIFICATION_CODE_TTL_MINUTES", 15)?,
            cors_origins,
            log_level: optional("RUST_LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            smtp,
        })
    }
}
