// mail/mails.rs
use async_trait::async_trait;

use super::sendmail::{send_email, SmtpSettings};
use crate::service::error::ServiceError;

/// Delivers account verification codes.
#[async_trait]
pub trait CodeMailer: Send + Sync {
    async fn send(&self, to_email: &str, code: &str) -> Result<(), ServiceError>;
}

pub struct SmtpMailer {
    settings: SmtpSettings,
}

impl SmtpMailer {
    pub fn new(settings: SmtpSettings) -> Self {
        Self { settings }
    }
}

fn verification_body(code: &str) -> String {
    format!(
        "<p>Welcome to MissionHub.</p>\
         <p>Your verification code is <strong>{}</strong>.</p>\
         <p>It expires shortly, request a new one if needed.</p>",
        code
    )
}

#[async_trait]
impl CodeMailer for SmtpMailer {
    async fn send(&self, to_email: &str, code: &str) -> Result<(), ServiceError> {
        send_email(
            &self.settings,
            to_email,
            "Verify your email",
            verification_body(code),
        )
        .await
    }
}

/// Used when no SMTP host is configured; codes only reach the log.
pub struct LogMailer;

#[async_trait]
impl CodeMailer for LogMailer {
    async fn send(&self, to_email: &str, code: &str) -> Result<(), ServiceError> {
        tracing::warn!("SMTP not configured, verification code for {}: {}", to_email, code);
        Ok(())
    }
}
