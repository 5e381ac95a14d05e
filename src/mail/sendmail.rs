// mail/sendmail.rs
use lettre::{
    message::header::ContentType, transport::smtp::authentication::Credentials, Message,
    SmtpTransport, Transport,
};

use crate::service::error::ServiceError;

#[derive(Debug, Clone)]
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from_email: String,
}

pub async fn send_email(
    settings: &SmtpSettings,
    to_email: &str,
    subject: &str,
    html_body: String,
) -> Result<(), ServiceError> {
    let email = Message::builder()
        .from(
            settings
                .from_email
                .parse()
                .map_err(|e| ServiceError::Mail(format!("Invalid sender address: {}", e)))?,
        )
        .to(to_email
            .parse()
            .map_err(|e| ServiceError::Mail(format!("Invalid recipient address: {}", e)))?)
        .subject(subject)
        .header(ContentType::TEXT_HTML)
        .body(html_body)
        .map_err(|e| ServiceError::Mail(e.to_string()))?;

    let creds = Credentials::new(settings.username.clone(), settings.password.clone());
    let mailer = SmtpTransport::starttls_relay(&settings.host)
        .map_err(|e| ServiceError::Mail(e.to_string()))?
        .port(settings.port)
        .credentials(creds)
        .build();

    // the SMTP transport is blocking
    let result = tokio::task::spawn_blocking(move || mailer.send(&email))
        .await
        .map_err(|e| ServiceError::Mail(e.to_string()))?;

    match result {
        Ok(_) => {
            tracing::info!("Email sent to {}", to_email);
            Ok(())
        }
        Err(e) => {
            tracing::error!("Email to {} failed: {}", to_email, e);
            Err(ServiceError::Mail(e.to_string()))
        }
    }
}
