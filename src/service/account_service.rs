// service/account_service.rs
use std::sync::Arc;

use chrono::{Duration, Utc};
use uuid::Uuid;

use crate::{
    db::{userdb::UserExt, MarketStore},
    error::ErrorMessage,
    mail::mails::CodeMailer,
    models::usermodel::{Actor, Profile, ProfileCommon, ProfileDetails, User, UserRole},
    service::error::ServiceError,
    utils::{otp_generator::generate_otp, password, token},
};

#[derive(Debug, Clone)]
pub struct AccountSettings {
    pub jwt_secret: String,
    /// Minutes.
    pub jwt_maxage: i64,
    /// Minutes.
    pub code_ttl: i64,
}

#[derive(Clone)]
pub struct AccountService {
    store: Arc<dyn MarketStore>,
    mailer: Arc<dyn CodeMailer>,
    settings: AccountSettings,
}

impl AccountService {
    pub fn new(
        store: Arc<dyn MarketStore>,
        mailer: Arc<dyn CodeMailer>,
        settings: AccountSettings,
    ) -> Self {
        Self {
            store,
            mailer,
            settings,
        }
    }

    pub fn token_maxage_seconds(&self) -> i64 {
        self.settings.jwt_maxage * 60
    }

    async fn by_email(&self, email: &str) -> Result<Option<User>, ServiceError> {
        Ok(self.store.get_user(None, Some(email.trim())).await?)
    }

    pub async fn register(
        &self,
        email: &str,
        password: &str,
        role: UserRole,
    ) -> Result<User, ServiceError> {
        if role == UserRole::Admin {
            return Err(ServiceError::validation("Admins cannot self-register"));
        }

        let email = email.trim().to_lowercase();
        if self.by_email(&email).await?.is_some() {
            return Err(ServiceError::Duplicate(ErrorMessage::EmailExist.to_string()));
        }

        let hashed = password::hash(password).map_err(|e| ServiceError::validation(e.to_string()))?;
        let code = generate_otp();
        let expires_at = Utc::now() + Duration::minutes(self.settings.code_ttl);

        // a concurrent register can still win between the check and the insert
        let user = self
            .store
            .save_user(email, hashed, role, code.clone(), expires_at)
            .await?
            .ok_or_else(|| ServiceError::Duplicate(ErrorMessage::EmailExist.to_string()))?;

        // the account exists either way; a failed send can be retried via resend
        if let Err(e) = self.mailer.send(&user.email, &code).await {
            tracing::error!("Failed to send verification code to {}: {}", user.email, e);
        }

        tracing::info!("Registered {} as {}", user.id, role.to_str());
        Ok(user)
    }

    pub async fn verify(&self, email: &str, code: &str) -> Result<User, ServiceError> {
        let user = self
            .by_email(email)
            .await?
            .ok_or_else(|| ServiceError::not_found("No account uses this email"))?;

        if user.is_verified {
            return Err(ServiceError::invalid_state("Email is already verified"));
        }

        if user.verification_code.as_deref() != Some(code.trim()) {
            return Err(ServiceError::validation("Verification code is wrong"));
        }

        match user.code_expires_at {
            Some(expires_at) if expires_at > Utc::now() => {}
            _ => {
                return Err(ServiceError::Precondition(
                    "Verification code has expired, request a new one".to_string(),
                ))
            }
        }

        let user = self.store.mark_verified(user.id).await?;
        tracing::info!("Verified {}", user.id);
        Ok(user)
    }

    pub async fn resend_code(&self, email: &str) -> Result<(), ServiceError> {
        let user = self
            .by_email(email)
            .await?
            .ok_or_else(|| ServiceError::not_found("No account uses this email"))?;

        if user.is_verified {
            return Err(ServiceError::invalid_state("Email is already verified"));
        }

        let code = generate_otp();
        let expires_at = Utc::now() + Duration::minutes(self.settings.code_ttl);
        let user = self
            .store
            .update_verification_code(user.id, code.clone(), expires_at)
            .await?;

        self.mailer.send(&user.email, &code).await
    }

    /// Returns the signed token together with the account it belongs to.
    pub async fn login(&self, email: &str, password: &str) -> Result<(String, User), ServiceError> {
        let wrong = || ServiceError::permission(ErrorMessage::WrongCredentials.to_string());

        let user = self.by_email(email).await?.ok_or_else(wrong)?;

        let matched = password::compare(password, &user.password).map_err(|_| wrong())?;
        if !matched {
            return Err(wrong());
        }

        if !user.is_active {
            tracing::warn!("Blocked account {} attempted to log in", user.id);
            return Err(ServiceError::permission(ErrorMessage::AccountBlocked.to_string()));
        }

        self.store.touch_last_connection(user.id).await?;

        let token = token::create_token(
            &user.id.to_string(),
            self.settings.jwt_secret.as_bytes(),
            self.token_maxage_seconds(),
        )
        .map_err(|e| ServiceError::Other(e.to_string()))?;

        Ok((token, user))
    }

    pub async fn get_profile(&self, user_id: Uuid) -> Result<Profile, ServiceError> {
        self.store
            .get_profile(user_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Profile not found"))
    }

    pub async fn upsert_profile(
        &self,
        actor: &Actor,
        common: ProfileCommon,
        details: ProfileDetails,
    ) -> Result<Profile, ServiceError> {
        if !details.allowed_for(actor.role) {
            return Err(ServiceError::validation(format!(
                "A {} account cannot hold a {:?} profile",
                actor.role.to_str(),
                details.kind()
            )));
        }

        let profile = self.store.upsert_profile(actor.id, common, details).await?;
        tracing::info!("Profile saved for {}", actor.id);
        Ok(profile)
    }
}
