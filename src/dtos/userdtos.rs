use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::models::usermodel::{ProfileCommon, ProfileDetails, User, UserRole};

#[derive(Validate, Debug, Clone, Serialize, Deserialize)]
pub struct RegisterUserDto {
    #[validate(
        length(min = 1, message = "Email is required"),
        email(message = "Email is invalid")
    )]
    pub email: String,

    #[validate(
        length(min = 1, message = "Password is required"),
        length(min = 6, message = "Password must be at least 6 characters")
    )]
    pub password: String,

    #[validate(
        length(min = 1, message = "Confirm Password is required"),
        must_match(other = "password", message = "passwords do not match")
    )]
    #[serde(rename = "passwordConfirm")]
    pub password_confirm: String,

    #[validate(custom = "validate_signup_role")]
    pub role: UserRole,
}

fn validate_signup_role(role: &UserRole) -> Result<(), ValidationError> {
    match role {
        UserRole::Client | UserRole::Freelance => Ok(()),
        UserRole::Admin => Err(ValidationError::new("Admins cannot self-register")),
    }
}

#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
pub struct LoginUserDto {
    #[validate(length(min = 1, message = "Email is required"), email(message = "Email is invalid"))]
    pub email: String,
    #[validate(
        length(min = 1, message = "Password is required"),
        length(min = 6, message = "Password must be at least 6 characters")
    )]
    pub password: String,
}

#[derive(Validate, Debug, Clone, Serialize, Deserialize)]
pub struct VerifyEmailDto {
    #[validate(email(message = "Email is invalid"))]
    pub email: String,
    #[validate(length(equal = 6, message = "Verification code has 6 digits"))]
    pub code: String,
}

#[derive(Validate, Debug, Clone, Serialize, Deserialize)]
pub struct ResendCodeDto {
    #[validate(email(message = "Email is invalid"))]
    pub email: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FilterUserDto {
    pub id: String,
    pub email: String,
    pub role: String,
    pub is_active: bool,
    pub is_verified: bool,
    #[serde(rename = "lastConnectionAt")]
    pub last_connection_at: Option<DateTime<Utc>>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

impl FilterUserDto {
    pub fn filter_user(user: &User) -> Self {
        FilterUserDto {
            id: user.id.to_string(),
            email: user.email.to_owned(),
            role: user.role.to_str().to_string(),
            is_active: user.is_active,
            is_verified: user.is_verified,
            last_connection_at: user.last_connection_at,
            created_at: user.created_at,
        }
    }

    pub fn filter_users(users: &[User]) -> Vec<FilterUserDto> {
        users.iter().map(FilterUserDto::filter_user).collect()
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserData {
    pub user: FilterUserDto,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserResponseDto {
    pub status: String,
    pub data: UserData,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserLoginResponseDto {
    pub status: String,
    pub token: String,
}

#[derive(Validate, Debug, Clone, Deserialize)]
pub struct UpsertProfileDto {
    #[validate(length(max = 32))]
    pub phone: Option<String>,
    #[validate(length(max = 100))]
    pub country: Option<String>,
    #[validate(length(max = 100))]
    pub city: Option<String>,
    pub address: Option<String>,
    #[validate(length(max = 2000))]
    pub bio: Option<String>,
    #[validate(url)]
    pub photo_url: Option<String>,

    #[serde(flatten)]
    pub details: ProfileInput,
}

/// Client-writable part of a profile; stats are managed by the platform.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(tag = "profile_kind", rename_all = "snake_case")]
pub enum ProfileInput {
    Freelance {
        full_name: String,
        title: Option<String>,
        #[serde(default)]
        skills: Vec<String>,
        #[serde(default)]
        languages: Vec<String>,
        hourly_rate: Option<f64>,
        experience_years: Option<i32>,
        availability: Option<String>,
    },
    Client {
        client_type: Option<String>,
        full_name: Option<String>,
        company_name: Option<String>,
        company_website: Option<String>,
        industry: Option<String>,
    },
}

impl UpsertProfileDto {
    pub fn into_parts(self) -> (ProfileCommon, ProfileDetails) {
        let common = ProfileCommon {
            phone: self.phone,
            country: self.country,
            city: self.city,
            address: self.address,
            bio: self.bio,
            photo_url: self.photo_url,
        };

        let details = match self.details {
            ProfileInput::Freelance {
                full_name,
                title,
                skills,
                languages,
                hourly_rate,
                experience_years,
                availability,
            } => ProfileDetails::Freelance {
                full_name,
                title,
                skills,
                languages,
                hourly_rate,
                experience_years,
                availability,
                rating: 0.0,
                completed_projects: 0,
            },
            ProfileInput::Client {
                client_type,
                full_name,
                company_name,
                company_website,
                industry,
            } => ProfileDetails::Client {
                client_type,
                full_name,
                company_name,
                company_website,
                industry,
            },
        };

        (common, details)
    }
}
