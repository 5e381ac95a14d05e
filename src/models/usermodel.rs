use chrono::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Deserialize, Serialize, Clone, Copy, sqlx::Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "user_role", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    Client,
    Freelance,
    Admin,
}

impl UserRole {
    pub fn to_str(&self) -> &str {
        match self {
            UserRole::Client => "CLIENT",
            UserRole::Freelance => "FREELANCE",
            UserRole::Admin => "ADMIN",
        }
    }
}

#[derive(Debug, Deserialize, Serialize, sqlx::FromRow, Clone)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub role: UserRole,
    pub is_active: bool,
    pub is_verified: bool,

    #[serde(skip_serializing)]
    pub verification_code: Option<String>,
    #[serde(skip_serializing)]
    pub code_expires_at: Option<DateTime<Utc>>,

    pub last_connection_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn actor(&self) -> Actor {
        Actor {
            id: self.id,
            role: self.role,
        }
    }
}

/// Identity of the caller of an engine operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub id: Uuid,
    pub role: UserRole,
}

impl Actor {
    pub fn new(id: Uuid, role: UserRole) -> Self {
        Actor { id, role }
    }

    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "profile_kind", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ProfileKind {
    Freelance,
    Client,
}

/// Fields shared by every profile regardless of kind.
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct ProfileCommon {
    pub phone: Option<String>,
    pub country: Option<String>,
    pub city: Option<String>,
    pub address: Option<String>,
    pub bio: Option<String>,
    pub photo_url: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(tag = "profile_kind", rename_all = "snake_case")]
pub enum ProfileDetails {
    Freelance {
        full_name: String,
        title: Option<String>,
        skills: Vec<String>,
        languages: Vec<String>,
        hourly_rate: Option<f64>,
        experience_years: Option<i32>,
        availability: Option<String>,
        rating: f64,
        completed_projects: i32,
    },
    Client {
        client_type: Option<String>,
        full_name: Option<String>,
        company_name: Option<String>,
        company_website: Option<String>,
        industry: Option<String>,
    },
}

impl ProfileDetails {
    pub fn kind(&self) -> ProfileKind {
        match self {
            ProfileDetails::Freelance { .. } => ProfileKind::Freelance,
            ProfileDetails::Client { .. } => ProfileKind::Client,
        }
    }

    /// Whether a user holding `role` may own a profile of this kind.
    pub fn allowed_for(&self, role: UserRole) -> bool {
        matches!(
            (self.kind(), role),
            (ProfileKind::Freelance, UserRole::Freelance) | (ProfileKind::Client, UserRole::Client)
        )
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Profile {
    pub user_id: Uuid,
    #[serde(flatten)]
    pub common: ProfileCommon,
    #[serde(flatten)]
    pub details: ProfileDetails,
    pub updated_at: DateTime<Utc>,
}

/// Flat storage shape of a profile; one nullable column per variant field.
#[derive(Debug, sqlx::FromRow, Clone)]
pub struct ProfileRow {
    pub user_id: Uuid,
    pub profile_kind: ProfileKind,
    pub phone: Option<String>,
    pub country: Option<String>,
    pub city: Option<String>,
    pub address: Option<String>,
    pub bio: Option<String>,
    pub photo_url: Option<String>,
    pub full_name: Option<String>,
    pub title: Option<String>,
    pub skills: Option<Vec<String>>,
    pub languages: Option<Vec<String>>,
    pub hourly_rate: Option<f64>,
    pub experience_years: Option<i32>,
    pub availability: Option<String>,
    pub rating: Option<f64>,
    pub completed_projects: Option<i32>,
    pub client_type: Option<String>,
    pub company_name: Option<String>,
    pub company_website: Option<String>,
    pub industry: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl From<ProfileRow> for Profile {
    fn from(row: ProfileRow) -> Self {
        let details = match row.profile_kind {
            ProfileKind::Freelance => ProfileDetails::Freelance {
                full_name: row.full_name.unwrap_or_default(),
                title: row.title,
                skills: row.skills.unwrap_or_default(),
                languages: row.languages.unwrap_or_default(),
                hourly_rate: row.hourly_rate,
                experience_years: row.experience_years,
                availability: row.availability,
                rating: row.rating.unwrap_or(0.0),
                completed_projects: row.completed_projects.unwrap_or(0),
            },
            ProfileKind::Client => ProfileDetails::Client {
                client_type: row.client_type,
                full_name: row.full_name,
                company_name: row.company_name,
                company_website: row.company_website,
                industry: row.industry,
            },
        };

        Profile {
            user_id: row.user_id,
            common: ProfileCommon {
                phone: row.phone,
                country: row.country,
                city: row.city,
                address: row.address,
                bio: row.bio,
                photo_url: row.photo_url,
            },
            details,
            updated_at: row.updated_at,
        }
    }
}
