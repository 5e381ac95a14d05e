// db/userdb.rs
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::Error;
use uuid::Uuid;

use super::db::{is_unique_violation, DBClient};
use crate::models::usermodel::*;

#[async_trait]
pub trait UserExt {
    async fn get_user(
        &self,
        user_id: Option<Uuid>,
        email: Option<&str>,
    ) -> Result<Option<User>, Error>;

    /// `None` when the email is already taken.
    async fn save_user(
        &self,
        email: String,
        password: String,
        role: UserRole,
        verification_code: String,
        code_expires_at: DateTime<Utc>,
    ) -> Result<Option<User>, Error>;

    async fn update_verification_code(
        &self,
        user_id: Uuid,
        verification_code: String,
        code_expires_at: DateTime<Utc>,
    ) -> Result<User, Error>;

    async fn mark_verified(&self, user_id: Uuid) -> Result<User, Error>;

    async fn touch_last_connection(&self, user_id: Uuid) -> Result<(), Error>;

    async fn get_blocked_users(&self, limit: i64, offset: i64) -> Result<Vec<User>, Error>;

    async fn count_blocked_users(&self) -> Result<i64, Error>;

    async fn get_profile(&self, user_id: Uuid) -> Result<Option<Profile>, Error>;

    async fn upsert_profile(
        &self,
        user_id: Uuid,
        common: ProfileCommon,
        details: ProfileDetails,
    ) -> Result<Profile, Error>;
}

#[async_trait]
impl UserExt for DBClient {
    async fn get_user(
        &self,
        user_id: Option<Uuid>,
        email: Option<&str>,
    ) -> Result<Option<User>, Error> {
        let mut user: Option<User> = None;

        if let Some(user_id) = user_id {
            user = sqlx::query_as::<_, User>(r#"SELECT * FROM users WHERE id = $1"#)
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?;
        } else if let Some(email) = email {
            user = sqlx::query_as::<_, User>(r#"SELECT * FROM users WHERE LOWER(email) = LOWER($1)"#)
                .bind(email)
                .fetch_optional(&self.pool)
                .await?;
        }

        Ok(user)
    }

    async fn save_user(
        &self,
        email: String,
        password: String,
        role: UserRole,
        verification_code: String,
        code_expires_at: DateTime<Utc>,
    ) -> Result<Option<User>, Error> {
        let saved = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, password, role, verification_code, code_expires_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(email)
        .bind(password)
        .bind(role)
        .bind(verification_code)
        .bind(code_expires_at)
        .fetch_one(&self.pool)
        .await;

        match saved {
            Ok(user) => Ok(Some(user)),
            Err(err) if is_unique_violation(&err) => Ok(None),
            Err(err) => Err(err),
        }
    }

    async fn update_verification_code(
        &self,
        user_id: Uuid,
        verification_code: String,
        code_expires_at: DateTime<Utc>,
    ) -> Result<User, Error> {
        sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET verification_code = $2, code_expires_at = $3, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(verification_code)
        .bind(code_expires_at)
        .fetch_one(&self.pool)
        .await
    }

    async fn mark_verified(&self, user_id: Uuid) -> Result<User, Error> {
        sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET is_verified = TRUE, verification_code = NULL, code_expires_at = NULL,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
    }

    async fn touch_last_connection(&self, user_id: Uuid) -> Result<(), Error> {
        sqlx::query(r#"UPDATE users SET last_connection_at = NOW() WHERE id = $1"#)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn get_blocked_users(&self, limit: i64, offset: i64) -> Result<Vec<User>, Error> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT * FROM users
            WHERE is_active = FALSE
            ORDER BY updated_at DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
    }

    async fn count_blocked_users(&self) -> Result<i64, Error> {
        sqlx::query_scalar::<_, i64>(r#"SELECT COUNT(*) FROM users WHERE is_active = FALSE"#)
            .fetch_one(&self.pool)
            .await
    }

    async fn get_profile(&self, user_id: Uuid) -> Result<Option<Profile>, Error> {
        let row = sqlx::query_as::<_, ProfileRow>(r#"SELECT * FROM profiles WHERE user_id = $1"#)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Profile::from))
    }

    async fn upsert_profile(
        &self,
        user_id: Uuid,
        common: ProfileCommon,
        details: ProfileDetails,
    ) -> Result<Profile, Error> {
        let kind = details.kind();
        let mut full_name = None;
        let mut title = None;
        let mut skills = None;
        let mut languages = None;
        let mut hourly_rate = None;
        let mut experience_years = None;
        let mut availability = None;
        let mut client_type = None;
        let mut company_name = None;
        let mut company_website = None;
        let mut industry = None;

        match details {
            ProfileDetails::Freelance {
                full_name: name,
                title: t,
                skills: s,
                languages: l,
                hourly_rate: rate,
                experience_years: years,
                availability: a,
                ..
            } => {
                full_name = Some(name);
                title = t;
                skills = Some(s);
                languages = Some(l);
                hourly_rate = rate;
                experience_years = years;
                availability = a;
            }
            ProfileDetails::Client {
                client_type: ct,
                full_name: name,
                company_name: cn,
                company_website: cw,
                industry: i,
            } => {
                full_name = name;
                client_type = ct;
                company_name = cn;
                company_website = cw;
                industry = i;
            }
        }

        // rating and completed_projects are only written by mission completion
        let row = sqlx::query_as::<_, ProfileRow>(
            r#"
            INSERT INTO profiles (
                user_id, profile_kind, phone, country, city, address, bio, photo_url,
                full_name, title, skills, languages, hourly_rate, experience_years,
                availability, client_type, company_name, company_website, industry
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19)
            ON CONFLICT (user_id) DO UPDATE SET
                profile_kind = EXCLUDED.profile_kind,
                phone = EXCLUDED.phone,
                country = EXCLUDED.country,
                city = EXCLUDED.city,
                address = EXCLUDED.address,
                bio = EXCLUDED.bio,
                photo_url = EXCLUDED.photo_url,
                full_name = EXCLUDED.full_name,
                title = EXCLUDED.title,
                skills = EXCLUDED.skills,
                languages = EXCLUDED.languages,
                hourly_rate = EXCLUDED.hourly_rate,
                experience_years = EXCLUDED.experience_years,
                availability = EXCLUDED.availability,
                client_type = EXCLUDED.client_type,
                company_name = EXCLUDED.company_name,
                company_website = EXCLUDED.company_website,
                industry = EXCLUDED.industry,
                updated_at = NOW()
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(kind)
        .bind(common.phone)
        .bind(common.country)
        .bind(common.city)
        .bind(common.address)
        .bind(common.bio)
        .bind(common.photo_url)
        .bind(full_name)
        .bind(title)
        .bind(skills)
        .bind(languages)
        .bind(hourly_rate)
        .bind(experience_years)
        .bind(availability)
        .bind(client_type)
        .bind(company_name)
        .bind(company_website)
        .bind(industry)
        .fetch_one(&self.pool)
        .await?;

        Ok(Profile::from(row))
    }
}
