// db/profiledb.rs
use std::collections::BTreeMap;

use async_trait::async_trait;
use sqlx::{Error, Postgres, QueryBuilder, Row};
use uuid::Uuid;

use super::{db::DBClient, missiondb::like_pattern};
use crate::models::{portfoliomodel::*, usermodel::*};

pub const TOP_SKILLS: i64 = 10;

const FREELANCER_TABLES: &str = " FROM profiles p JOIN users u ON u.id = p.user_id";

// active FREELANCE accounts that filled in a freelance profile
const LISTED: &str =
    " WHERE u.role = 'FREELANCE' AND u.is_active AND p.profile_kind = 'freelance'";

#[async_trait]
pub trait ProfileExt {
    async fn add_portfolio_item(
        &self,
        user_id: Uuid,
        title: String,
        description: Option<String>,
        url: Option<String>,
        image_url: Option<String>,
    ) -> Result<PortfolioItem, Error>;

    async fn get_portfolio_item(&self, item_id: Uuid) -> Result<Option<PortfolioItem>, Error>;

    /// Newest first.
    async fn list_portfolio(&self, user_id: Uuid) -> Result<Vec<PortfolioItem>, Error>;

    /// Writes the editable fields back. `None` when the item is gone.
    async fn save_portfolio_item(&self, item: &PortfolioItem) -> Result<Option<PortfolioItem>, Error>;

    async fn delete_portfolio_item(&self, item_id: Uuid) -> Result<bool, Error>;

    /// Best rated first, then most completed projects.
    async fn search_freelancers(&self, filter: &FreelancerFilter) -> Result<Vec<Profile>, Error>;

    async fn count_freelancers(&self, filter: &FreelancerFilter) -> Result<i64, Error>;

    /// Unrounded aggregates over every listed freelancer.
    async fn freelancer_stats(&self) -> Result<FreelancerStats, Error>;
}

fn push_freelancer_filter(builder: &mut QueryBuilder<'_, Postgres>, filter: &FreelancerFilter) {
    builder.push(FREELANCER_TABLES).push(LISTED);

    if !filter.skills.is_empty() {
        builder
            .push(" AND EXISTS (SELECT 1 FROM unnest(p.skills) AS s(skill) WHERE LOWER(s.skill) = ANY(")
            .push_bind(filter.skills.clone())
            .push("))");
    }
    if let Some(min_rate) = filter.min_rate {
        builder.push(" AND p.hourly_rate >= ").push_bind(min_rate);
    }
    if let Some(max_rate) = filter.max_rate {
        builder.push(" AND p.hourly_rate <= ").push_bind(max_rate);
    }
    if let Some(min_rating) = filter.min_rating {
        builder
            .push(" AND COALESCE(p.rating, 0) >= ")
            .push_bind(min_rating);
    }
    if let Some(min_experience) = filter.min_experience {
        builder
            .push(" AND p.experience_years >= ")
            .push_bind(min_experience);
    }
    if let Some(availability) = &filter.availability {
        builder
            .push(" AND p.availability ILIKE ")
            .push_bind(like_pattern(availability));
    }
    if let Some(text) = &filter.text {
        let pattern = like_pattern(text);
        builder
            .push(" AND (p.full_name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR p.title ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR p.bio ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

#[async_trait]
impl ProfileExt for DBClient {
    async fn add_portfolio_item(
        &self,
        user_id: Uuid,
        title: String,
        description: Option<String>,
        url: Option<String>,
        image_url: Option<String>,
    ) -> Result<PortfolioItem, Error> {
        sqlx::query_as::<_, PortfolioItem>(
            r#"
            INSERT INTO portfolio_items (user_id, title, description, url, image_url)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(title)
        .bind(description)
        .bind(url)
        .bind(image_url)
        .fetch_one(&self.pool)
        .await
    }

    async fn get_portfolio_item(&self, item_id: Uuid) -> Result<Option<PortfolioItem>, Error> {
        sqlx::query_as::<_, PortfolioItem>(r#"SELECT * FROM portfolio_items WHERE id = $1"#)
            .bind(item_id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn list_portfolio(&self, user_id: Uuid) -> Result<Vec<PortfolioItem>, Error> {
        sqlx::query_as::<_, PortfolioItem>(
            r#"SELECT * FROM portfolio_items WHERE user_id = $1 ORDER BY created_at DESC"#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn save_portfolio_item(&self, item: &PortfolioItem) -> Result<Option<PortfolioItem>, Error> {
        sqlx::query_as::<_, PortfolioItem>(
            r#"
            UPDATE portfolio_items
            SET title = $2, description = $3, url = $4, image_url = $5, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(item.id)
        .bind(&item.title)
        .bind(&item.description)
        .bind(&item.url)
        .bind(&item.image_url)
        .fetch_optional(&self.pool)
        .await
    }

    async fn delete_portfolio_item(&self, item_id: Uuid) -> Result<bool, Error> {
        let result = sqlx::query(r#"DELETE FROM portfolio_items WHERE id = $1"#)
            .bind(item_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn search_freelancers(&self, filter: &FreelancerFilter) -> Result<Vec<Profile>, Error> {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT p.*");
        push_freelancer_filter(&mut builder, filter);

        builder
            .push(
                " ORDER BY p.rating DESC NULLS LAST, p.completed_projects DESC NULLS LAST, \
                 p.updated_at DESC LIMIT ",
            )
            .push_bind(filter.limit)
            .push(" OFFSET ")
            .push_bind(filter.offset);

        let rows = builder
            .build_query_as::<ProfileRow>()
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Profile::from).collect())
    }

    async fn count_freelancers(&self, filter: &FreelancerFilter) -> Result<i64, Error> {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*)");
        push_freelancer_filter(&mut builder, filter);

        builder
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await
    }

    async fn freelancer_stats(&self) -> Result<FreelancerStats, Error> {
        // AVG skips NULL, so the rate average only covers freelancers with a rate
        let sql = format!(
            r#"
            SELECT COUNT(*) AS total,
                   COALESCE(SUM(p.completed_projects), 0)::int8 AS completed,
                   COALESCE(AVG(COALESCE(p.rating, 0)), 0)::float8 AS rating,
                   COALESCE(AVG(p.hourly_rate), 0)::float8 AS rate,
                   COALESCE(AVG(p.experience_years), 0)::float8 AS experience
            {}{}
            "#,
            FREELANCER_TABLES, LISTED
        );
        let totals = sqlx::query(&sql).fetch_one(&self.pool).await?;

        let mut stats = FreelancerStats {
            total_freelancers: totals.try_get("total")?,
            total_completed_projects: totals.try_get("completed")?,
            average_rating: totals.try_get("rating")?,
            average_hourly_rate: totals.try_get("rate")?,
            average_experience_years: totals.try_get("experience")?,
            ..Default::default()
        };

        let sql = format!(
            r#"
            SELECT LOWER(p.availability) AS availability, COUNT(*) AS count
            {}{} AND p.availability IS NOT NULL
            GROUP BY LOWER(p.availability)
            "#,
            FREELANCER_TABLES, LISTED
        );
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;
        let mut distribution = BTreeMap::new();
        for row in rows {
            distribution.insert(row.try_get::<String, _>("availability")?, row.try_get("count")?);
        }
        stats.availability_distribution = distribution;

        let sql = format!(
            r#"
            SELECT LOWER(s.skill) AS skill, COUNT(*) AS count
            {} CROSS JOIN LATERAL unnest(p.skills) AS s(skill){}
            GROUP BY LOWER(s.skill)
            ORDER BY count DESC, skill ASC
            LIMIT $1
            "#,
            FREELANCER_TABLES, LISTED
        );
        let rows = sqlx::query(&sql)
            .bind(TOP_SKILLS)
            .fetch_all(&self.pool)
            .await?;
        for row in rows {
            stats.top_skills.push(SkillCount {
                skill: row.try_get("skill")?,
                count: row.try_get("count")?,
            });
        }

        Ok(stats)
    }
}
