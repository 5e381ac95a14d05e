// db/missiondb.rs
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Error, Postgres, QueryBuilder, Row};
use uuid::Uuid;

use super::db::DBClient;
use crate::models::missionmodel::*;

#[async_trait]
pub trait MissionExt {
    async fn create_mission(
        &self,
        client_id: Uuid,
        title: String,
        description: String,
        budget: Option<f64>,
        deadline: Option<DateTime<Utc>>,
        required_skills: Vec<String>,
    ) -> Result<Mission, Error>;

    async fn get_mission(&self, mission_id: Uuid) -> Result<Option<Mission>, Error>;

    /// Writes the editable fields back, provided the mission is still
    /// DRAFT or OPEN. `None` when it no longer is.
    async fn save_mission_fields(&self, mission: &Mission) -> Result<Option<Mission>, Error>;

    /// Compare-and-set on status. `None` if the mission left `from`.
    async fn set_mission_status(
        &self,
        mission_id: Uuid,
        from: MissionStatus,
        to: MissionStatus,
    ) -> Result<Option<Mission>, Error>;

    /// Cancels the mission and every non-terminal application in one
    /// transaction. `None` if the mission is missing or already terminal.
    async fn cancel_mission(&self, mission_id: Uuid) -> Result<Option<(Mission, u64)>, Error>;

    async fn delete_mission(&self, mission_id: Uuid) -> Result<MissionDeletion, Error>;

    async fn complete_mission(
        &self,
        mission_id: Uuid,
        rating: Option<f64>,
        feedback: Option<String>,
    ) -> Result<CompletionOutcome, Error>;

    async fn list_missions(&self, filter: &MissionFilter) -> Result<Vec<Mission>, Error>;

    async fn count_missions(&self, filter: &MissionFilter) -> Result<i64, Error>;

    async fn mission_stats(&self, client_id: Uuid) -> Result<MissionStats, Error>;
}

pub(crate) fn like_pattern(text: &str) -> String {
    let escaped = text
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

fn push_mission_filter(builder: &mut QueryBuilder<'_, Postgres>, filter: &MissionFilter) {
    builder.push(" WHERE TRUE");

    if let Some(client_id) = filter.client_id {
        builder.push(" AND client_id = ").push_bind(client_id);
    }
    if let Some(status) = filter.status {
        builder.push(" AND status = ").push_bind(status);
    }
    if let Some(min_budget) = filter.min_budget {
        builder.push(" AND budget >= ").push_bind(min_budget);
    }
    if let Some(max_budget) = filter.max_budget {
        builder.push(" AND budget <= ").push_bind(max_budget);
    }
    if !filter.skills.is_empty() {
        builder
            .push(" AND required_skills @> ")
            .push_bind(filter.skills.clone());
    }
    if let Some(text) = &filter.text {
        let pattern = like_pattern(text);
        builder
            .push(" AND (title ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR description ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
    if let Some(before) = filter.deadline_before {
        builder.push(" AND deadline <= ").push_bind(before);
    }
    if let Some(freelance_id) = filter.exclude_applied_by {
        builder
            .push(" AND NOT EXISTS (SELECT 1 FROM applications a WHERE a.mission_id = missions.id AND a.freelance_id = ")
            .push_bind(freelance_id)
            .push(")");
    }
}

#[async_trait]
impl MissionExt for DBClient {
    async fn create_mission(
        &self,
        client_id: Uuid,
        title: String,
        description: String,
        budget: Option<f64>,
        deadline: Option<DateTime<Utc>>,
        required_skills: Vec<String>,
    ) -> Result<Mission, Error> {
        sqlx::query_as::<_, Mission>(
            r#"
            INSERT INTO missions (client_id, title, description, budget, deadline, required_skills, status)
            VALUES ($1, $2, $3, $4, $5, $6, 'DRAFT')
            RETURNING *
            "#,
        )
        .bind(client_id)
        .bind(title)
        .bind(description)
        .bind(budget)
        .bind(deadline)
        .bind(required_skills)
        .fetch_one(&self.pool)
        .await
    }

    async fn get_mission(&self, mission_id: Uuid) -> Result<Option<Mission>, Error> {
        sqlx::query_as::<_, Mission>(r#"SELECT * FROM missions WHERE id = $1"#)
            .bind(mission_id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn save_mission_fields(&self, mission: &Mission) -> Result<Option<Mission>, Error> {
        sqlx::query_as::<_, Mission>(
            r#"
            UPDATE missions
            SET title = $2, description = $3, budget = $4, deadline = $5,
                required_skills = $6, updated_at = NOW()
            WHERE id = $1 AND status IN ('DRAFT', 'OPEN')
            RETURNING *
            "#,
        )
        .bind(mission.id)
        .bind(&mission.title)
        .bind(&mission.description)
        .bind(mission.budget)
        .bind(mission.deadline)
        .bind(&mission.required_skills)
        .fetch_optional(&self.pool)
        .await
    }

    async fn set_mission_status(
        &self,
        mission_id: Uuid,
        from: MissionStatus,
        to: MissionStatus,
    ) -> Result<Option<Mission>, Error> {
        sqlx::query_as::<_, Mission>(
            r#"
            UPDATE missions
            SET status = $3, updated_at = NOW()
            WHERE id = $1 AND status = $2
            RETURNING *
            "#,
        )
        .bind(mission_id)
        .bind(from)
        .bind(to)
        .fetch_optional(&self.pool)
        .await
    }

    async fn cancel_mission(&self, mission_id: Uuid) -> Result<Option<(Mission, u64)>, Error> {
        let mut tx = self.pool.begin().await?;

        let locked = sqlx::query_as::<_, Mission>(
            r#"SELECT * FROM missions WHERE id = $1 FOR UPDATE"#,
        )
        .bind(mission_id)
        .fetch_optional(&mut *tx)
        .await?;

        match locked {
            Some(mission) if !mission.status.is_terminal() => {}
            _ => return Ok(None),
        }

        let cancelled = sqlx::query(
            r#"
            UPDATE applications
            SET status = 'CANCELLED', updated_at = NOW()
            WHERE mission_id = $1 AND status = 'PENDING'
            "#,
        )
        .bind(mission_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        let mission = sqlx::query_as::<_, Mission>(
            r#"
            UPDATE missions
            SET status = 'CANCELLED', updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(mission_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(Some((mission, cancelled)))
    }

    async fn delete_mission(&self, mission_id: Uuid) -> Result<MissionDeletion, Error> {
        let mut tx = self.pool.begin().await?;

        let mission = sqlx::query_as::<_, Mission>(
            r#"SELECT * FROM missions WHERE id = $1 FOR UPDATE"#,
        )
        .bind(mission_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(mission) = mission else {
            return Ok(MissionDeletion::Missing);
        };

        if mission.status == MissionStatus::InProgress {
            return Ok(MissionDeletion::InProgress);
        }

        if mission.status == MissionStatus::Open {
            let applications: i64 = sqlx::query_scalar(
                r#"SELECT COUNT(*) FROM applications WHERE mission_id = $1"#,
            )
            .bind(mission_id)
            .fetch_one(&mut *tx)
            .await?;

            if applications > 0 {
                return Ok(MissionDeletion::HasApplications(applications));
            }
        }

        // messages, chat, deliverables, applications, then the mission itself
        sqlx::query(
            r#"
            DELETE FROM messages
            WHERE chat_id IN (SELECT id FROM chats WHERE mission_id = $1)
            "#,
        )
        .bind(mission_id)
        .execute(&mut *tx)
        .await?;

        sqlx::query(r#"DELETE FROM chats WHERE mission_id = $1"#)
            .bind(mission_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query(r#"DELETE FROM deliverables WHERE mission_id = $1"#)
            .bind(mission_id)
            .execute(&mut *tx)
            .await?;

        let applications_removed = sqlx::query(r#"DELETE FROM applications WHERE mission_id = $1"#)
            .bind(mission_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        sqlx::query(r#"DELETE FROM missions WHERE id = $1"#)
            .bind(mission_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(MissionDeletion::Deleted {
            applications_removed,
        })
    }

    async fn complete_mission(
        &self,
        mission_id: Uuid,
        rating: Option<f64>,
        feedback: Option<String>,
    ) -> Result<CompletionOutcome, Error> {
        let mut tx = self.pool.begin().await?;

        let mission = sqlx::query_as::<_, Mission>(
            r#"SELECT * FROM missions WHERE id = $1 FOR UPDATE"#,
        )
        .bind(mission_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(mission) = mission else {
            return Ok(CompletionOutcome::Missing);
        };

        if mission.status != MissionStatus::InProgress {
            return Ok(CompletionOutcome::NotInProgress(mission.status));
        }

        let application = sqlx::query_as::<_, Application>(
            r#"
            UPDATE applications
            SET client_rating = $2, client_feedback = $3, updated_at = NOW()
            WHERE mission_id = $1 AND status = 'ACCEPTED'
            RETURNING *
            "#,
        )
        .bind(mission_id)
        .bind(rating)
        .bind(&feedback)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(application) = application else {
            return Ok(CompletionOutcome::NoAcceptedApplication);
        };

        let mission = sqlx::query_as::<_, Mission>(
            r#"
            UPDATE missions
            SET status = 'COMPLETED', updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(mission_id)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            UPDATE profiles
            SET rating = CASE
                    WHEN $2::float8 IS NULL THEN rating
                    ELSE (COALESCE(rating, 0) * COALESCE(completed_projects, 0) + $2)
                         / (COALESCE(completed_projects, 0) + 1)
                END,
                completed_projects = COALESCE(completed_projects, 0) + 1,
                updated_at = NOW()
            WHERE user_id = $1 AND profile_kind = 'freelance'
            "#,
        )
        .bind(application.freelance_id)
        .bind(rating)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(CompletionOutcome::Completed {
            mission,
            application,
        })
    }

    async fn list_missions(&self, filter: &MissionFilter) -> Result<Vec<Mission>, Error> {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT * FROM missions");
        push_mission_filter(&mut builder, filter);

        builder
            .push(" ORDER BY ")
            .push(filter.sort.column())
            .push(" ")
            .push(filter.order.keyword())
            .push(" NULLS LAST, created_at DESC LIMIT ")
            .push_bind(filter.limit)
            .push(" OFFSET ")
            .push_bind(filter.offset);

        builder
            .build_query_as::<Mission>()
            .fetch_all(&self.pool)
            .await
    }

    async fn count_missions(&self, filter: &MissionFilter) -> Result<i64, Error> {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM missions");
        push_mission_filter(&mut builder, filter);

        builder
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await
    }

    async fn mission_stats(&self, client_id: Uuid) -> Result<MissionStats, Error> {
        let rows = sqlx::query(
            r#"
            SELECT status, COUNT(*) AS count
            FROM missions
            WHERE client_id = $1
            GROUP BY status
            "#,
        )
        .bind(client_id)
        .fetch_all(&self.pool)
        .await?;

        let mut stats = MissionStats::default();
        for row in rows {
            let status: MissionStatus = row.try_get("status")?;
            let count: i64 = row.try_get("count")?;
            stats.count_status(status, count);
        }

        let budgets = sqlx::query(
            r#"
            SELECT COALESCE(SUM(budget), 0)::float8 AS total,
                   COALESCE(AVG(budget), 0)::float8 AS average
            FROM missions
            WHERE client_id = $1
            "#,
        )
        .bind(client_id)
        .fetch_one(&self.pool)
        .await?;
        stats.total_budget = budgets.try_get("total")?;
        stats.average_budget = budgets.try_get("average")?;

        stats.total_applications = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM applications a
            JOIN missions m ON m.id = a.mission_id
            WHERE m.client_id = $1
            "#,
        )
        .bind(client_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(stats)
    }
}
