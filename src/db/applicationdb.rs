// db/applicationdb.rs
use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::{Error, Row};
use uuid::Uuid;

use super::{
    chatdb::upsert_mission_chat_tx,
    db::{is_unique_violation, DBClient},
};
use crate::models::missionmodel::*;

#[async_trait]
pub trait ApplicationExt {
    /// `None` when the freelancer already holds a row for this mission or
    /// the mission is not OPEN at insert time.
    async fn create_application(
        &self,
        mission_id: Uuid,
        freelance_id: Uuid,
    ) -> Result<Option<Application>, Error>;

    async fn get_application(&self, application_id: Uuid) -> Result<Option<Application>, Error>;

    async fn find_application(
        &self,
        mission_id: Uuid,
        freelance_id: Uuid,
    ) -> Result<Option<Application>, Error>;

    async fn list_applications_for_mission(&self, mission_id: Uuid) -> Result<Vec<Application>, Error>;

    async fn list_applications_for_freelancer(
        &self,
        freelance_id: Uuid,
    ) -> Result<Vec<Application>, Error>;

    async fn application_counts(
        &self,
        mission_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, ApplicationCounts>, Error>;

    async fn get_accepted_application(&self, mission_id: Uuid) -> Result<Option<Application>, Error>;

    /// Accepts the application, rejects its pending siblings, starts the
    /// mission and binds the mission chat, all under a lock on the mission.
    async fn accept_application(&self, application_id: Uuid) -> Result<AcceptOutcome, Error>;

    /// `None` when the application is no longer PENDING.
    async fn reject_application(&self, application_id: Uuid) -> Result<Option<Application>, Error>;
}

#[async_trait]
impl ApplicationExt for DBClient {
    async fn create_application(
        &self,
        mission_id: Uuid,
        freelance_id: Uuid,
    ) -> Result<Option<Application>, Error> {
        // FOR SHARE waits on an accept holding the mission row, then re-checks OPEN
        sqlx::query_as::<_, Application>(
            r#"
            INSERT INTO applications (mission_id, freelance_id, status)
            SELECT $1, $2, 'PENDING'::application_status
            WHERE EXISTS (
                SELECT 1 FROM missions WHERE id = $1 AND status = 'OPEN' FOR SHARE
            )
            ON CONFLICT (mission_id, freelance_id) DO NOTHING
            RETURNING *
            "#,
        )
        .bind(mission_id)
        .bind(freelance_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn get_application(&self, application_id: Uuid) -> Result<Option<Application>, Error> {
        sqlx::query_as::<_, Application>(r#"SELECT * FROM applications WHERE id = $1"#)
            .bind(application_id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn find_application(
        &self,
        mission_id: Uuid,
        freelance_id: Uuid,
    ) -> Result<Option<Application>, Error> {
        sqlx::query_as::<_, Application>(
            r#"SELECT * FROM applications WHERE mission_id = $1 AND freelance_id = $2"#,
        )
        .bind(mission_id)
        .bind(freelance_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn list_applications_for_mission(&self, mission_id: Uuid) -> Result<Vec<Application>, Error> {
        sqlx::query_as::<_, Application>(
            r#"SELECT * FROM applications WHERE mission_id = $1 ORDER BY created_at ASC"#,
        )
        .bind(mission_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn list_applications_for_freelancer(
        &self,
        freelance_id: Uuid,
    ) -> Result<Vec<Application>, Error> {
        sqlx::query_as::<_, Application>(
            r#"SELECT * FROM applications WHERE freelance_id = $1 ORDER BY created_at DESC"#,
        )
        .bind(freelance_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn application_counts(
        &self,
        mission_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, ApplicationCounts>, Error> {
        let rows = sqlx::query(
            r#"
            SELECT mission_id,
                   COUNT(*) AS total,
                   COUNT(*) FILTER (WHERE status = 'PENDING') AS pending
            FROM applications
            WHERE mission_id = ANY($1)
            GROUP BY mission_id
            "#,
        )
        .bind(mission_ids)
        .fetch_all(&self.pool)
        .await?;

        let mut counts = HashMap::new();
        for row in rows {
            counts.insert(
                row.try_get::<Uuid, _>("mission_id")?,
                ApplicationCounts {
                    total: row.try_get("total")?,
                    pending: row.try_get("pending")?,
                },
            );
        }
        Ok(counts)
    }

    async fn get_accepted_application(&self, mission_id: Uuid) -> Result<Option<Application>, Error> {
        sqlx::query_as::<_, Application>(
            r#"SELECT * FROM applications WHERE mission_id = $1 AND status = 'ACCEPTED'"#,
        )
        .bind(mission_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn accept_application(&self, application_id: Uuid) -> Result<AcceptOutcome, Error> {
        let mut tx = self.pool.begin().await?;

        let mission_id: Option<Uuid> = sqlx::query_scalar(
            r#"SELECT mission_id FROM applications WHERE id = $1"#,
        )
        .bind(application_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(mission_id) = mission_id else {
            return Ok(AcceptOutcome::Missing);
        };

        // Serialises concurrent decisions on the same mission
        let mission = sqlx::query_as::<_, Mission>(
            r#"SELECT * FROM missions WHERE id = $1 FOR UPDATE"#,
        )
        .bind(mission_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(mission) = mission else {
            return Ok(AcceptOutcome::Missing);
        };

        let winner: Option<Uuid> = sqlx::query_scalar(
            r#"
            SELECT id FROM applications
            WHERE mission_id = $1 AND status = 'ACCEPTED' AND id <> $2
            "#,
        )
        .bind(mission_id)
        .bind(application_id)
        .fetch_optional(&mut *tx)
        .await?;

        if winner.is_some() {
            return Ok(AcceptOutcome::AlreadyAccepted);
        }

        let application = sqlx::query_as::<_, Application>(
            r#"SELECT * FROM applications WHERE id = $1 FOR UPDATE"#,
        )
        .bind(application_id)
        .fetch_one(&mut *tx)
        .await?;

        if application.status != ApplicationStatus::Pending {
            return Ok(AcceptOutcome::NotPending(application.status));
        }

        if mission.status != MissionStatus::Open {
            return Ok(AcceptOutcome::MissionNotOpen(mission.status));
        }

        let accepted = sqlx::query_as::<_, Application>(
            r#"
            UPDATE applications
            SET status = 'ACCEPTED', updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(application_id)
        .fetch_one(&mut *tx)
        .await;

        let application = match accepted {
            Ok(application) => application,
            Err(err) if is_unique_violation(&err) => return Ok(AcceptOutcome::AlreadyAccepted),
            Err(err) => return Err(err),
        };

        let rejected_siblings = sqlx::query(
            r#"
            UPDATE applications
            SET status = 'REJECTED', updated_at = NOW()
            WHERE mission_id = $1 AND id <> $2 AND status = 'PENDING'
            "#,
        )
        .bind(mission_id)
        .bind(application_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        let mission = sqlx::query_as::<_, Mission>(
            r#"
            UPDATE missions
            SET status = 'IN_PROGRESS', assigned_freelance_id = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(mission_id)
        .bind(application.freelance_id)
        .fetch_one(&mut *tx)
        .await?;

        let chat = upsert_mission_chat_tx(
            &mut tx,
            mission_id,
            mission.client_id,
            Some(application.freelance_id),
        )
        .await?;

        tx.commit().await?;

        Ok(AcceptOutcome::Accepted {
            application,
            mission,
            chat,
            rejected_siblings,
        })
    }

    async fn reject_application(&self, application_id: Uuid) -> Result<Option<Application>, Error> {
        sqlx::query_as::<_, Application>(
            r#"
            UPDATE applications
            SET status = 'REJECTED', updated_at = NOW()
            WHERE id = $1 AND status = 'PENDING'
            RETURNING *
            "#,
        )
        .bind(application_id)
        .fetch_optional(&self.pool)
        .await
    }
}
