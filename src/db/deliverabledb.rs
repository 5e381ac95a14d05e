// db/deliverabledb.rs
use async_trait::async_trait;
use sqlx::Error;
use uuid::Uuid;

use super::db::DBClient;
use crate::models::deliverablemodel::*;

#[async_trait]
pub trait DeliverableExt {
    async fn create_deliverable(
        &self,
        mission_id: Uuid,
        submitted_by: Uuid,
        title: String,
        description: Option<String>,
        file_token: Option<String>,
    ) -> Result<Deliverable, Error>;

    async fn get_deliverable(&self, deliverable_id: Uuid) -> Result<Option<Deliverable>, Error>;

    /// Rewrites content fields while the deliverable is still editable.
    async fn update_deliverable(
        &self,
        deliverable_id: Uuid,
        title: String,
        description: Option<String>,
        file_token: Option<String>,
    ) -> Result<Option<Deliverable>, Error>;

    /// Deletes only while DRAFT.
    async fn delete_deliverable(&self, deliverable_id: Uuid) -> Result<bool, Error>;

    /// Moves the deliverable through `step` if it still sits in one of the
    /// step's source statuses. `None` otherwise.
    async fn transition_deliverable(
        &self,
        deliverable_id: Uuid,
        step: ReviewStep,
        actor_id: Uuid,
        feedback: Option<String>,
    ) -> Result<Option<Deliverable>, Error>;

    async fn list_deliverables_for_mission(&self, mission_id: Uuid) -> Result<Vec<Deliverable>, Error>;

    async fn list_deliverables_by_freelancer(&self, freelance_id: Uuid) -> Result<Vec<Deliverable>, Error>;

    async fn list_deliverables_for_client(&self, client_id: Uuid) -> Result<Vec<Deliverable>, Error>;
}

#[async_trait]
impl DeliverableExt for DBClient {
    async fn create_deliverable(
        &self,
        mission_id: Uuid,
        submitted_by: Uuid,
        title: String,
        description: Option<String>,
        file_token: Option<String>,
    ) -> Result<Deliverable, Error> {
        sqlx::query_as::<_, Deliverable>(
            r#"
            INSERT INTO deliverables (mission_id, submitted_by, title, description, file_token, status)
            VALUES ($1, $2, $3, $4, $5, 'DRAFT')
            RETURNING *
            "#,
        )
        .bind(mission_id)
        .bind(submitted_by)
        .bind(title)
        .bind(description)
        .bind(file_token)
        .fetch_one(&self.pool)
        .await
    }

    async fn get_deliverable(&self, deliverable_id: Uuid) -> Result<Option<Deliverable>, Error> {
        sqlx::query_as::<_, Deliverable>(r#"SELECT * FROM deliverables WHERE id = $1"#)
            .bind(deliverable_id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn update_deliverable(
        &self,
        deliverable_id: Uuid,
        title: String,
        description: Option<String>,
        file_token: Option<String>,
    ) -> Result<Option<Deliverable>, Error> {
        sqlx::query_as::<_, Deliverable>(
            r#"
            UPDATE deliverables
            SET title = $2, description = $3, file_token = $4, updated_at = NOW()
            WHERE id = $1 AND status IN ('DRAFT', 'NEEDS_REVISION')
            RETURNING *
            "#,
        )
        .bind(deliverable_id)
        .bind(title)
        .bind(description)
        .bind(file_token)
        .fetch_optional(&self.pool)
        .await
    }

    async fn delete_deliverable(&self, deliverable_id: Uuid) -> Result<bool, Error> {
        let result = sqlx::query(r#"DELETE FROM deliverables WHERE id = $1 AND status = 'DRAFT'"#)
            .bind(deliverable_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn transition_deliverable(
        &self,
        deliverable_id: Uuid,
        step: ReviewStep,
        actor_id: Uuid,
        feedback: Option<String>,
    ) -> Result<Option<Deliverable>, Error> {
        let stamp = match step {
            ReviewStep::Submit => ", submitted_at = NOW()",
            ReviewStep::StartReview => ", reviewed_by = $4, reviewed_at = NOW()",
            ReviewStep::Accept => ", accepted_by = $4, accepted_at = NOW()",
            ReviewStep::Reject | ReviewStep::RequestRevision => "",
        };

        let sql = format!(
            "UPDATE deliverables \
             SET status = $2, client_feedback = COALESCE($5, client_feedback), updated_at = NOW(){stamp} \
             WHERE id = $1 AND status = ANY($3) \
             RETURNING *"
        );

        sqlx::query_as::<_, Deliverable>(&sql)
            .bind(deliverable_id)
            .bind(step.target())
            .bind(step.sources().to_vec())
            .bind(actor_id)
            .bind(feedback)
            .fetch_optional(&self.pool)
            .await
    }

    async fn list_deliverables_for_mission(&self, mission_id: Uuid) -> Result<Vec<Deliverable>, Error> {
        sqlx::query_as::<_, Deliverable>(
            r#"SELECT * FROM deliverables WHERE mission_id = $1 ORDER BY created_at DESC"#,
        )
        .bind(mission_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn list_deliverables_by_freelancer(&self, freelance_id: Uuid) -> Result<Vec<Deliverable>, Error> {
        sqlx::query_as::<_, Deliverable>(
            r#"SELECT * FROM deliverables WHERE submitted_by = $1 ORDER BY created_at DESC"#,
        )
        .bind(freelance_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn list_deliverables_for_client(&self, client_id: Uuid) -> Result<Vec<Deliverable>, Error> {
        sqlx::query_as::<_, Deliverable>(
            r#"
            SELECT d.* FROM deliverables d
            JOIN missions m ON m.id = d.mission_id
            WHERE m.client_id = $1
            ORDER BY d.created_at DESC
            "#,
        )
        .bind(client_id)
        .fetch_all(&self.pool)
        .await
    }
}
