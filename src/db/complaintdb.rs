// db/complaintdb.rs
use async_trait::async_trait;
use sqlx::{Error, Postgres, QueryBuilder, Transaction};
use uuid::Uuid;

use super::db::DBClient;
use crate::models::{complaintmodel::*, usermodel::User};

#[async_trait]
pub trait ComplaintExt {
    async fn create_complaint(
        &self,
        plaintiff_id: Uuid,
        reported_email: String,
        reason: String,
    ) -> Result<Complaint, Error>;

    async fn get_complaint(&self, complaint_id: Uuid) -> Result<Option<Complaint>, Error>;

    async fn list_complaints_by_plaintiff(&self, plaintiff_id: Uuid) -> Result<Vec<Complaint>, Error>;

    async fn list_complaints(
        &self,
        status: Option<ComplaintStatus>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Complaint>, Error>;

    async fn count_complaints(&self, status: Option<ComplaintStatus>) -> Result<i64, Error>;

    /// Blocks `reported_user_id`, closes the complaint and logs both actions.
    async fn approve_complaint(
        &self,
        complaint_id: Uuid,
        admin_id: Uuid,
        reported_user_id: Uuid,
    ) -> Result<ComplaintReview, Error>;

    async fn reject_complaint(
        &self,
        complaint_id: Uuid,
        admin_id: Uuid,
        notes: Option<String>,
    ) -> Result<ComplaintReview, Error>;

    async fn delete_complaint(&self, complaint_id: Uuid) -> Result<bool, Error>;

    /// Reactivates a blocked user. `None` if the user is not blocked.
    async fn unblock_user(
        &self,
        user_id: Uuid,
        admin_id: Uuid,
        notes: Option<String>,
    ) -> Result<Option<User>, Error>;

    async fn list_admin_actions(
        &self,
        admin_id: Option<Uuid>,
        action_type: Option<AdminActionType>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<AdminAction>, Error>;

    async fn count_admin_actions(
        &self,
        admin_id: Option<Uuid>,
        action_type: Option<AdminActionType>,
    ) -> Result<i64, Error>;
}

async fn log_action_tx(
    tx: &mut Transaction<'_, Postgres>,
    admin_id: Uuid,
    action_type: AdminActionType,
    target_user_id: Option<Uuid>,
    complaint_id: Option<Uuid>,
    notes: Option<String>,
) -> Result<(), Error> {
    sqlx::query(
        r#"
        INSERT INTO admin_actions (admin_id, action_type, target_user_id, complaint_id, notes)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(admin_id)
    .bind(action_type)
    .bind(target_user_id)
    .bind(complaint_id)
    .bind(notes)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

async fn lock_pending_tx(
    tx: &mut Transaction<'_, Postgres>,
    complaint_id: Uuid,
) -> Result<Result<Complaint, ComplaintReview>, Error> {
    let complaint = sqlx::query_as::<_, Complaint>(
        r#"SELECT * FROM complaints WHERE id = $1 FOR UPDATE"#,
    )
    .bind(complaint_id)
    .fetch_optional(&mut **tx)
    .await?;

    Ok(match complaint {
        None => Err(ComplaintReview::Missing),
        Some(c) if c.status != ComplaintStatus::Pending => Err(ComplaintReview::NotPending(c.status)),
        Some(c) => Ok(c),
    })
}

fn push_action_filter(
    builder: &mut QueryBuilder<'_, Postgres>,
    admin_id: Option<Uuid>,
    action_type: Option<AdminActionType>,
) {
    builder.push(" WHERE TRUE");
    if let Some(admin_id) = admin_id {
        builder.push(" AND admin_id = ").push_bind(admin_id);
    }
    if let Some(action_type) = action_type {
        builder.push(" AND action_type = ").push_bind(action_type);
    }
}

#[async_trait]
impl ComplaintExt for DBClient {
    async fn create_complaint(
        &self,
        plaintiff_id: Uuid,
        reported_email: String,
        reason: String,
    ) -> Result<Complaint, Error> {
        sqlx::query_as::<_, Complaint>(
            r#"
            INSERT INTO complaints (plaintiff_id, reported_email, reason, status)
            VALUES ($1, $2, $3, 'PENDING')
            RETURNING *
            "#,
        )
        .bind(plaintiff_id)
        .bind(reported_email)
        .bind(reason)
        .fetch_one(&self.pool)
        .await
    }

    async fn get_complaint(&self, complaint_id: Uuid) -> Result<Option<Complaint>, Error> {
        sqlx::query_as::<_, Complaint>(r#"SELECT * FROM complaints WHERE id = $1"#)
            .bind(complaint_id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn list_complaints_by_plaintiff(&self, plaintiff_id: Uuid) -> Result<Vec<Complaint>, Error> {
        sqlx::query_as::<_, Complaint>(
            r#"SELECT * FROM complaints WHERE plaintiff_id = $1 ORDER BY created_at DESC"#,
        )
        .bind(plaintiff_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn list_complaints(
        &self,
        status: Option<ComplaintStatus>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Complaint>, Error> {
        sqlx::query_as::<_, Complaint>(
            r#"
            SELECT * FROM complaints
            WHERE ($1::complaint_status IS NULL OR status = $1)
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(status)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
    }

    async fn count_complaints(&self, status: Option<ComplaintStatus>) -> Result<i64, Error> {
        sqlx::query_scalar::<_, i64>(
            r#"SELECT COUNT(*) FROM complaints WHERE ($1::complaint_status IS NULL OR status = $1)"#,
        )
        .bind(status)
        .fetch_one(&self.pool)
        .await
    }

    async fn approve_complaint(
        &self,
        complaint_id: Uuid,
        admin_id: Uuid,
        reported_user_id: Uuid,
    ) -> Result<ComplaintReview, Error> {
        let mut tx = self.pool.begin().await?;

        if let Err(review) = lock_pending_tx(&mut tx, complaint_id).await? {
            return Ok(review);
        }

        sqlx::query(r#"UPDATE users SET is_active = FALSE, updated_at = NOW() WHERE id = $1"#)
            .bind(reported_user_id)
            .execute(&mut *tx)
            .await?;

        let complaint = sqlx::query_as::<_, Complaint>(
            r#"
            UPDATE complaints
            SET status = 'APPROVED', reviewed_by = $2, reviewed_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(complaint_id)
        .bind(admin_id)
        .fetch_one(&mut *tx)
        .await?;

        log_action_tx(
            &mut tx,
            admin_id,
            AdminActionType::ApproveComplaint,
            Some(reported_user_id),
            Some(complaint_id),
            None,
        )
        .await?;
        log_action_tx(
            &mut tx,
            admin_id,
            AdminActionType::BlockUser,
            Some(reported_user_id),
            Some(complaint_id),
            Some(complaint.reason.clone()),
        )
        .await?;

        tx.commit().await?;

        Ok(ComplaintReview::Reviewed(complaint))
    }

    async fn reject_complaint(
        &self,
        complaint_id: Uuid,
        admin_id: Uuid,
        notes: Option<String>,
    ) -> Result<ComplaintReview, Error> {
        let mut tx = self.pool.begin().await?;

        if let Err(review) = lock_pending_tx(&mut tx, complaint_id).await? {
            return Ok(review);
        }

        let complaint = sqlx::query_as::<_, Complaint>(
            r#"
            UPDATE complaints
            SET status = 'REJECTED', reviewed_by = $2, reviewed_at = NOW(), review_notes = $3
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(complaint_id)
        .bind(admin_id)
        .bind(&notes)
        .fetch_one(&mut *tx)
        .await?;

        log_action_tx(
            &mut tx,
            admin_id,
            AdminActionType::RejectComplaint,
            None,
            Some(complaint_id),
            notes,
        )
        .await?;

        tx.commit().await?;

        Ok(ComplaintReview::Reviewed(complaint))
    }

    async fn delete_complaint(&self, complaint_id: Uuid) -> Result<bool, Error> {
        let result = sqlx::query(r#"DELETE FROM complaints WHERE id = $1"#)
            .bind(complaint_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn unblock_user(
        &self,
        user_id: Uuid,
        admin_id: Uuid,
        notes: Option<String>,
    ) -> Result<Option<User>, Error> {
        let mut tx = self.pool.begin().await?;

        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET is_active = TRUE, updated_at = NOW()
            WHERE id = $1 AND is_active = FALSE
            RETURNING *
            "#,
        )
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?;

        if user.is_none() {
            return Ok(None);
        }

        log_action_tx(
            &mut tx,
            admin_id,
            AdminActionType::UnblockUser,
            Some(user_id),
            None,
            notes,
        )
        .await?;

        tx.commit().await?;

        Ok(user)
    }

    async fn list_admin_actions(
        &self,
        admin_id: Option<Uuid>,
        action_type: Option<AdminActionType>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<AdminAction>, Error> {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT * FROM admin_actions");
        push_action_filter(&mut builder, admin_id, action_type);
        builder
            .push(" ORDER BY created_at DESC LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(offset);

        builder
            .build_query_as::<AdminAction>()
            .fetch_all(&self.pool)
            .await
    }

    async fn count_admin_actions(
        &self,
        admin_id: Option<Uuid>,
        action_type: Option<AdminActionType>,
    ) -> Result<i64, Error> {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM admin_actions");
        push_action_filter(&mut builder, admin_id, action_type);

        builder
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await
    }
}
