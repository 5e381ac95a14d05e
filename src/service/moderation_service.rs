// service/moderation_service.rs
use std::sync::Arc;

use uuid::Uuid;

use crate::{
    db::{complaintdb::ComplaintExt, userdb::UserExt, MarketStore},
    dtos::{
        admindtos::{AdminActionQuery, ComplaintQuery},
        commondtos::{PageDto, RequestQueryDto},
    },
    models::{
        complaintmodel::{AdminAction, Complaint, ComplaintReview},
        usermodel::{Actor, User, UserRole},
    },
    service::{error::ServiceError, guard::authorize},
};

fn clean_notes(notes: Option<String>) -> Option<String> {
    notes.map(|n| n.trim().to_string()).filter(|n| !n.is_empty())
}

#[derive(Clone)]
pub struct ModerationService {
    store: Arc<dyn MarketStore>,
}

impl ModerationService {
    pub fn new(store: Arc<dyn MarketStore>) -> Self {
        Self { store }
    }

    async fn load(&self, complaint_id: Uuid) -> Result<Complaint, ServiceError> {
        self.store
            .get_complaint(complaint_id)
            .await?
            .ok_or_else(|| ServiceError::not_found(format!("Complaint {} not found", complaint_id)))
    }

    fn reviewed(review: ComplaintReview, complaint_id: Uuid) -> Result<Complaint, ServiceError> {
        match review {
            ComplaintReview::Reviewed(complaint) => Ok(complaint),
            ComplaintReview::NotPending(status) => Err(ServiceError::invalid_state(format!(
                "Complaint has already been reviewed ({:?})",
                status
            ))),
            ComplaintReview::Missing => Err(ServiceError::not_found(format!(
                "Complaint {} not found",
                complaint_id
            ))),
        }
    }

    pub async fn file_complaint(
        &self,
        actor: &Actor,
        reported_email: &str,
        reason: &str,
    ) -> Result<Complaint, ServiceError> {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(ServiceError::validation("A reason is required"));
        }

        let reported = self
            .store
            .get_user(None, Some(reported_email.trim()))
            .await?
            .ok_or_else(|| ServiceError::not_found("No account uses the reported email"))?;
        if reported.id == actor.id {
            return Err(ServiceError::validation("You cannot report yourself"));
        }

        let complaint = self
            .store
            .create_complaint(actor.id, reported.email.clone(), reason.to_string())
            .await?;

        tracing::info!("Complaint {} filed against {}", complaint.id, reported.id);
        Ok(complaint)
    }

    pub async fn my_complaints(&self, actor: &Actor) -> Result<Vec<Complaint>, ServiceError> {
        Ok(self.store.list_complaints_by_plaintiff(actor.id).await?)
    }

    pub async fn list_complaints(
        &self,
        actor: &Actor,
        query: ComplaintQuery,
    ) -> Result<PageDto<Complaint>, ServiceError> {
        authorize(actor, &[UserRole::Admin])?;

        let pagination = query.pagination();
        let (limit, offset) = pagination.limit_offset();
        let total = self.store.count_complaints(query.status).await?;
        let items = self.store.list_complaints(query.status, limit, offset).await?;
        Ok(PageDto::new(items, total, &pagination))
    }

    /// Blocks the reported account and closes the complaint in one step.
    pub async fn approve(&self, actor: &Actor, complaint_id: Uuid) -> Result<Complaint, ServiceError> {
        authorize(actor, &[UserRole::Admin])?;

        let complaint = self.load(complaint_id).await?;
        let reported = self
            .store
            .get_user(None, Some(&complaint.reported_email))
            .await?
            .ok_or_else(|| ServiceError::not_found("The reported account no longer exists"))?;
        if reported.role == UserRole::Admin {
            return Err(ServiceError::validation("Admin accounts cannot be blocked"));
        }

        let review = self
            .store
            .approve_complaint(complaint_id, actor.id, reported.id)
            .await?;
        let complaint = Self::reviewed(review, complaint_id)?;

        tracing::info!(
            "Complaint {} approved by {}, user {} blocked",
            complaint_id,
            actor.id,
            reported.id
        );
        Ok(complaint)
    }

    pub async fn reject(
        &self,
        actor: &Actor,
        complaint_id: Uuid,
        notes: Option<String>,
    ) -> Result<Complaint, ServiceError> {
        authorize(actor, &[UserRole::Admin])?;

        let review = self
            .store
            .reject_complaint(complaint_id, actor.id, clean_notes(notes))
            .await?;
        let complaint = Self::reviewed(review, complaint_id)?;

        tracing::info!("Complaint {} rejected by {}", complaint_id, actor.id);
        Ok(complaint)
    }

    pub async fn delete(&self, actor: &Actor, complaint_id: Uuid) -> Result<(), ServiceError> {
        authorize(actor, &[UserRole::Admin])?;

        if !self.store.delete_complaint(complaint_id).await? {
            return Err(ServiceError::not_found(format!(
                "Complaint {} not found",
                complaint_id
            )));
        }
        tracing::info!("Complaint {} deleted by {}", complaint_id, actor.id);
        Ok(())
    }

    pub async fn blocked_accounts(
        &self,
        actor: &Actor,
        pagination: RequestQueryDto,
    ) -> Result<PageDto<User>, ServiceError> {
        authorize(actor, &[UserRole::Admin])?;

        let (limit, offset) = pagination.limit_offset();
        let total = self.store.count_blocked_users().await?;
        let items = self.store.get_blocked_users(limit, offset).await?;
        Ok(PageDto::new(items, total, &pagination))
    }

    pub async fn unblock(
        &self,
        actor: &Actor,
        user_id: Uuid,
        notes: Option<String>,
    ) -> Result<User, ServiceError> {
        authorize(actor, &[UserRole::Admin])?;

        let user = self
            .store
            .get_user(Some(user_id), None)
            .await?
            .ok_or_else(|| ServiceError::not_found(format!("User {} not found", user_id)))?;
        if user.is_active {
            return Err(ServiceError::invalid_state("This account is not blocked"));
        }

        let user = self
            .store
            .unblock_user(user_id, actor.id, clean_notes(notes))
            .await?
            .ok_or_else(|| ServiceError::invalid_state("This account is not blocked"))?;

        tracing::info!("User {} unblocked by {}", user_id, actor.id);
        Ok(user)
    }

    pub async fn actions(
        &self,
        actor: &Actor,
        query: AdminActionQuery,
    ) -> Result<PageDto<AdminAction>, ServiceError> {
        authorize(actor, &[UserRole::Admin])?;

        let pagination = query.pagination();
        let (limit, offset) = pagination.limit_offset();
        let total = self
            .store
            .count_admin_actions(query.admin_id, query.action_type)
            .await?;
        let items = self
            .store
            .list_admin_actions(query.admin_id, query.action_type, limit, offset)
            .await?;
        Ok(PageDto::new(items, total, &pagination))
    }

    pub async fn my_actions(
        &self,
        actor: &Actor,
        pagination: RequestQueryDto,
    ) -> Result<PageDto<AdminAction>, ServiceError> {
        self.actions(
            actor,
            AdminActionQuery {
                admin_id: Some(actor.id),
                action_type: None,
                page: pagination.page,
                per_page: pagination.per_page,
            },
        )
        .await
    }
}
