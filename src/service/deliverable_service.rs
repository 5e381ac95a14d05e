// service/deliverable_service.rs
use std::sync::Arc;

use uuid::Uuid;

use crate::{
    db::{applicationdb::ApplicationExt, deliverabledb::DeliverableExt, missiondb::MissionExt, MarketStore},
    dtos::deliverabledtos::UploadedFile,
    models::{
        deliverablemodel::{Deliverable, DeliverableStatus, ReviewStep},
        missionmodel::{ApplicationStatus, Mission, MissionStatus},
        usermodel::{Actor, UserRole},
    },
    service::{
        error::ServiceError,
        file_storage::FileStorage,
        guard::{authorize, ensure_owner},
    },
};

/// Text content of a deliverable as sent by the freelancer.
#[derive(Debug, Clone)]
pub struct DeliverableContent {
    pub title: String,
    pub description: Option<String>,
}

impl DeliverableContent {
    fn normalized(self) -> Result<Self, ServiceError> {
        let title = self.title.trim().to_string();
        if title.is_empty() {
            return Err(ServiceError::validation("Title is required"));
        }
        let description = self
            .description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());
        Ok(Self { title, description })
    }
}

/// Bytes of a stored deliverable file plus the name it was uploaded with.
#[derive(Debug, Clone)]
pub struct DownloadedFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

fn original_name(token: &str) -> String {
    token
        .split_once('_')
        .map(|(_, name)| name.to_string())
        .unwrap_or_else(|| token.to_string())
}

#[derive(Clone)]
pub struct DeliverableService {
    store: Arc<dyn MarketStore>,
    files: Arc<dyn FileStorage>,
}

impl DeliverableService {
    pub fn new(store: Arc<dyn MarketStore>, files: Arc<dyn FileStorage>) -> Self {
        Self { store, files }
    }

    async fn load(&self, deliverable_id: Uuid) -> Result<Deliverable, ServiceError> {
        self.store
            .get_deliverable(deliverable_id)
            .await?
            .ok_or_else(|| {
                ServiceError::not_found(format!("Deliverable {} not found", deliverable_id))
            })
    }

    async fn load_mission(&self, mission_id: Uuid) -> Result<Mission, ServiceError> {
        self.store
            .get_mission(mission_id)
            .await?
            .ok_or_else(|| ServiceError::not_found(format!("Mission {} not found", mission_id)))
    }

    /// Mission client or assigned freelancer.
    fn ensure_audience(actor: &Actor, mission: &Mission, deliverable: Option<&Deliverable>) -> Result<(), ServiceError> {
        let is_client = actor.id == mission.client_id;
        let is_freelancer = mission.assigned_freelance_id == Some(actor.id)
            || deliverable.is_some_and(|d| d.submitted_by == actor.id);
        if is_client || is_freelancer {
            Ok(())
        } else {
            Err(ServiceError::permission(
                "Only the mission client or its freelancer can access deliverables",
            ))
        }
    }

    /// Deliverables only move while their mission is IN_PROGRESS.
    fn ensure_in_progress(mission: &Mission) -> Result<(), ServiceError> {
        if mission.status == MissionStatus::InProgress {
            Ok(())
        } else {
            Err(ServiceError::invalid_state(format!(
                "Deliverables can only change on missions in progress, mission is {}",
                mission.status.to_str()
            )))
        }
    }

    async fn store_file(&self, file: Option<UploadedFile>) -> Result<Option<String>, ServiceError> {
        match file {
            Some(file) => Ok(Some(self.files.store(&file.file_name, file.bytes).await?)),
            None => Ok(None),
        }
    }

    async fn discard_file(&self, token: Option<&str>) {
        if let Some(token) = token {
            if let Err(e) = self.files.delete(token).await {
                tracing::warn!("Could not delete stored file {}: {}", token, e);
            }
        }
    }

    pub async fn create(
        &self,
        actor: &Actor,
        mission_id: Uuid,
        content: DeliverableContent,
        file: Option<UploadedFile>,
    ) -> Result<Deliverable, ServiceError> {
        authorize(actor, &[UserRole::Freelance])?;
        let content = content.normalized()?;

        let mission = self.load_mission(mission_id).await?;
        Self::ensure_in_progress(&mission)?;

        let assigned = self
            .store
            .find_application(mission_id, actor.id)
            .await?
            .is_some_and(|a| a.status == ApplicationStatus::Accepted);
        if !assigned {
            return Err(ServiceError::permission(
                "Only the freelancer assigned to this mission can add deliverables",
            ));
        }

        let token = self.store_file(file).await?;
        let created = self
            .store
            .create_deliverable(mission_id, actor.id, content.title, content.description, token.clone())
            .await;

        match created {
            Ok(deliverable) => {
                tracing::info!("Deliverable {} created on mission {}", deliverable.id, mission_id);
                Ok(deliverable)
            }
            Err(e) => {
                self.discard_file(token.as_deref()).await;
                Err(e.into())
            }
        }
    }

    /// Rewrites content while DRAFT or NEEDS_REVISION. A new file replaces
    /// the old one, which is removed once the row is saved.
    pub async fn update(
        &self,
        deliverable_id: Uuid,
        actor: &Actor,
        content: DeliverableContent,
        file: Option<UploadedFile>,
    ) -> Result<Deliverable, ServiceError> {
        let current = self.load(deliverable_id).await?;
        ensure_owner(actor, current.submitted_by, "deliverable")?;
        if !current.status.is_editable() {
            return Err(ServiceError::invalid_state(format!(
                "Deliverable can only be edited while DRAFT or NEEDS_REVISION, it is {}",
                current.status.to_str()
            )));
        }
        let content = content.normalized()?;
        Self::ensure_in_progress(&self.load_mission(current.mission_id).await?)?;

        let new_token = self.store_file(file).await?;
        let token = new_token.clone().or_else(|| current.file_token.clone());

        let updated = match self
            .store
            .update_deliverable(deliverable_id, content.title, content.description, token)
            .await
        {
            Ok(Some(updated)) => updated,
            Ok(None) => {
                self.discard_file(new_token.as_deref()).await;
                return Err(ServiceError::invalid_state("Deliverable is no longer editable"));
            }
            Err(e) => {
                self.discard_file(new_token.as_deref()).await;
                return Err(e.into());
            }
        };

        if new_token.is_some() {
            self.discard_file(current.file_token.as_deref()).await;
        }
        Ok(updated)
    }

    pub async fn delete(&self, deliverable_id: Uuid, actor: &Actor) -> Result<(), ServiceError> {
        let deliverable = self.load(deliverable_id).await?;
        ensure_owner(actor, deliverable.submitted_by, "deliverable")?;
        if deliverable.status != DeliverableStatus::Draft {
            return Err(ServiceError::invalid_state(
                "Only DRAFT deliverables can be deleted",
            ));
        }

        if !self.store.delete_deliverable(deliverable_id).await? {
            return Err(ServiceError::invalid_state("Deliverable is no longer a draft"));
        }
        self.discard_file(deliverable.file_token.as_deref()).await;

        tracing::info!("Deliverable {} deleted", deliverable_id);
        Ok(())
    }

    pub async fn submit(&self, deliverable_id: Uuid, actor: &Actor) -> Result<Deliverable, ServiceError> {
        let deliverable = self.load(deliverable_id).await?;
        ensure_owner(actor, deliverable.submitted_by, "deliverable")?;
        if deliverable.file_token.is_none() {
            return Err(ServiceError::validation(
                "A file must be attached before submitting",
            ));
        }
        Self::ensure_in_progress(&self.load_mission(deliverable.mission_id).await?)?;
        self.step(deliverable, actor, ReviewStep::Submit, None).await
    }

    pub async fn start_review(&self, deliverable_id: Uuid, actor: &Actor) -> Result<Deliverable, ServiceError> {
        self.review(deliverable_id, actor, ReviewStep::StartReview, None).await
    }

    pub async fn accept(
        &self,
        deliverable_id: Uuid,
        actor: &Actor,
        feedback: Option<String>,
    ) -> Result<Deliverable, ServiceError> {
        self.review(deliverable_id, actor, ReviewStep::Accept, feedback).await
    }

    pub async fn reject(
        &self,
        deliverable_id: Uuid,
        actor: &Actor,
        feedback: Option<String>,
    ) -> Result<Deliverable, ServiceError> {
        self.review(deliverable_id, actor, ReviewStep::Reject, feedback).await
    }

    pub async fn request_revision(
        &self,
        deliverable_id: Uuid,
        actor: &Actor,
        feedback: Option<String>,
    ) -> Result<Deliverable, ServiceError> {
        self.review(deliverable_id, actor, ReviewStep::RequestRevision, feedback)
            .await
    }

    async fn review(
        &self,
        deliverable_id: Uuid,
        actor: &Actor,
        step: ReviewStep,
        feedback: Option<String>,
    ) -> Result<Deliverable, ServiceError> {
        let deliverable = self.load(deliverable_id).await?;
        let mission = self.load_mission(deliverable.mission_id).await?;
        ensure_owner(actor, mission.client_id, "mission")?;
        Self::ensure_in_progress(&mission)?;

        let feedback = feedback
            .map(|f| f.trim().to_string())
            .filter(|f| !f.is_empty());
        if step.requires_feedback() && feedback.is_none() {
            return Err(ServiceError::validation("Feedback is required"));
        }

        self.step(deliverable, actor, step, feedback).await
    }

    async fn step(
        &self,
        deliverable: Deliverable,
        actor: &Actor,
        step: ReviewStep,
        feedback: Option<String>,
    ) -> Result<Deliverable, ServiceError> {
        if !step.sources().contains(&deliverable.status) {
            return Err(ServiceError::InvalidTransition(format!(
                "Cannot move deliverable from {} to {}",
                deliverable.status.to_str(),
                step.target().to_str()
            )));
        }

        let updated = self
            .store
            .transition_deliverable(deliverable.id, step, actor.id, feedback)
            .await?
            .ok_or_else(|| ServiceError::invalid_state("Deliverable changed status concurrently"))?;

        tracing::info!(
            "Deliverable {} moved {} -> {}",
            updated.id,
            deliverable.status.to_str(),
            updated.status.to_str()
        );
        Ok(updated)
    }

    pub async fn list_for_mission(&self, mission_id: Uuid, actor: &Actor) -> Result<Vec<Deliverable>, ServiceError> {
        let mission = self.load_mission(mission_id).await?;
        Self::ensure_audience(actor, &mission, None)?;
        Ok(self.store.list_deliverables_for_mission(mission_id).await?)
    }

    pub async fn get(&self, deliverable_id: Uuid, actor: &Actor) -> Result<Deliverable, ServiceError> {
        let deliverable = self.load(deliverable_id).await?;
        let mission = self.load_mission(deliverable.mission_id).await?;
        Self::ensure_audience(actor, &mission, Some(&deliverable))?;
        Ok(deliverable)
    }

    pub async fn download(&self, deliverable_id: Uuid, actor: &Actor) -> Result<DownloadedFile, ServiceError> {
        let deliverable = self.get(deliverable_id, actor).await?;
        let token = deliverable
            .file_token
            .ok_or_else(|| ServiceError::not_found("Deliverable has no file attached"))?;

        let bytes = self.files.retrieve(&token).await?;
        Ok(DownloadedFile {
            file_name: original_name(&token),
            bytes,
        })
    }

    pub async fn mine(&self, actor: &Actor) -> Result<Vec<Deliverable>, ServiceError> {
        authorize(actor, &[UserRole::Freelance])?;
        Ok(self.store.list_deliverables_by_freelancer(actor.id).await?)
    }

    pub async fn for_client(&self, actor: &Actor) -> Result<Vec<Deliverable>, ServiceError> {
        authorize(actor, &[UserRole::Client])?;
        Ok(self.store.list_deliverables_for_client(actor.id).await?)
    }
}
