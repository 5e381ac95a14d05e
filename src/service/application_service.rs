// service/application_service.rs
use std::sync::Arc;

use uuid::Uuid;

use crate::{
    db::{applicationdb::ApplicationExt, missiondb::MissionExt, MarketStore},
    models::{
        missionmodel::{AcceptOutcome, Application, ApplicationStatus, Decision, Mission, MissionStatus},
        usermodel::{Actor, UserRole},
    },
    service::{
        error::ServiceError,
        guard::{authorize, ensure_owner},
    },
};

#[derive(Clone)]
pub struct ApplicationService {
    store: Arc<dyn MarketStore>,
}

impl ApplicationService {
    pub fn new(store: Arc<dyn MarketStore>) -> Self {
        Self { store }
    }

    async fn load_mission(&self, mission_id: Uuid) -> Result<Mission, ServiceError> {
        self.store
            .get_mission(mission_id)
            .await?
            .ok_or_else(|| ServiceError::not_found(format!("Mission {} not found", mission_id)))
    }

    pub async fn apply(&self, mission_id: Uuid, actor: &Actor) -> Result<Application, ServiceError> {
        authorize(actor, &[UserRole::Freelance])?;

        let mission = self.load_mission(mission_id).await?;
        if mission.status != MissionStatus::Open {
            return Err(ServiceError::invalid_state(format!(
                "Applications are only accepted on OPEN missions, mission is {}",
                mission.status.to_str()
            )));
        }

        let Some(application) = self.store.create_application(mission_id, actor.id).await? else {
            // the insert also refuses a mission that left OPEN after the check above
            let mission = self.load_mission(mission_id).await?;
            if mission.status != MissionStatus::Open {
                return Err(ServiceError::invalid_state(format!(
                    "Mission is no longer OPEN, it is {}",
                    mission.status.to_str()
                )));
            }
            return Err(ServiceError::Duplicate(
                "You have already applied to this mission".into(),
            ));
        };

        tracing::info!("Freelancer {} applied to mission {}", actor.id, mission_id);
        Ok(application)
    }

    /// One-shot decision by the mission owner. Accepting runs the whole
    /// single-winner cascade in one transaction.
    pub async fn decide(
        &self,
        application_id: Uuid,
        actor: &Actor,
        decision: Decision,
    ) -> Result<Application, ServiceError> {
        let application = self
            .store
            .get_application(application_id)
            .await?
            .ok_or_else(|| {
                ServiceError::not_found(format!("Application {} not found", application_id))
            })?;
        let mission = self.load_mission(application.mission_id).await?;
        ensure_owner(actor, mission.client_id, "mission")?;

        match decision {
            Decision::Accept => self.accept(application).await,
            Decision::Reject => self.reject(application).await,
        }
    }

    async fn accept(&self, application: Application) -> Result<Application, ServiceError> {
        match self.store.accept_application(application.id).await? {
            AcceptOutcome::Accepted {
                application,
                mission,
                chat,
                rejected_siblings,
            } => {
                tracing::info!(
                    "Application {} accepted, mission {} in progress, {} siblings rejected, chat {}",
                    application.id,
                    mission.id,
                    rejected_siblings,
                    chat.id
                );
                Ok(application)
            }
            AcceptOutcome::AlreadyAccepted => {
                tracing::warn!(
                    "Accept of application {} lost to another accepted application",
                    application.id
                );
                Err(ServiceError::Conflict(
                    "Another application has already been accepted for this mission".into(),
                ))
            }
            AcceptOutcome::NotPending(status) => Err(ServiceError::invalid_state(format!(
                "Application has already been decided ({})",
                status.to_str()
            ))),
            AcceptOutcome::MissionNotOpen(status) => Err(ServiceError::invalid_state(format!(
                "Mission is {}, applications can only be accepted while OPEN",
                status.to_str()
            ))),
            AcceptOutcome::Missing => Err(ServiceError::not_found(format!(
                "Application {} not found",
                application.id
            ))),
        }
    }

    async fn reject(&self, application: Application) -> Result<Application, ServiceError> {
        if application.status != ApplicationStatus::Pending {
            return Err(ServiceError::invalid_state(format!(
                "Application has already been decided ({})",
                application.status.to_str()
            )));
        }

        let rejected = self
            .store
            .reject_application(application.id)
            .await?
            .ok_or_else(|| ServiceError::invalid_state("Application has already been decided"))?;

        tracing::info!("Application {} rejected", rejected.id);
        Ok(rejected)
    }

    pub async fn list_for_mission(
        &self,
        mission_id: Uuid,
        actor: &Actor,
    ) -> Result<Vec<Application>, ServiceError> {
        let mission = self.load_mission(mission_id).await?;
        ensure_owner(actor, mission.client_id, "mission")?;

        Ok(self.store.list_applications_for_mission(mission_id).await?)
    }

    pub async fn mine(&self, actor: &Actor) -> Result<Vec<Application>, ServiceError> {
        authorize(actor, &[UserRole::Freelance])?;
        Ok(self.store.list_applications_for_freelancer(actor.id).await?)
    }

    pub async fn accepted_for(
        &self,
        mission_id: Uuid,
        actor: &Actor,
    ) -> Result<Application, ServiceError> {
        let mission = self.load_mission(mission_id).await?;

        let accepted = self
            .store
            .get_accepted_application(mission_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Mission has no accepted application"))?;

        if actor.id != mission.client_id && actor.id != accepted.freelance_id {
            return Err(ServiceError::permission(
                "Only the mission client or the accepted freelancer can view this",
            ));
        }
        Ok(accepted)
    }
}
