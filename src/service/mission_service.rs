// service/mission_service.rs
use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    db::{applicationdb::ApplicationExt, missiondb::MissionExt, MarketStore},
    dtos::{
        commondtos::{PageDto, RequestQueryDto},
        missiondtos::*,
    },
    models::{missionmodel::*, usermodel::{Actor, UserRole}},
    service::{
        error::ServiceError,
        guard::{authorize, ensure_owner},
    },
};

const EXPORT_LIMIT: i64 = 10_000;

/// Trims, drops empty entries and removes duplicates keeping the first
/// occurrence.
pub fn normalize_skills<I, S>(skills: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut normalized: Vec<String> = Vec::new();
    for skill in skills {
        let skill = skill.as_ref().trim();
        if !skill.is_empty() && !normalized.iter().any(|s| s == skill) {
            normalized.push(skill.to_string());
        }
    }
    normalized
}

fn require_text(value: &str, field: &str) -> Result<String, ServiceError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ServiceError::validation(format!("{} is required", field)));
    }
    Ok(trimmed.to_string())
}

fn check_budget(budget: Option<f64>) -> Result<(), ServiceError> {
    match budget {
        Some(b) if !b.is_finite() || b < 0.0 => {
            Err(ServiceError::validation("Budget must be a positive number"))
        }
        _ => Ok(()),
    }
}

pub struct NewMission {
    pub title: String,
    pub description: String,
    pub budget: Option<f64>,
    pub deadline: Option<DateTime<Utc>>,
    pub required_skills: Vec<String>,
}

impl From<CreateMissionDto> for NewMission {
    fn from(dto: CreateMissionDto) -> Self {
        NewMission {
            title: dto.title,
            description: dto.description,
            budget: dto.budget,
            deadline: dto.deadline,
            required_skills: dto
                .required_skills
                .map(SkillsInput::into_vec)
                .unwrap_or_default(),
        }
    }
}

#[derive(Clone)]
pub struct MissionService {
    store: Arc<dyn MarketStore>,
}

impl MissionService {
    pub fn new(store: Arc<dyn MarketStore>) -> Self {
        Self { store }
    }

    async fn load(&self, mission_id: Uuid) -> Result<Mission, ServiceError> {
        self.store
            .get_mission(mission_id)
            .await?
            .ok_or_else(|| ServiceError::not_found(format!("Mission {} not found", mission_id)))
    }

    async fn load_owned(&self, mission_id: Uuid, actor: &Actor) -> Result<Mission, ServiceError> {
        let mission = self.load(mission_id).await?;
        ensure_owner(actor, mission.client_id, "mission")?;
        Ok(mission)
    }

    pub async fn create(&self, actor: &Actor, input: NewMission) -> Result<Mission, ServiceError> {
        authorize(actor, &[UserRole::Client])?;

        let title = require_text(&input.title, "Title")?;
        let description = require_text(&input.description, "Description")?;
        check_budget(input.budget)?;

        let mission = self
            .store
            .create_mission(
                actor.id,
                title,
                description,
                input.budget,
                input.deadline,
                normalize_skills(input.required_skills),
            )
            .await?;

        tracing::info!("Mission {} created by client {}", mission.id, actor.id);
        Ok(mission)
    }

    pub async fn publish(&self, mission_id: Uuid, actor: &Actor) -> Result<Mission, ServiceError> {
        let mission = self.load_owned(mission_id, actor).await?;

        if mission.status != MissionStatus::Draft {
            return Err(ServiceError::invalid_state(format!(
                "Only DRAFT missions can be published, mission is {}",
                mission.status.to_str()
            )));
        }

        let mission = self
            .store
            .set_mission_status(mission_id, MissionStatus::Draft, MissionStatus::Open)
            .await?
            .ok_or_else(|| ServiceError::invalid_state("Mission changed status concurrently"))?;

        tracing::info!("Mission {} published", mission_id);
        Ok(mission)
    }

    pub async fn update(
        &self,
        mission_id: Uuid,
        actor: &Actor,
        mut changes: MissionChanges,
    ) -> Result<Mission, ServiceError> {
        let mut mission = self.load_owned(mission_id, actor).await?;

        if !mission.status.is_editable() {
            return Err(ServiceError::invalid_state(format!(
                "Mission can only be edited while DRAFT or OPEN, it is {}",
                mission.status.to_str()
            )));
        }

        if let Some(title) = &changes.title {
            changes.title = Some(require_text(title, "Title")?);
        }
        if let Some(description) = &changes.description {
            changes.description = Some(require_text(description, "Description")?);
        }
        if let Some(budget) = changes.budget {
            check_budget(budget)?;
        }
        changes.required_skills = changes.required_skills.map(normalize_skills);

        changes.apply_to(&mut mission);

        self.store
            .save_mission_fields(&mission)
            .await?
            .ok_or_else(|| ServiceError::invalid_state("Mission is no longer editable"))
    }

    pub async fn change_status(
        &self,
        mission_id: Uuid,
        actor: &Actor,
        target: MissionStatus,
    ) -> Result<Mission, ServiceError> {
        let mission = self.load_owned(mission_id, actor).await?;

        if !mission.status.can_transition_to(target) {
            return Err(ServiceError::InvalidTransition(format!(
                "Cannot move mission from {} to {}",
                mission.status.to_str(),
                target.to_str()
            )));
        }

        match target {
            MissionStatus::Cancelled => self.cancel(mission_id, actor).await,
            MissionStatus::Completed => self.complete(mission_id, actor, None, None).await,
            MissionStatus::InProgress => {
                if self.store.get_accepted_application(mission_id).await?.is_none() {
                    return Err(ServiceError::Precondition(
                        "A mission can only start once an application has been accepted".into(),
                    ));
                }
                self.set_status(mission_id, mission.status, target).await
            }
            MissionStatus::Open | MissionStatus::Draft => {
                self.set_status(mission_id, mission.status, target).await
            }
        }
    }

    async fn set_status(
        &self,
        mission_id: Uuid,
        from: MissionStatus,
        to: MissionStatus,
    ) -> Result<Mission, ServiceError> {
        let mission = self
            .store
            .set_mission_status(mission_id, from, to)
            .await?
            .ok_or_else(|| ServiceError::invalid_state("Mission changed status concurrently"))?;

        tracing::info!("Mission {} moved {} -> {}", mission_id, from.to_str(), to.to_str());
        Ok(mission)
    }

    pub async fn cancel(&self, mission_id: Uuid, actor: &Actor) -> Result<Mission, ServiceError> {
        let mission = self.load_owned(mission_id, actor).await?;

        if mission.status.is_terminal() {
            return Err(ServiceError::invalid_state(format!(
                "Mission is already {}",
                mission.status.to_str()
            )));
        }

        let (mission, cancelled) = self
            .store
            .cancel_mission(mission_id)
            .await?
            .ok_or_else(|| ServiceError::invalid_state("Mission can no longer be cancelled"))?;

        tracing::info!(
            "Mission {} cancelled, {} pending applications cancelled",
            mission_id,
            cancelled
        );
        Ok(mission)
    }

    pub async fn delete(&self, mission_id: Uuid, actor: &Actor) -> Result<(), ServiceError> {
        self.load_owned(mission_id, actor).await?;

        match self.store.delete_mission(mission_id).await? {
            MissionDeletion::Deleted {
                applications_removed,
            } => {
                tracing::info!(
                    "Mission {} deleted with {} applications",
                    mission_id,
                    applications_removed
                );
                Ok(())
            }
            MissionDeletion::InProgress => Err(ServiceError::invalid_state(
                "A mission in progress cannot be deleted, cancel it instead",
            )),
            MissionDeletion::HasApplications(count) => Err(ServiceError::Precondition(format!(
                "Mission already has {} application(s), cancel it instead",
                count
            ))),
            MissionDeletion::Missing => Err(ServiceError::not_found(format!(
                "Mission {} not found",
                mission_id
            ))),
        }
    }

    pub async fn complete(
        &self,
        mission_id: Uuid,
        actor: &Actor,
        rating: Option<f64>,
        feedback: Option<String>,
    ) -> Result<Mission, ServiceError> {
        self.load_owned(mission_id, actor).await?;

        if let Some(rating) = rating {
            if !(0.0..=5.0).contains(&rating) {
                return Err(ServiceError::validation("Rating must be between 0 and 5"));
            }
        }
        let feedback = feedback
            .map(|f| f.trim().to_string())
            .filter(|f| !f.is_empty());

        match self.store.complete_mission(mission_id, rating, feedback).await? {
            CompletionOutcome::Completed {
                mission,
                application,
            } => {
                tracing::info!(
                    "Mission {} completed by freelancer {}",
                    mission_id,
                    application.freelance_id
                );
                Ok(mission)
            }
            CompletionOutcome::NotInProgress(status) => Err(ServiceError::InvalidTransition(
                format!("Cannot complete a mission that is {}", status.to_str()),
            )),
            CompletionOutcome::NoAcceptedApplication => Err(ServiceError::Precondition(
                "Mission has no accepted application".into(),
            )),
            CompletionOutcome::Missing => Err(ServiceError::not_found(format!(
                "Mission {} not found",
                mission_id
            ))),
        }
    }

    pub async fn get(&self, mission_id: Uuid) -> Result<MissionWithCounts, ServiceError> {
        let mission = self.load(mission_id).await?;
        let mut counts = self.store.application_counts(&[mission_id]).await?;

        Ok(MissionWithCounts {
            applications: counts.remove(&mission_id).unwrap_or_default(),
            mission,
        })
    }

    async fn page(
        &self,
        mut filter: MissionFilter,
        query: &RequestQueryDto,
    ) -> Result<PageDto<Mission>, ServiceError> {
        let (limit, offset) = query.limit_offset();
        filter.limit = limit;
        filter.offset = offset;

        let total = self.store.count_missions(&filter).await?;
        let items = self.store.list_missions(&filter).await?;
        Ok(PageDto::new(items, total, query))
    }

    pub async fn list_public(&self, query: MissionListQuery) -> Result<PageDto<Mission>, ServiceError> {
        let filter = MissionFilter {
            status: query.status,
            max_budget: query.max_budget,
            skills: normalize_skills(query.skills()),
            ..Default::default()
        };
        self.page(filter, &query.pagination()).await
    }

    pub async fn my_missions(
        &self,
        actor: &Actor,
        query: MyMissionsQuery,
    ) -> Result<PageDto<MissionWithCounts>, ServiceError> {
        authorize(actor, &[UserRole::Client])?;

        let filter = MissionFilter {
            client_id: Some(actor.id),
            status: query.status,
            ..Default::default()
        };
        let page = self.page(filter, &query.pagination()).await?;

        let ids: Vec<Uuid> = page.items.iter().map(|m| m.id).collect();
        let mut counts = self.store.application_counts(&ids).await?;
        let items = page
            .items
            .into_iter()
            .map(|mission| MissionWithCounts {
                applications: counts.remove(&mission.id).unwrap_or_default(),
                mission,
            })
            .collect();

        Ok(PageDto {
            items,
            total: page.total,
            page: page.page,
            per_page: page.per_page,
            pages: page.pages,
        })
    }

    /// OPEN missions the freelancer has not applied to yet.
    pub async fn available(
        &self,
        actor: &Actor,
        query: AvailableMissionsQuery,
    ) -> Result<PageDto<Mission>, ServiceError> {
        authorize(actor, &[UserRole::Freelance])?;

        let filter = MissionFilter {
            status: Some(MissionStatus::Open),
            min_budget: query.min_budget,
            max_budget: query.max_budget,
            skills: normalize_skills(query.skills()),
            exclude_applied_by: Some(actor.id),
            ..Default::default()
        };
        self.page(filter, &query.pagination()).await
    }

    pub async fn search(&self, query: SearchMissionsQuery) -> Result<PageDto<Mission>, ServiceError> {
        if let (Some(min), Some(max)) = (query.min_budget, query.max_budget) {
            if min > max {
                return Err(ServiceError::validation("min_budget cannot exceed max_budget"));
            }
        }

        let filter = MissionFilter {
            status: Some(MissionStatus::Open),
            text: query
                .q
                .as_deref()
                .map(str::trim)
                .filter(|q| !q.is_empty())
                .map(str::to_string),
            min_budget: query.min_budget,
            max_budget: query.max_budget,
            deadline_before: query.deadline_before,
            sort: query.sort_by.unwrap_or_default(),
            order: query.order.unwrap_or_default(),
            ..Default::default()
        };
        self.page(filter, &query.pagination()).await
    }

    pub async fn stats(&self, actor: &Actor) -> Result<MissionStats, ServiceError> {
        authorize(actor, &[UserRole::Client])?;
        Ok(self.store.mission_stats(actor.id).await?)
    }

    /// Read-only projection consumed by the export renderers.
    pub async fn export_projection(&self, actor: &Actor) -> Result<Vec<MissionExportRow>, ServiceError> {
        authorize(actor, &[UserRole::Client])?;

        let filter = MissionFilter {
            client_id: Some(actor.id),
            limit: EXPORT_LIMIT,
            ..Default::default()
        };
        let missions = self.store.list_missions(&filter).await?;
        let ids: Vec<Uuid> = missions.iter().map(|m| m.id).collect();
        let counts = self.store.application_counts(&ids).await?;

        Ok(missions
            .into_iter()
            .map(|m| {
                let c = counts.get(&m.id).cloned().unwrap_or_default();
                MissionExportRow {
                    id: m.id,
                    title: m.title,
                    status: m.status,
                    budget: m.budget,
                    deadline: m.deadline,
                    required_skills: m.required_skills,
                    assigned_freelance_id: m.assigned_freelance_id,
                    total_applications: c.total,
                    pending_applications: c.pending,
                    created_at: m.created_at,
                }
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db::{applicationdb::ApplicationExt, chatdb::ChatExt, memory::MemoryStore, userdb::UserExt},
        dtos::deliverabledtos::UploadedFile,
        models::{
            deliverablemodel::DeliverableStatus,
            usermodel::{ProfileCommon, ProfileDetails, UserRole},
        },
        service::{
            application_service::ApplicationService,
            deliverable_service::{DeliverableContent, DeliverableService},
            file_storage::LocalFileStorage,
        },
    };

    fn new_mission(title: &str) -> NewMission {
        NewMission {
            title: title.to_string(),
            description: "Build the thing".to_string(),
            budget: Some(300.0),
            deadline: None,
            required_skills: vec!["rust".to_string()],
        }
    }

    async fn setup() -> (Arc<MemoryStore>, MissionService, Actor) {
        let store = Arc::new(MemoryStore::new());
        let client = store.insert_user("client@example.com", UserRole::Client).await;
        let service = MissionService::new(store.clone());
        (store, service, client.actor())
    }

    #[test]
    fn test_normalize_skills() {
        let skills = normalize_skills(vec![" rust", "", "sql", "rust", "  ", "go "]);
        assert_eq!(skills, vec!["rust", "sql", "go"]);
    }

    #[tokio::test]
    async fn test_create_starts_in_draft() {
        let (_, service, client) = setup().await;

        let mission = service.create(&client, new_mission("API")).await.unwrap();
        assert_eq!(mission.status, MissionStatus::Draft);
        assert_eq!(mission.client_id, client.id);
        assert!(mission.assigned_freelance_id.is_none());
    }

    #[tokio::test]
    async fn test_create_requires_title_and_description() {
        let (_, service, client) = setup().await;

        let err = service.create(&client, new_mission("   ")).await.unwrap_err();
        assert_eq!(err.kind(), "validation_error");

        let mut input = new_mission("API");
        input.description = String::new();
        let err = service.create(&client, input).await.unwrap_err();
        assert_eq!(err.kind(), "validation_error");
    }

    #[tokio::test]
    async fn test_freelancer_cannot_create() {
        let (store, service, _) = setup().await;
        let freelancer = store.insert_user("f@example.com", UserRole::Freelance).await;

        let err = service
            .create(&freelancer.actor(), new_mission("API"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "permission_error");
    }

    #[tokio::test]
    async fn test_publish_only_from_draft_by_owner() {
        let (store, service, client) = setup().await;
        let other = store.insert_user("other@example.com", UserRole::Client).await;
        let mission = service.create(&client, new_mission("API")).await.unwrap();

        let err = service.publish(mission.id, &other.actor()).await.unwrap_err();
        assert_eq!(err.kind(), "permission_error");

        let open = service.publish(mission.id, &client).await.unwrap();
        assert_eq!(open.status, MissionStatus::Open);

        let err = service.publish(mission.id, &client).await.unwrap_err();
        assert_eq!(err.kind(), "invalid_state_error");
    }

    #[tokio::test]
    async fn test_change_status_rejects_transitions_outside_table() {
        let (_, service, client) = setup().await;
        let mission = service.create(&client, new_mission("API")).await.unwrap();

        let err = service
            .change_status(mission.id, &client, MissionStatus::Completed)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "invalid_transition_error");

        let err = service
            .change_status(mission.id, &client, MissionStatus::InProgress)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "invalid_transition_error");

        service
            .change_status(mission.id, &client, MissionStatus::Open)
            .await
            .unwrap();

        let err = service
            .change_status(mission.id, &client, MissionStatus::InProgress)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "precondition_error");
    }

    #[tokio::test]
    async fn test_update_only_while_editable() {
        let (_, service, client) = setup().await;
        let mission = service.create(&client, new_mission("API")).await.unwrap();

        let updated = service
            .update(
                mission.id,
                &client,
                MissionChanges {
                    title: Some("  New API ".to_string()),
                    budget: Some(None),
                    required_skills: Some(vec!["go".into(), "go".into(), " sql".into()]),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.title, "New API");
        assert_eq!(updated.budget, None);
        assert_eq!(updated.required_skills, vec!["go", "sql"]);

        let err = service
            .update(
                mission.id,
                &client,
                MissionChanges {
                    budget: Some(Some(-5.0)),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "validation_error");

        service.cancel(mission.id, &client).await.unwrap();
        let err = service
            .update(
                mission.id,
                &client,
                MissionChanges {
                    title: Some("Late".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "invalid_state_error");
    }

    #[tokio::test]
    async fn test_cancel_cascades_to_pending_applications() {
        let (store, service, client) = setup().await;
        let freelancer = store.insert_user("f@example.com", UserRole::Freelance).await;
        let mission = service.create(&client, new_mission("API")).await.unwrap();
        service.publish(mission.id, &client).await.unwrap();
        let application = store
            .create_application(mission.id, freelancer.id)
            .await
            .unwrap()
            .unwrap();

        let cancelled = service.cancel(mission.id, &client).await.unwrap();
        assert_eq!(cancelled.status, MissionStatus::Cancelled);

        let application = store.get_application(application.id).await.unwrap().unwrap();
        assert_eq!(application.status, ApplicationStatus::Cancelled);

        let err = service.cancel(mission.id, &client).await.unwrap_err();
        assert_eq!(err.kind(), "invalid_state_error");
    }

    #[tokio::test]
    async fn test_delete_rules() {
        let (store, service, client) = setup().await;
        let freelancer = store.insert_user("f@example.com", UserRole::Freelance).await;

        let empty = service.create(&client, new_mission("Empty")).await.unwrap();
        service.publish(empty.id, &client).await.unwrap();
        service.delete(empty.id, &client).await.unwrap();
        assert!(store.get_mission(empty.id).await.unwrap().is_none());

        let busy = service.create(&client, new_mission("Busy")).await.unwrap();
        service.publish(busy.id, &client).await.unwrap();
        let application = store
            .create_application(busy.id, freelancer.id)
            .await
            .unwrap()
            .unwrap();
        let err = service.delete(busy.id, &client).await.unwrap_err();
        assert_eq!(err.kind(), "precondition_error");

        store.accept_application(application.id).await.unwrap();
        let err = service.delete(busy.id, &client).await.unwrap_err();
        assert_eq!(err.kind(), "invalid_state_error");
        assert!(store.get_mission(busy.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_available_excludes_applied_missions() {
        let (store, service, client) = setup().await;
        let freelancer = store.insert_user("f@example.com", UserRole::Freelance).await;

        let applied = service.create(&client, new_mission("Applied")).await.unwrap();
        let fresh = service.create(&client, new_mission("Fresh")).await.unwrap();
        let draft = service.create(&client, new_mission("Draft")).await.unwrap();
        service.publish(applied.id, &client).await.unwrap();
        service.publish(fresh.id, &client).await.unwrap();
        store.create_application(applied.id, freelancer.id).await.unwrap();

        let page = service
            .available(&freelancer.actor(), AvailableMissionsQuery::default())
            .await
            .unwrap();
        let ids: Vec<Uuid> = page.items.iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![fresh.id]);
        assert!(!ids.contains(&draft.id));

        let err = service
            .available(&client, AvailableMissionsQuery::default())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "permission_error");
    }

    #[tokio::test]
    async fn test_search_sorts_and_paginates() {
        let (_, service, client) = setup().await;
        for (title, budget) in [("Web shop", 100.0), ("Web api", 900.0), ("Mobile app", 500.0)] {
            let mut input = new_mission(title);
            input.budget = Some(budget);
            let mission = service.create(&client, input).await.unwrap();
            service.publish(mission.id, &client).await.unwrap();
        }

        let page = service
            .search(SearchMissionsQuery {
                q: Some("WEB".to_string()),
                sort_by: Some(MissionSort::Budget),
                order: Some(SortOrder::Asc),
                ..Default::default()
            })
            .await
            .unwrap();
        let titles: Vec<&str> = page.items.iter().map(|m| m.title.as_str()).collect();
        assert_eq!(titles, vec!["Web shop", "Web api"]);
        assert_eq!(page.total, 2);

        let page = service
            .search(SearchMissionsQuery {
                sort_by: Some(MissionSort::Budget),
                page: Some(2),
                per_page: Some(2),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(page.total, 3);
        assert_eq!(page.pages, 2);
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].title, "Web shop");

        let err = service
            .search(SearchMissionsQuery {
                min_budget: Some(10.0),
                max_budget: Some(5.0),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "validation_error");
    }

    #[tokio::test]
    async fn test_stats_and_export() {
        let (store, service, client) = setup().await;
        let freelancer = store.insert_user("f@example.com", UserRole::Freelance).await;

        let a = service.create(&client, new_mission("A")).await.unwrap();
        let mut input = new_mission("B");
        input.budget = Some(100.0);
        service.create(&client, input).await.unwrap();
        service.publish(a.id, &client).await.unwrap();
        store.create_application(a.id, freelancer.id).await.unwrap();

        let stats = service.stats(&client).await.unwrap();
        assert_eq!(stats.total_missions, 2);
        assert_eq!(stats.open, 1);
        assert_eq!(stats.draft, 1);
        assert_eq!(stats.total_budget, 400.0);
        assert_eq!(stats.average_budget, 200.0);
        assert_eq!(stats.total_applications, 1);

        let rows = service.export_projection(&client).await.unwrap();
        assert_eq!(rows.len(), 2);
        let row_a = rows.iter().find(|r| r.id == a.id).unwrap();
        assert_eq!(row_a.total_applications, 1);
        assert_eq!(row_a.pending_applications, 1);
    }

    fn freelance_profile() -> ProfileDetails {
        ProfileDetails::Freelance {
            full_name: "Ada".to_string(),
            title: None,
            skills: vec!["rust".to_string()],
            languages: vec![],
            hourly_rate: Some(40.0),
            experience_years: Some(2),
            availability: None,
            rating: 0.0,
            completed_projects: 0,
        }
    }

    #[tokio::test]
    async fn test_mission_lifecycle_end_to_end() {
        let (store, service, client) = setup().await;
        let a = store.insert_user("a@example.com", UserRole::Freelance).await;
        let b = store.insert_user("b@example.com", UserRole::Freelance).await;
        store
            .upsert_profile(a.id, ProfileCommon::default(), freelance_profile())
            .await
            .unwrap();

        let applications = ApplicationService::new(store.clone());
        let files = Arc::new(LocalFileStorage::new(
            std::env::temp_dir().join(format!("missionhub-e2e-{}", Uuid::new_v4())),
            1024,
        ));
        let deliverables = DeliverableService::new(store.clone(), files);
        let upload = |name: &str| {
            Some(UploadedFile {
                file_name: name.to_string(),
                bytes: b"draft".to_vec(),
            })
        };
        let content = |title: &str| DeliverableContent {
            title: title.to_string(),
            description: None,
        };

        let mission = service.create(&client, new_mission("Shop")).await.unwrap();
        service.publish(mission.id, &client).await.unwrap();
        let app_a = applications.apply(mission.id, &a.actor()).await.unwrap();
        let app_b = applications.apply(mission.id, &b.actor()).await.unwrap();
        applications
            .decide(app_a.id, &client, Decision::Accept)
            .await
            .unwrap();

        let app_b = store.get_application(app_b.id).await.unwrap().unwrap();
        assert_eq!(app_b.status, ApplicationStatus::Rejected);
        let chat = store.get_mission_chat(mission.id).await.unwrap().unwrap();
        assert_eq!(chat.user2_id, Some(a.id));

        let first = deliverables
            .create(&a.actor(), mission.id, content("v1"), upload("v1.pdf"))
            .await
            .unwrap();
        deliverables.submit(first.id, &a.actor()).await.unwrap();
        deliverables.start_review(first.id, &client).await.unwrap();
        let rejected = deliverables
            .reject(first.id, &client, Some("needs more detail".into()))
            .await
            .unwrap();
        assert_eq!(rejected.status, DeliverableStatus::Rejected);
        assert_eq!(rejected.client_feedback.as_deref(), Some("needs more detail"));

        let second = deliverables
            .create(&a.actor(), mission.id, content("v2"), upload("v2.pdf"))
            .await
            .unwrap();
        deliverables.submit(second.id, &a.actor()).await.unwrap();
        deliverables.start_review(second.id, &client).await.unwrap();
        deliverables.accept(second.id, &client, None).await.unwrap();

        let err = service
            .complete(mission.id, &client, Some(5.5), None)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "validation_error");

        let done = service
            .complete(mission.id, &client, Some(4.0), Some(" great work ".into()))
            .await
            .unwrap();
        assert_eq!(done.status, MissionStatus::Completed);

        let accepted = store.get_application(app_a.id).await.unwrap().unwrap();
        assert_eq!(accepted.client_rating, Some(4.0));
        assert_eq!(accepted.client_feedback.as_deref(), Some("great work"));

        let err = deliverables
            .create(&a.actor(), mission.id, content("v3"), None)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "invalid_state_error");

        // a second mission completed through the status route, unrated
        let next = service.create(&client, new_mission("Blog")).await.unwrap();
        service.publish(next.id, &client).await.unwrap();
        let app = applications.apply(next.id, &a.actor()).await.unwrap();
        applications.decide(app.id, &client, Decision::Accept).await.unwrap();
        service
            .change_status(next.id, &client, MissionStatus::Completed)
            .await
            .unwrap();

        let profile = store.get_profile(a.id).await.unwrap().unwrap();
        match profile.details {
            ProfileDetails::Freelance {
                rating,
                completed_projects,
                ..
            } => {
                assert_eq!(rating, 4.0);
                assert_eq!(completed_projects, 2);
            }
            other => panic!("expected a freelance profile, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_completion_keeps_a_running_average() {
        let (store, service, client) = setup().await;
        let freelancer = store.insert_user("f@example.com", UserRole::Freelance).await;
        store
            .upsert_profile(freelancer.id, ProfileCommon::default(), freelance_profile())
            .await
            .unwrap();
        let applications = ApplicationService::new(store.clone());

        for rating in [5.0, 4.0, 3.0] {
            let mission = service.create(&client, new_mission("Gig")).await.unwrap();
            service.publish(mission.id, &client).await.unwrap();
            let app = applications
                .apply(mission.id, &freelancer.actor())
                .await
                .unwrap();
            applications.decide(app.id, &client, Decision::Accept).await.unwrap();
            service
                .complete(mission.id, &client, Some(rating), None)
                .await
                .unwrap();
        }

        let profile = store.get_profile(freelancer.id).await.unwrap().unwrap();
        let ProfileDetails::Freelance {
            rating,
            completed_projects,
            ..
        } = profile.details
        else {
            panic!("expected a freelance profile");
        };
        assert_eq!(completed_projects, 3);
        assert!((rating - 4.0).abs() < 1e-9);

        let err = service
            .complete(Uuid::new_v4(), &client, None, None)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "not_found_error");
    }
}
