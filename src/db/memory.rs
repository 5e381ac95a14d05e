//! In-memory `MarketStore` for engine tests. Every operation runs under one
//! lock, which gives the same all-or-nothing behaviour as the Postgres
//! transactions.
use std::{
    cmp::Ordering,
    collections::{BTreeMap, HashMap},
};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::Error;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{
    applicationdb::ApplicationExt, chatdb::ChatExt, complaintdb::ComplaintExt,
    deliverabledb::DeliverableExt, missiondb::MissionExt, profiledb::{ProfileExt, TOP_SKILLS},
    userdb::UserExt,
};
use crate::models::{
    chatmodel::*, complaintmodel::*, deliverablemodel::*, missionmodel::*, portfoliomodel::*,
    usermodel::*,
};

#[derive(Default)]
struct State {
    users: Vec<User>,
    profiles: Vec<Profile>,
    portfolio_items: Vec<PortfolioItem>,
    missions: Vec<Mission>,
    applications: Vec<Application>,
    deliverables: Vec<Deliverable>,
    chats: Vec<Chat>,
    messages: Vec<Message>,
    complaints: Vec<Complaint>,
    admin_actions: Vec<AdminAction>,
}

#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a verified, active user.
    pub async fn insert_user(&self, email: &str, role: UserRole) -> User {
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            email: email.to_string(),
            password: String::new(),
            role,
            is_active: true,
            is_verified: true,
            verification_code: None,
            code_expires_at: None,
            last_connection_at: None,
            created_at: now,
            updated_at: now,
        };
        self.state.lock().await.users.push(user.clone());
        user
    }

    pub async fn set_active(&self, user_id: Uuid, active: bool) {
        let mut state = self.state.lock().await;
        if let Some(user) = state.users.iter_mut().find(|u| u.id == user_id) {
            user.is_active = active;
        }
    }
}

fn not_found() -> Error {
    Error::RowNotFound
}

fn compare_missions(a: &Mission, b: &Mission, sort: MissionSort, order: SortOrder) -> Ordering {
    fn nulls_last<T: PartialOrd>(a: Option<T>, b: Option<T>, order: SortOrder) -> Ordering {
        match (a, b) {
            (Some(a), Some(b)) => {
                let ord = a.partial_cmp(&b).unwrap_or(Ordering::Equal);
                match order {
                    SortOrder::Asc => ord,
                    SortOrder::Desc => ord.reverse(),
                }
            }
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    }

    let primary = match sort {
        MissionSort::CreatedAt => nulls_last(Some(a.created_at), Some(b.created_at), order),
        MissionSort::Budget => nulls_last(a.budget, b.budget, order),
        MissionSort::Deadline => nulls_last(a.deadline, b.deadline, order),
    };
    primary.then_with(|| b.created_at.cmp(&a.created_at))
}

impl State {
    fn listed_freelancers(&self) -> Vec<&Profile> {
        self.profiles
            .iter()
            .filter(|p| matches!(p.details, ProfileDetails::Freelance { .. }))
            .filter(|p| {
                self.users
                    .iter()
                    .any(|u| u.id == p.user_id && u.is_active && u.role == UserRole::Freelance)
            })
            .collect()
    }

    fn filtered_missions(&self, filter: &MissionFilter) -> Vec<Mission> {
        let mut missions: Vec<Mission> = self
            .missions
            .iter()
            .filter(|m| filter.matches(m))
            .filter(|m| match filter.exclude_applied_by {
                Some(freelance_id) => !self
                    .applications
                    .iter()
                    .any(|a| a.mission_id == m.id && a.freelance_id == freelance_id),
                None => true,
            })
            .cloned()
            .collect();
        missions.sort_by(|a, b| compare_missions(a, b, filter.sort, filter.order));
        missions
    }

    fn log_action(
        &mut self,
        admin_id: Uuid,
        action_type: AdminActionType,
        target_user_id: Option<Uuid>,
        complaint_id: Option<Uuid>,
        notes: Option<String>,
    ) {
        self.admin_actions.push(AdminAction {
            id: Uuid::new_v4(),
            admin_id,
            action_type,
            target_user_id,
            complaint_id,
            notes,
            created_at: Utc::now(),
        });
    }

    fn upsert_mission_chat(&mut self, mission_id: Uuid, client_id: Uuid, freelance_id: Option<Uuid>) -> Chat {
        let now = Utc::now();
        if let Some(chat) = self
            .chats
            .iter_mut()
            .find(|c| c.chat_type == ChatType::Mission && c.mission_id == Some(mission_id))
        {
            chat.user2_id = freelance_id;
            chat.updated_at = now;
            return chat.clone();
        }

        let chat = Chat {
            id: Uuid::new_v4(),
            chat_type: ChatType::Mission,
            user1_id: client_id,
            user2_id: freelance_id,
            mission_id: Some(mission_id),
            unread_user1: 0,
            unread_user2: 0,
            unread_admin: 0,
            created_at: now,
            updated_at: now,
        };
        self.chats.push(chat.clone());
        chat
    }

    fn mark_read(&mut self, chat_id: Uuid, reader_id: Uuid, slot: CounterSlot) -> Result<Chat, Error> {
        for message in self
            .messages
            .iter_mut()
            .filter(|m| m.chat_id == chat_id && m.sender_id != reader_id)
        {
            message.is_read = true;
        }

        let chat = self
            .chats
            .iter_mut()
            .find(|c| c.id == chat_id)
            .ok_or_else(not_found)?;
        match slot {
            CounterSlot::User1 => chat.unread_user1 = 0,
            CounterSlot::User2 => chat.unread_user2 = 0,
            CounterSlot::Admin => chat.unread_admin = 0,
        }
        Ok(chat.clone())
    }

    fn review_pending(&self, complaint_id: Uuid) -> Option<ComplaintReview> {
        match self.complaints.iter().find(|c| c.id == complaint_id) {
            None => Some(ComplaintReview::Missing),
            Some(c) if c.status != ComplaintStatus::Pending => Some(ComplaintReview::NotPending(c.status)),
            Some(_) => None,
        }
    }
}

#[async_trait]
impl UserExt for MemoryStore {
    async fn get_user(&self, user_id: Option<Uuid>, email: Option<&str>) -> Result<Option<User>, Error> {
        let state = self.state.lock().await;
        Ok(state
            .users
            .iter()
            .find(|u| match (user_id, email) {
                (Some(id), _) => u.id == id,
                (None, Some(email)) => u.email.eq_ignore_ascii_case(email),
                (None, None) => false,
            })
            .cloned())
    }

    async fn save_user(
        &self,
        email: String,
        password: String,
        role: UserRole,
        verification_code: String,
        code_expires_at: DateTime<Utc>,
    ) -> Result<Option<User>, Error> {
        let mut state = self.state.lock().await;
        if state.users.iter().any(|u| u.email.eq_ignore_ascii_case(&email)) {
            return Ok(None);
        }
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            email,
            password,
            role,
            is_active: true,
            is_verified: false,
            verification_code: Some(verification_code),
            code_expires_at: Some(code_expires_at),
            last_connection_at: None,
            created_at: now,
            updated_at: now,
        };
        state.users.push(user.clone());
        Ok(Some(user))
    }

    async fn update_verification_code(
        &self,
        user_id: Uuid,
        verification_code: String,
        code_expires_at: DateTime<Utc>,
    ) -> Result<User, Error> {
        let mut state = self.state.lock().await;
        let user = state.users.iter_mut().find(|u| u.id == user_id).ok_or_else(not_found)?;
        user.verification_code = Some(verification_code);
        user.code_expires_at = Some(code_expires_at);
        Ok(user.clone())
    }

    async fn mark_verified(&self, user_id: Uuid) -> Result<User, Error> {
        let mut state = self.state.lock().await;
        let user = state.users.iter_mut().find(|u| u.id == user_id).ok_or_else(not_found)?;
        user.is_verified = true;
        user.verification_code = None;
        user.code_expires_at = None;
        Ok(user.clone())
    }

    async fn touch_last_connection(&self, user_id: Uuid) -> Result<(), Error> {
        let mut state = self.state.lock().await;
        if let Some(user) = state.users.iter_mut().find(|u| u.id == user_id) {
            user.last_connection_at = Some(Utc::now());
        }
        Ok(())
    }

    async fn get_blocked_users(&self, limit: i64, offset: i64) -> Result<Vec<User>, Error> {
        let state = self.state.lock().await;
        Ok(state
            .users
            .iter()
            .filter(|u| !u.is_active)
            .skip(offset as usize)
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn count_blocked_users(&self) -> Result<i64, Error> {
        let state = self.state.lock().await;
        Ok(state.users.iter().filter(|u| !u.is_active).count() as i64)
    }

    async fn get_profile(&self, user_id: Uuid) -> Result<Option<Profile>, Error> {
        let state = self.state.lock().await;
        Ok(state.profiles.iter().find(|p| p.user_id == user_id).cloned())
    }

    async fn upsert_profile(
        &self,
        user_id: Uuid,
        common: ProfileCommon,
        mut details: ProfileDetails,
    ) -> Result<Profile, Error> {
        let mut state = self.state.lock().await;
        let existing = state.profiles.iter().position(|p| p.user_id == user_id);

        // stats survive profile edits
        let kept = existing.and_then(|i| match &state.profiles[i].details {
            ProfileDetails::Freelance {
                rating,
                completed_projects,
                ..
            } => Some((*rating, *completed_projects)),
            ProfileDetails::Client { .. } => None,
        });
        if let ProfileDetails::Freelance {
            rating,
            completed_projects,
            ..
        } = &mut details
        {
            let (r, c) = kept.unwrap_or((0.0, 0));
            *rating = r;
            *completed_projects = c;
        }

        let profile = Profile {
            user_id,
            common,
            details,
            updated_at: Utc::now(),
        };
        match existing {
            Some(i) => state.profiles[i] = profile.clone(),
            None => state.profiles.push(profile.clone()),
        }
        Ok(profile)
    }
}

#[async_trait]
impl ProfileExt for MemoryStore {
    async fn add_portfolio_item(
        &self,
        user_id: Uuid,
        title: String,
        description: Option<String>,
        url: Option<String>,
        image_url: Option<String>,
    ) -> Result<PortfolioItem, Error> {
        let mut state = self.state.lock().await;
        let now = Utc::now();
        let item = PortfolioItem {
            id: Uuid::new_v4(),
            user_id,
            title,
            description,
            url,
            image_url,
            created_at: now,
            updated_at: now,
        };
        state.portfolio_items.push(item.clone());
        Ok(item)
    }

    async fn get_portfolio_item(&self, item_id: Uuid) -> Result<Option<PortfolioItem>, Error> {
        let state = self.state.lock().await;
        Ok(state.portfolio_items.iter().find(|i| i.id == item_id).cloned())
    }

    async fn list_portfolio(&self, user_id: Uuid) -> Result<Vec<PortfolioItem>, Error> {
        let state = self.state.lock().await;
        Ok(state
            .portfolio_items
            .iter()
            .rev()
            .filter(|i| i.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn save_portfolio_item(&self, item: &PortfolioItem) -> Result<Option<PortfolioItem>, Error> {
        let mut state = self.state.lock().await;
        let Some(stored) = state.portfolio_items.iter_mut().find(|i| i.id == item.id) else {
            return Ok(None);
        };
        stored.title = item.title.clone();
        stored.description = item.description.clone();
        stored.url = item.url.clone();
        stored.image_url = item.image_url.clone();
        stored.updated_at = Utc::now();
        Ok(Some(stored.clone()))
    }

    async fn delete_portfolio_item(&self, item_id: Uuid) -> Result<bool, Error> {
        let mut state = self.state.lock().await;
        let before = state.portfolio_items.len();
        state.portfolio_items.retain(|i| i.id != item_id);
        Ok(state.portfolio_items.len() < before)
    }

    async fn search_freelancers(&self, filter: &FreelancerFilter) -> Result<Vec<Profile>, Error> {
        fn standing(profile: &Profile) -> (f64, i32) {
            match profile.details {
                ProfileDetails::Freelance {
                    rating,
                    completed_projects,
                    ..
                } => (rating, completed_projects),
                ProfileDetails::Client { .. } => (0.0, 0),
            }
        }

        let state = self.state.lock().await;
        let mut found: Vec<Profile> = state
            .listed_freelancers()
            .into_iter()
            .filter(|p| filter.matches(p))
            .cloned()
            .collect();
        found.sort_by(|a, b| {
            let (a_rating, a_done) = standing(a);
            let (b_rating, b_done) = standing(b);
            b_rating
                .partial_cmp(&a_rating)
                .unwrap_or(Ordering::Equal)
                .then(b_done.cmp(&a_done))
                .then(b.updated_at.cmp(&a.updated_at))
        });
        Ok(found
            .into_iter()
            .skip(filter.offset.max(0) as usize)
            .take(filter.limit.max(0) as usize)
            .collect())
    }

    async fn count_freelancers(&self, filter: &FreelancerFilter) -> Result<i64, Error> {
        let state = self.state.lock().await;
        Ok(state
            .listed_freelancers()
            .into_iter()
            .filter(|p| filter.matches(p))
            .count() as i64)
    }

    async fn freelancer_stats(&self) -> Result<FreelancerStats, Error> {
        fn mean(values: &[f64]) -> f64 {
            if values.is_empty() {
                0.0
            } else {
                values.iter().sum::<f64>() / values.len() as f64
            }
        }

        let state = self.state.lock().await;
        let mut stats = FreelancerStats::default();
        let mut ratings = Vec::new();
        let mut rates = Vec::new();
        let mut years = Vec::new();
        let mut availability: BTreeMap<String, i64> = BTreeMap::new();
        let mut skills: HashMap<String, i64> = HashMap::new();

        for profile in state.listed_freelancers() {
            let ProfileDetails::Freelance {
                skills: own_skills,
                hourly_rate,
                experience_years,
                availability: own_availability,
                rating,
                completed_projects,
                ..
            } = &profile.details
            else {
                continue;
            };
            stats.total_freelancers += 1;
            stats.total_completed_projects += *completed_projects as i64;
            ratings.push(*rating);
            rates.extend(*hourly_rate);
            years.extend(experience_years.map(f64::from));
            if let Some(a) = own_availability {
                *availability.entry(a.to_lowercase()).or_default() += 1;
            }
            for skill in own_skills {
                *skills.entry(skill.to_lowercase()).or_default() += 1;
            }
        }

        stats.average_rating = mean(&ratings);
        stats.average_hourly_rate = mean(&rates);
        stats.average_experience_years = mean(&years);
        stats.availability_distribution = availability;

        let mut top: Vec<SkillCount> = skills
            .into_iter()
            .map(|(skill, count)| SkillCount { skill, count })
            .collect();
        top.sort_by(|a, b| b.count.cmp(&a.count).then(a.skill.cmp(&b.skill)));
        top.truncate(TOP_SKILLS as usize);
        stats.top_skills = top;

        Ok(stats)
    }
}

#[async_trait]
impl MissionExt for MemoryStore {
    async fn create_mission(
        &self,
        client_id: Uuid,
        title: String,
        description: String,
        budget: Option<f64>,
        deadline: Option<DateTime<Utc>>,
        required_skills: Vec<String>,
    ) -> Result<Mission, Error> {
        let now = Utc::now();
        let mission = Mission {
            id: Uuid::new_v4(),
            client_id,
            title,
            description,
            budget,
            deadline,
            required_skills,
            status: MissionStatus::Draft,
            assigned_freelance_id: None,
            created_at: now,
            updated_at: now,
        };
        self.state.lock().await.missions.push(mission.clone());
        Ok(mission)
    }

    async fn get_mission(&self, mission_id: Uuid) -> Result<Option<Mission>, Error> {
        let state = self.state.lock().await;
        Ok(state.missions.iter().find(|m| m.id == mission_id).cloned())
    }

    async fn save_mission_fields(&self, mission: &Mission) -> Result<Option<Mission>, Error> {
        let mut state = self.state.lock().await;
        let Some(stored) = state.missions.iter_mut().find(|m| m.id == mission.id) else {
            return Ok(None);
        };
        if !stored.status.is_editable() {
            return Ok(None);
        }
        stored.title = mission.title.clone();
        stored.description = mission.description.clone();
        stored.budget = mission.budget;
        stored.deadline = mission.deadline;
        stored.required_skills = mission.required_skills.clone();
        stored.updated_at = Utc::now();
        Ok(Some(stored.clone()))
    }

    async fn set_mission_status(
        &self,
        mission_id: Uuid,
        from: MissionStatus,
        to: MissionStatus,
    ) -> Result<Option<Mission>, Error> {
        let mut state = self.state.lock().await;
        let Some(mission) = state
            .missions
            .iter_mut()
            .find(|m| m.id == mission_id && m.status == from)
        else {
            return Ok(None);
        };
        mission.status = to;
        mission.updated_at = Utc::now();
        Ok(Some(mission.clone()))
    }

    async fn cancel_mission(&self, mission_id: Uuid) -> Result<Option<(Mission, u64)>, Error> {
        let mut state = self.state.lock().await;
        match state.missions.iter().find(|m| m.id == mission_id) {
            Some(m) if !m.status.is_terminal() => {}
            _ => return Ok(None),
        }

        let now = Utc::now();
        let mut cancelled = 0;
        for application in state
            .applications
            .iter_mut()
            .filter(|a| a.mission_id == mission_id && a.status == ApplicationStatus::Pending)
        {
            application.status = ApplicationStatus::Cancelled;
            application.updated_at = now;
            cancelled += 1;
        }

        let mission = state
            .missions
            .iter_mut()
            .find(|m| m.id == mission_id)
            .ok_or_else(not_found)?;
        mission.status = MissionStatus::Cancelled;
        mission.updated_at = now;
        Ok(Some((mission.clone(), cancelled)))
    }

    async fn delete_mission(&self, mission_id: Uuid) -> Result<MissionDeletion, Error> {
        let mut state = self.state.lock().await;
        let Some(mission) = state.missions.iter().find(|m| m.id == mission_id) else {
            return Ok(MissionDeletion::Missing);
        };
        if mission.status == MissionStatus::InProgress {
            return Ok(MissionDeletion::InProgress);
        }
        let applications = state
            .applications
            .iter()
            .filter(|a| a.mission_id == mission_id)
            .count() as i64;
        if mission.status == MissionStatus::Open && applications > 0 {
            return Ok(MissionDeletion::HasApplications(applications));
        }

        let chat_ids: Vec<Uuid> = state
            .chats
            .iter()
            .filter(|c| c.mission_id == Some(mission_id))
            .map(|c| c.id)
            .collect();
        state.messages.retain(|m| !chat_ids.contains(&m.chat_id));
        state.chats.retain(|c| c.mission_id != Some(mission_id));
        state.deliverables.retain(|d| d.mission_id != mission_id);
        state.applications.retain(|a| a.mission_id != mission_id);
        state.missions.retain(|m| m.id != mission_id);

        Ok(MissionDeletion::Deleted {
            applications_removed: applications as u64,
        })
    }

    async fn complete_mission(
        &self,
        mission_id: Uuid,
        rating: Option<f64>,
        feedback: Option<String>,
    ) -> Result<CompletionOutcome, Error> {
        let mut state = self.state.lock().await;
        let Some(mission) = state.missions.iter().find(|m| m.id == mission_id) else {
            return Ok(CompletionOutcome::Missing);
        };
        if mission.status != MissionStatus::InProgress {
            return Ok(CompletionOutcome::NotInProgress(mission.status));
        }

        let now = Utc::now();
        let Some(application) = state
            .applications
            .iter_mut()
            .find(|a| a.mission_id == mission_id && a.status == ApplicationStatus::Accepted)
        else {
            return Ok(CompletionOutcome::NoAcceptedApplication);
        };
        application.client_rating = rating;
        application.client_feedback = feedback;
        application.updated_at = now;
        let application = application.clone();

        let mission = state
            .missions
            .iter_mut()
            .find(|m| m.id == mission_id)
            .ok_or_else(not_found)?;
        mission.status = MissionStatus::Completed;
        mission.updated_at = now;
        let mission = mission.clone();

        if let Some(profile) = state
            .profiles
            .iter_mut()
            .find(|p| p.user_id == application.freelance_id)
        {
            if let ProfileDetails::Freelance {
                rating: current,
                completed_projects,
                ..
            } = &mut profile.details
            {
                if let Some(new) = rating {
                    *current = (*current * *completed_projects as f64 + new) / (*completed_projects + 1) as f64;
                }
                *completed_projects += 1;
            }
        }

        Ok(CompletionOutcome::Completed {
            mission,
            application,
        })
    }

    async fn list_missions(&self, filter: &MissionFilter) -> Result<Vec<Mission>, Error> {
        let state = self.state.lock().await;
        Ok(state
            .filtered_missions(filter)
            .into_iter()
            .skip(filter.offset as usize)
            .take(filter.limit as usize)
            .collect())
    }

    async fn count_missions(&self, filter: &MissionFilter) -> Result<i64, Error> {
        let state = self.state.lock().await;
        Ok(state.filtered_missions(filter).len() as i64)
    }

    async fn mission_stats(&self, client_id: Uuid) -> Result<MissionStats, Error> {
        let state = self.state.lock().await;
        let mut stats = MissionStats::default();
        let mut budgets = Vec::new();
        for mission in state.missions.iter().filter(|m| m.client_id == client_id) {
            stats.count_status(mission.status, 1);
            if let Some(budget) = mission.budget {
                budgets.push(budget);
            }
            stats.total_applications += state
                .applications
                .iter()
                .filter(|a| a.mission_id == mission.id)
                .count() as i64;
        }
        stats.total_budget = budgets.iter().sum();
        if !budgets.is_empty() {
            stats.average_budget = stats.total_budget / budgets.len() as f64;
        }
        Ok(stats)
    }
}

#[async_trait]
impl ApplicationExt for MemoryStore {
    async fn create_application(
        &self,
        mission_id: Uuid,
        freelance_id: Uuid,
    ) -> Result<Option<Application>, Error> {
        let mut state = self.state.lock().await;
        let open = state
            .missions
            .iter()
            .any(|m| m.id == mission_id && m.status == MissionStatus::Open);
        if !open
            || state
                .applications
                .iter()
                .any(|a| a.mission_id == mission_id && a.freelance_id == freelance_id)
        {
            return Ok(None);
        }
        let now = Utc::now();
        let application = Application {
            id: Uuid::new_v4(),
            mission_id,
            freelance_id,
            status: ApplicationStatus::Pending,
            client_rating: None,
            client_feedback: None,
            created_at: now,
            updated_at: now,
        };
        state.applications.push(application.clone());
        Ok(Some(application))
    }

    async fn get_application(&self, application_id: Uuid) -> Result<Option<Application>, Error> {
        let state = self.state.lock().await;
        Ok(state.applications.iter().find(|a| a.id == application_id).cloned())
    }

    async fn find_application(
        &self,
        mission_id: Uuid,
        freelance_id: Uuid,
    ) -> Result<Option<Application>, Error> {
        let state = self.state.lock().await;
        Ok(state
            .applications
            .iter()
            .find(|a| a.mission_id == mission_id && a.freelance_id == freelance_id)
            .cloned())
    }

    async fn list_applications_for_mission(&self, mission_id: Uuid) -> Result<Vec<Application>, Error> {
        let state = self.state.lock().await;
        Ok(state
            .applications
            .iter()
            .filter(|a| a.mission_id == mission_id)
            .cloned()
            .collect())
    }

    async fn list_applications_for_freelancer(
        &self,
        freelance_id: Uuid,
    ) -> Result<Vec<Application>, Error> {
        let state = self.state.lock().await;
        Ok(state
            .applications
            .iter()
            .rev()
            .filter(|a| a.freelance_id == freelance_id)
            .cloned()
            .collect())
    }

    async fn application_counts(
        &self,
        mission_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, ApplicationCounts>, Error> {
        let state = self.state.lock().await;
        let mut counts: HashMap<Uuid, ApplicationCounts> = HashMap::new();
        for application in state
            .applications
            .iter()
            .filter(|a| mission_ids.contains(&a.mission_id))
        {
            let entry = counts.entry(application.mission_id).or_default();
            entry.total += 1;
            if application.status == ApplicationStatus::Pending {
                entry.pending += 1;
            }
        }
        Ok(counts)
    }

    async fn get_accepted_application(&self, mission_id: Uuid) -> Result<Option<Application>, Error> {
        let state = self.state.lock().await;
        Ok(state
            .applications
            .iter()
            .find(|a| a.mission_id == mission_id && a.status == ApplicationStatus::Accepted)
            .cloned())
    }

    async fn accept_application(&self, application_id: Uuid) -> Result<AcceptOutcome, Error> {
        let mut state = self.state.lock().await;
        let Some(application) = state.applications.iter().find(|a| a.id == application_id).cloned() else {
            return Ok(AcceptOutcome::Missing);
        };
        let Some(mission) = state.missions.iter().find(|m| m.id == application.mission_id).cloned() else {
            return Ok(AcceptOutcome::Missing);
        };

        if state.applications.iter().any(|a| {
            a.mission_id == mission.id && a.id != application_id && a.status == ApplicationStatus::Accepted
        }) {
            return Ok(AcceptOutcome::AlreadyAccepted);
        }
        if application.status != ApplicationStatus::Pending {
            return Ok(AcceptOutcome::NotPending(application.status));
        }
        if mission.status != MissionStatus::Open {
            return Ok(AcceptOutcome::MissionNotOpen(mission.status));
        }

        let now = Utc::now();
        let mut accepted = None;
        let mut rejected_siblings = 0;
        for a in state.applications.iter_mut().filter(|a| a.mission_id == mission.id) {
            if a.id == application_id {
                a.status = ApplicationStatus::Accepted;
                a.updated_at = now;
                accepted = Some(a.clone());
            } else if a.status == ApplicationStatus::Pending {
                a.status = ApplicationStatus::Rejected;
                a.updated_at = now;
                rejected_siblings += 1;
            }
        }
        let application = accepted.ok_or_else(not_found)?;

        let stored = state
            .missions
            .iter_mut()
            .find(|m| m.id == mission.id)
            .ok_or_else(not_found)?;
        stored.status = MissionStatus::InProgress;
        stored.assigned_freelance_id = Some(application.freelance_id);
        stored.updated_at = now;
        let mission = stored.clone();

        let chat = state.upsert_mission_chat(mission.id, mission.client_id, Some(application.freelance_id));

        Ok(AcceptOutcome::Accepted {
            application,
            mission,
            chat,
            rejected_siblings,
        })
    }

    async fn reject_application(&self, application_id: Uuid) -> Result<Option<Application>, Error> {
        let mut state = self.state.lock().await;
        let Some(application) = state
            .applications
            .iter_mut()
            .find(|a| a.id == application_id && a.status == ApplicationStatus::Pending)
        else {
            return Ok(None);
        };
        application.status = ApplicationStatus::Rejected;
        application.updated_at = Utc::now();
        Ok(Some(application.clone()))
    }
}

#[async_trait]
impl DeliverableExt for MemoryStore {
    async fn create_deliverable(
        &self,
        mission_id: Uuid,
        submitted_by: Uuid,
        title: String,
        description: Option<String>,
        file_token: Option<String>,
    ) -> Result<Deliverable, Error> {
        let now = Utc::now();
        let deliverable = Deliverable {
            id: Uuid::new_v4(),
            mission_id,
            submitted_by,
            title,
            description,
            file_token,
            status: DeliverableStatus::Draft,
            client_feedback: None,
            reviewed_by: None,
            accepted_by: None,
            created_at: now,
            updated_at: now,
            submitted_at: None,
            reviewed_at: None,
            accepted_at: None,
        };
        self.state.lock().await.deliverables.push(deliverable.clone());
        Ok(deliverable)
    }

    async fn get_deliverable(&self, deliverable_id: Uuid) -> Result<Option<Deliverable>, Error> {
        let state = self.state.lock().await;
        Ok(state.deliverables.iter().find(|d| d.id == deliverable_id).cloned())
    }

    async fn update_deliverable(
        &self,
        deliverable_id: Uuid,
        title: String,
        description: Option<String>,
        file_token: Option<String>,
    ) -> Result<Option<Deliverable>, Error> {
        let mut state = self.state.lock().await;
        let Some(deliverable) = state
            .deliverables
            .iter_mut()
            .find(|d| d.id == deliverable_id && d.status.is_editable())
        else {
            return Ok(None);
        };
        deliverable.title = title;
        deliverable.description = description;
        deliverable.file_token = file_token;
        deliverable.updated_at = Utc::now();
        Ok(Some(deliverable.clone()))
    }

    async fn delete_deliverable(&self, deliverable_id: Uuid) -> Result<bool, Error> {
        let mut state = self.state.lock().await;
        let before = state.deliverables.len();
        state
            .deliverables
            .retain(|d| !(d.id == deliverable_id && d.status == DeliverableStatus::Draft));
        Ok(state.deliverables.len() < before)
    }

    async fn transition_deliverable(
        &self,
        deliverable_id: Uuid,
        step: ReviewStep,
        actor_id: Uuid,
        feedback: Option<String>,
    ) -> Result<Option<Deliverable>, Error> {
        let mut state = self.state.lock().await;
        let Some(deliverable) = state
            .deliverables
            .iter_mut()
            .find(|d| d.id == deliverable_id && step.sources().contains(&d.status))
        else {
            return Ok(None);
        };
        deliverable.stamp(step, actor_id, feedback, Utc::now());
        Ok(Some(deliverable.clone()))
    }

    async fn list_deliverables_for_mission(&self, mission_id: Uuid) -> Result<Vec<Deliverable>, Error> {
        let state = self.state.lock().await;
        Ok(state
            .deliverables
            .iter()
            .rev()
            .filter(|d| d.mission_id == mission_id)
            .cloned()
            .collect())
    }

    async fn list_deliverables_by_freelancer(&self, freelance_id: Uuid) -> Result<Vec<Deliverable>, Error> {
        let state = self.state.lock().await;
        Ok(state
            .deliverables
            .iter()
            .rev()
            .filter(|d| d.submitted_by == freelance_id)
            .cloned()
            .collect())
    }

    async fn list_deliverables_for_client(&self, client_id: Uuid) -> Result<Vec<Deliverable>, Error> {
        let state = self.state.lock().await;
        let missions: Vec<Uuid> = state
            .missions
            .iter()
            .filter(|m| m.client_id == client_id)
            .map(|m| m.id)
            .collect();
        Ok(state
            .deliverables
            .iter()
            .rev()
            .filter(|d| missions.contains(&d.mission_id))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl ChatExt for MemoryStore {
    async fn get_chat(&self, chat_id: Uuid) -> Result<Option<Chat>, Error> {
        let state = self.state.lock().await;
        Ok(state.chats.iter().find(|c| c.id == chat_id).cloned())
    }

    async fn get_mission_chat(&self, mission_id: Uuid) -> Result<Option<Chat>, Error> {
        let state = self.state.lock().await;
        Ok(state
            .chats
            .iter()
            .find(|c| c.chat_type == ChatType::Mission && c.mission_id == Some(mission_id))
            .cloned())
    }

    async fn upsert_mission_chat(
        &self,
        mission_id: Uuid,
        client_id: Uuid,
        freelance_id: Option<Uuid>,
    ) -> Result<Chat, Error> {
        let mut state = self.state.lock().await;
        Ok(state.upsert_mission_chat(mission_id, client_id, freelance_id))
    }

    async fn get_or_create_support_chat(&self, user_id: Uuid) -> Result<Chat, Error> {
        let mut state = self.state.lock().await;
        if let Some(chat) = state
            .chats
            .iter()
            .find(|c| c.chat_type == ChatType::Support && c.user1_id == user_id)
        {
            return Ok(chat.clone());
        }
        let now = Utc::now();
        let chat = Chat {
            id: Uuid::new_v4(),
            chat_type: ChatType::Support,
            user1_id: user_id,
            user2_id: None,
            mission_id: None,
            unread_user1: 0,
            unread_user2: 0,
            unread_admin: 0,
            created_at: now,
            updated_at: now,
        };
        state.chats.push(chat.clone());
        Ok(chat)
    }

    async fn list_chats_for_user(&self, user_id: Uuid) -> Result<Vec<Chat>, Error> {
        let state = self.state.lock().await;
        Ok(state
            .chats
            .iter()
            .filter(|c| match c.chat_type {
                ChatType::Mission => c.user1_id == user_id || c.user2_id == Some(user_id),
                ChatType::Support => c.user1_id == user_id,
            })
            .cloned()
            .collect())
    }

    async fn list_support_chats(&self) -> Result<Vec<Chat>, Error> {
        let state = self.state.lock().await;
        Ok(state
            .chats
            .iter()
            .filter(|c| c.chat_type == ChatType::Support)
            .cloned()
            .collect())
    }

    async fn send_message(
        &self,
        chat_id: Uuid,
        sender_id: Uuid,
        content: String,
        recipient: CounterSlot,
        support_agent: Option<Uuid>,
    ) -> Result<Message, Error> {
        let mut state = self.state.lock().await;
        let now = Utc::now();
        let chat = state
            .chats
            .iter_mut()
            .find(|c| c.id == chat_id)
            .ok_or_else(not_found)?;
        match recipient {
            CounterSlot::User1 => chat.unread_user1 += 1,
            CounterSlot::User2 => chat.unread_user2 += 1,
            CounterSlot::Admin => chat.unread_admin += 1,
        }
        if chat.user2_id.is_none() {
            chat.user2_id = support_agent;
        }
        chat.updated_at = now;

        let message = Message {
            id: Uuid::new_v4(),
            chat_id,
            sender_id,
            content,
            is_read: false,
            created_at: now,
        };
        state.messages.push(message.clone());
        Ok(message)
    }

    async fn read_messages(
        &self,
        chat_id: Uuid,
        reader_id: Uuid,
        slot: CounterSlot,
    ) -> Result<Vec<Message>, Error> {
        let mut state = self.state.lock().await;
        state.mark_read(chat_id, reader_id, slot)?;
        Ok(state
            .messages
            .iter()
            .filter(|m| m.chat_id == chat_id)
            .cloned()
            .collect())
    }

    async fn mark_chat_read(
        &self,
        chat_id: Uuid,
        reader_id: Uuid,
        slot: CounterSlot,
    ) -> Result<Chat, Error> {
        let mut state = self.state.lock().await;
        state.mark_read(chat_id, reader_id, slot)
    }

    async fn list_messages(&self, chat_id: Uuid) -> Result<Vec<Message>, Error> {
        let state = self.state.lock().await;
        Ok(state
            .messages
            .iter()
            .filter(|m| m.chat_id == chat_id)
            .cloned()
            .collect())
    }

    async fn get_message(&self, message_id: Uuid) -> Result<Option<Message>, Error> {
        let state = self.state.lock().await;
        Ok(state.messages.iter().find(|m| m.id == message_id).cloned())
    }

    async fn delete_message(&self, message_id: Uuid) -> Result<bool, Error> {
        let mut state = self.state.lock().await;
        let before = state.messages.len();
        state.messages.retain(|m| m.id != message_id);
        Ok(state.messages.len() < before)
    }
}

#[async_trait]
impl ComplaintExt for MemoryStore {
    async fn create_complaint(
        &self,
        plaintiff_id: Uuid,
        reported_email: String,
        reason: String,
    ) -> Result<Complaint, Error> {
        let complaint = Complaint {
            id: Uuid::new_v4(),
            plaintiff_id,
            reported_email,
            reason,
            status: ComplaintStatus::Pending,
            reviewed_by: None,
            reviewed_at: None,
            review_notes: None,
            created_at: Utc::now(),
        };
        self.state.lock().await.complaints.push(complaint.clone());
        Ok(complaint)
    }

    async fn get_complaint(&self, complaint_id: Uuid) -> Result<Option<Complaint>, Error> {
        let state = self.state.lock().await;
        Ok(state.complaints.iter().find(|c| c.id == complaint_id).cloned())
    }

    async fn list_complaints_by_plaintiff(&self, plaintiff_id: Uuid) -> Result<Vec<Complaint>, Error> {
        let state = self.state.lock().await;
        Ok(state
            .complaints
            .iter()
            .rev()
            .filter(|c| c.plaintiff_id == plaintiff_id)
            .cloned()
            .collect())
    }

    async fn list_complaints(
        &self,
        status: Option<ComplaintStatus>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Complaint>, Error> {
        let state = self.state.lock().await;
        Ok(state
            .complaints
            .iter()
            .rev()
            .filter(|c| status.map_or(true, |s| c.status == s))
            .skip(offset as usize)
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn count_complaints(&self, status: Option<ComplaintStatus>) -> Result<i64, Error> {
        let state = self.state.lock().await;
        Ok(state
            .complaints
            .iter()
            .filter(|c| status.map_or(true, |s| c.status == s))
            .count() as i64)
    }

    async fn approve_complaint(
        &self,
        complaint_id: Uuid,
        admin_id: Uuid,
        reported_user_id: Uuid,
    ) -> Result<ComplaintReview, Error> {
        let mut state = self.state.lock().await;
        if let Some(review) = state.review_pending(complaint_id) {
            return Ok(review);
        }

        let now = Utc::now();
        if let Some(user) = state.users.iter_mut().find(|u| u.id == reported_user_id) {
            user.is_active = false;
            user.updated_at = now;
        }

        let complaint = state
            .complaints
            .iter_mut()
            .find(|c| c.id == complaint_id)
            .ok_or_else(not_found)?;
        complaint.status = ComplaintStatus::Approved;
        complaint.reviewed_by = Some(admin_id);
        complaint.reviewed_at = Some(now);
        let complaint = complaint.clone();

        state.log_action(
            admin_id,
            AdminActionType::ApproveComplaint,
            Some(reported_user_id),
            Some(complaint_id),
            None,
        );
        state.log_action(
            admin_id,
            AdminActionType::BlockUser,
            Some(reported_user_id),
            Some(complaint_id),
            Some(complaint.reason.clone()),
        );

        Ok(ComplaintReview::Reviewed(complaint))
    }

    async fn reject_complaint(
        &self,
        complaint_id: Uuid,
        admin_id: Uuid,
        notes: Option<String>,
    ) -> Result<ComplaintReview, Error> {
        let mut state = self.state.lock().await;
        if let Some(review) = state.review_pending(complaint_id) {
            return Ok(review);
        }

        let complaint = state
            .complaints
            .iter_mut()
            .find(|c| c.id == complaint_id)
            .ok_or_else(not_found)?;
        complaint.status = ComplaintStatus::Rejected;
        complaint.reviewed_by = Some(admin_id);
        complaint.reviewed_at = Some(Utc::now());
        complaint.review_notes = notes.clone();
        let complaint = complaint.clone();

        state.log_action(
            admin_id,
            AdminActionType::RejectComplaint,
            None,
            Some(complaint_id),
            notes,
        );

        Ok(ComplaintReview::Reviewed(complaint))
    }

    async fn delete_complaint(&self, complaint_id: Uuid) -> Result<bool, Error> {
        let mut state = self.state.lock().await;
        let before = state.complaints.len();
        state.complaints.retain(|c| c.id != complaint_id);
        Ok(state.complaints.len() < before)
    }

    async fn unblock_user(
        &self,
        user_id: Uuid,
        admin_id: Uuid,
        notes: Option<String>,
    ) -> Result<Option<User>, Error> {
        let mut state = self.state.lock().await;
        let Some(user) = state.users.iter_mut().find(|u| u.id == user_id && !u.is_active) else {
            return Ok(None);
        };
        user.is_active = true;
        user.updated_at = Utc::now();
        let user = user.clone();

        state.log_action(admin_id, AdminActionType::UnblockUser, Some(user_id), None, notes);
        Ok(Some(user))
    }

    async fn list_admin_actions(
        &self,
        admin_id: Option<Uuid>,
        action_type: Option<AdminActionType>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<AdminAction>, Error> {
        let state = self.state.lock().await;
        Ok(state
            .admin_actions
            .iter()
            .rev()
            .filter(|a| admin_id.map_or(true, |id| a.admin_id == id))
            .filter(|a| action_type.map_or(true, |t| a.action_type == t))
            .skip(offset as usize)
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn count_admin_actions(
        &self,
        admin_id: Option<Uuid>,
        action_type: Option<AdminActionType>,
    ) -> Result<i64, Error> {
        let state = self.state.lock().await;
        Ok(state
            .admin_actions
            .iter()
            .filter(|a| admin_id.map_or(true, |id| a.admin_id == id))
            .filter(|a| action_type.map_or(true, |t| a.action_type == t))
            .count() as i64)
    }
}
