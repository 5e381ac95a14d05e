use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::chatmodel::Chat;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "mission_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MissionStatus {
    Draft,
    Open,
    InProgress,
    Completed,
    Cancelled,
}

impl MissionStatus {
    pub const ALL: [MissionStatus; 5] = [
        MissionStatus::Draft,
        MissionStatus::Open,
        MissionStatus::InProgress,
        MissionStatus::Completed,
        MissionStatus::Cancelled,
    ];

    pub fn to_str(&self) -> &str {
        match self {
            MissionStatus::Draft => "DRAFT",
            MissionStatus::Open => "OPEN",
            MissionStatus::InProgress => "IN_PROGRESS",
            MissionStatus::Completed => "COMPLETED",
            MissionStatus::Cancelled => "CANCELLED",
        }
    }

    /// Targets reachable from this status through `change_status`.
    pub fn allowed_targets(&self) -> &'static [MissionStatus] {
        match self {
            MissionStatus::Draft => &[MissionStatus::Open, MissionStatus::Cancelled],
            MissionStatus::Open => &[MissionStatus::InProgress, MissionStatus::Cancelled],
            MissionStatus::InProgress => &[MissionStatus::Completed, MissionStatus::Cancelled],
            MissionStatus::Completed | MissionStatus::Cancelled => &[],
        }
    }

    pub fn can_transition_to(&self, target: MissionStatus) -> bool {
        self.allowed_targets().contains(&target)
    }

    /// Fields may only be patched while the mission has not started.
    pub fn is_editable(&self) -> bool {
        matches!(self, MissionStatus::Draft | MissionStatus::Open)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, MissionStatus::Completed | MissionStatus::Cancelled)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, sqlx::FromRow, PartialEq)]
pub struct Mission {
    pub id: Uuid,
    pub client_id: Uuid,
    pub title: String,
    pub description: String,
    pub budget: Option<f64>,
    pub deadline: Option<DateTime<Utc>>,
    pub required_skills: Vec<String>,
    pub status: MissionStatus,
    pub assigned_freelance_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "application_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApplicationStatus {
    Pending,
    Accepted,
    Rejected,
    Cancelled,
}

impl ApplicationStatus {
    pub fn to_str(&self) -> &str {
        match self {
            ApplicationStatus::Pending => "PENDING",
            ApplicationStatus::Accepted => "ACCEPTED",
            ApplicationStatus::Rejected => "REJECTED",
            ApplicationStatus::Cancelled => "CANCELLED",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, sqlx::FromRow, PartialEq)]
pub struct Application {
    pub id: Uuid,
    pub mission_id: Uuid,
    pub freelance_id: Uuid,
    pub status: ApplicationStatus,
    pub client_rating: Option<f64>,
    pub client_feedback: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Decision {
    Accept,
    Reject,
}

/// Field patch applied by `update`. `None` leaves a field untouched; the
/// nullable fields use a nested option so they can be cleared.
#[derive(Debug, Clone, Default)]
pub struct MissionChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub budget: Option<Option<f64>>,
    pub deadline: Option<Option<DateTime<Utc>>>,
    pub required_skills: Option<Vec<String>>,
}

impl MissionChanges {
    pub fn apply_to(self, mission: &mut Mission) {
        if let Some(title) = self.title {
            mission.title = title;
        }
        if let Some(description) = self.description {
            mission.description = description;
        }
        if let Some(budget) = self.budget {
            mission.budget = budget;
        }
        if let Some(deadline) = self.deadline {
            mission.deadline = deadline;
        }
        if let Some(skills) = self.required_skills {
            mission.required_skills = skills;
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum MissionSort {
    #[default]
    CreatedAt,
    Budget,
    Deadline,
}

impl MissionSort {
    pub fn column(&self) -> &'static str {
        match self {
            MissionSort::CreatedAt => "created_at",
            MissionSort::Budget => "budget",
            MissionSort::Deadline => "deadline",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn keyword(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// Criteria shared by every mission listing.
#[derive(Debug, Clone, Default)]
pub struct MissionFilter {
    pub client_id: Option<Uuid>,
    pub status: Option<MissionStatus>,
    pub min_budget: Option<f64>,
    pub max_budget: Option<f64>,
    pub skills: Vec<String>,
    pub text: Option<String>,
    pub deadline_before: Option<DateTime<Utc>>,
    pub exclude_applied_by: Option<Uuid>,
    pub sort: MissionSort,
    pub order: SortOrder,
    pub limit: i64,
    pub offset: i64,
}

impl MissionFilter {
    /// Whether `mission` satisfies every criterion except the applicant
    /// exclusion, which needs application data.
    pub fn matches(&self, mission: &Mission) -> bool {
        if self.client_id.is_some_and(|id| id != mission.client_id) {
            return false;
        }
        if self.status.is_some_and(|s| s != mission.status) {
            return false;
        }
        if let Some(min) = self.min_budget {
            if !mission.budget.is_some_and(|b| b >= min) {
                return false;
            }
        }
        if let Some(max) = self.max_budget {
            if !mission.budget.is_some_and(|b| b <= max) {
                return false;
            }
        }
        if !self
            .skills
            .iter()
            .all(|skill| mission.required_skills.contains(skill))
        {
            return false;
        }
        if let Some(text) = &self.text {
            let needle = text.to_lowercase();
            if !mission.title.to_lowercase().contains(&needle)
                && !mission.description.to_lowercase().contains(&needle)
            {
                return false;
            }
        }
        if let Some(before) = self.deadline_before {
            if !mission.deadline.is_some_and(|d| d <= before) {
                return false;
            }
        }
        true
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct ApplicationCounts {
    pub total: i64,
    pub pending: i64,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct MissionWithCounts {
    #[serde(flatten)]
    pub mission: Mission,
    pub applications: ApplicationCounts,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct MissionStats {
    pub total_missions: i64,
    pub draft: i64,
    pub open: i64,
    pub in_progress: i64,
    pub completed: i64,
    pub cancelled: i64,
    pub total_budget: f64,
    pub average_budget: f64,
    pub total_applications: i64,
}

impl MissionStats {
    pub fn count_status(&mut self, status: MissionStatus, count: i64) {
        match status {
            MissionStatus::Draft => self.draft += count,
            MissionStatus::Open => self.open += count,
            MissionStatus::InProgress => self.in_progress += count,
            MissionStatus::Completed => self.completed += count,
            MissionStatus::Cancelled => self.cancelled += count,
        }
        self.total_missions += count;
    }
}

/// Read-only row handed to the export renderer.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct MissionExportRow {
    pub id: Uuid,
    pub title: String,
    pub status: MissionStatus,
    pub budget: Option<f64>,
    pub deadline: Option<DateTime<Utc>>,
    pub required_skills: Vec<String>,
    pub assigned_freelance_id: Option<Uuid>,
    pub total_applications: i64,
    pub pending_applications: i64,
    pub created_at: DateTime<Utc>,
}

/// Result of the locked accept transaction.
#[derive(Debug, Clone)]
pub enum AcceptOutcome {
    Accepted {
        application: Application,
        mission: Mission,
        chat: Chat,
        rejected_siblings: u64,
    },
    AlreadyAccepted,
    NotPending(ApplicationStatus),
    MissionNotOpen(MissionStatus),
    Missing,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MissionDeletion {
    Deleted { applications_removed: u64 },
    InProgress,
    HasApplications(i64),
    Missing,
}

#[derive(Debug, Clone)]
pub enum CompletionOutcome {
    Completed {
        mission: Mission,
        application: Application,
    },
    NotInProgress(MissionStatus),
    NoAcceptedApplication,
    Missing,
}
