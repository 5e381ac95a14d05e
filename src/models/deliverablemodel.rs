use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "deliverable_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeliverableStatus {
    Draft,
    Submitted,
    UnderReview,
    Accepted,
    Rejected,
    NeedsRevision,
}

impl DeliverableStatus {
    pub fn to_str(&self) -> &str {
        match self {
            DeliverableStatus::Draft => "DRAFT",
            DeliverableStatus::Submitted => "SUBMITTED",
            DeliverableStatus::UnderReview => "UNDER_REVIEW",
            DeliverableStatus::Accepted => "ACCEPTED",
            DeliverableStatus::Rejected => "REJECTED",
            DeliverableStatus::NeedsRevision => "NEEDS_REVISION",
        }
    }

    /// Freelancer may still edit and (re)submit.
    pub fn is_editable(&self) -> bool {
        matches!(self, DeliverableStatus::Draft | DeliverableStatus::NeedsRevision)
    }
}

/// Review step requested on a deliverable, with the statuses it may leave.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewStep {
    Submit,
    StartReview,
    Accept,
    Reject,
    RequestRevision,
}

impl ReviewStep {
    pub fn sources(&self) -> &'static [DeliverableStatus] {
        match self {
            ReviewStep::Submit => &[DeliverableStatus::Draft, DeliverableStatus::NeedsRevision],
            ReviewStep::StartReview => &[DeliverableStatus::Submitted],
            ReviewStep::Accept | ReviewStep::Reject | ReviewStep::RequestRevision => {
                &[DeliverableStatus::UnderReview]
            }
        }
    }

    pub fn target(&self) -> DeliverableStatus {
        match self {
            ReviewStep::Submit => DeliverableStatus::Submitted,
            ReviewStep::StartReview => DeliverableStatus::UnderReview,
            ReviewStep::Accept => DeliverableStatus::Accepted,
            ReviewStep::Reject => DeliverableStatus::Rejected,
            ReviewStep::RequestRevision => DeliverableStatus::NeedsRevision,
        }
    }

    pub fn requires_feedback(&self) -> bool {
        matches!(self, ReviewStep::Reject | ReviewStep::RequestRevision)
    }

    pub fn by_client(&self) -> bool {
        !matches!(self, ReviewStep::Submit)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, sqlx::FromRow, PartialEq)]
pub struct Deliverable {
    pub id: Uuid,
    pub mission_id: Uuid,
    pub submitted_by: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub file_token: Option<String>,
    pub status: DeliverableStatus,
    pub client_feedback: Option<String>,
    pub reviewed_by: Option<Uuid>,
    pub accepted_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub submitted_at: Option<DateTime<Utc>>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub accepted_at: Option<DateTime<Utc>>,
}

impl Deliverable {
    /// Stamps the bookkeeping fields that go with entering `step.target()`.
    pub fn stamp(&mut self, step: ReviewStep, actor_id: Uuid, feedback: Option<String>, at: DateTime<Utc>) {
        self.status = step.target();
        self.updated_at = at;
        match step {
            ReviewStep::Submit => self.submitted_at = Some(at),
            ReviewStep::StartReview => {
                self.reviewed_by = Some(actor_id);
                self.reviewed_at = Some(at);
            }
            ReviewStep::Accept => {
                self.accepted_by = Some(actor_id);
                self.accepted_at = Some(at);
            }
            ReviewStep::Reject | ReviewStep::RequestRevision => {}
        }
        if feedback.is_some() {
            self.client_feedback = feedback;
        }
    }
}
