use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dtos::commondtos::RequestQueryDto,
    models::complaintmodel::{AdminActionType, ComplaintStatus},
};

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateComplaintDto {
    #[validate(email(message = "Reported email is invalid"))]
    pub reported_email: String,

    #[validate(length(min = 1, max = 2000, message = "A reason is required"))]
    pub reason: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct ReviewNotesDto {
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ComplaintQuery {
    pub status: Option<ComplaintStatus>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl ComplaintQuery {
    pub fn pagination(&self) -> RequestQueryDto {
        RequestQueryDto::new(self.page, self.per_page)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdminActionQuery {
    pub admin_id: Option<Uuid>,
    pub action_type: Option<AdminActionType>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl AdminActionQuery {
    pub fn pagination(&self) -> RequestQueryDto {
        RequestQueryDto::new(self.page, self.per_page)
    }
}
