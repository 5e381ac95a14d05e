use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Text fields of a deliverable; the file travels as a multipart part.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct DeliverableFieldsDto {
    pub mission_id: Option<Uuid>,

    #[validate(length(min = 1, max = 255, message = "Title is required"))]
    pub title: String,

    #[validate(length(max = 5000, message = "Description is too long"))]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct ReviewFeedbackDto {
    #[validate(length(max = 5000, message = "Feedback is too long"))]
    pub feedback: Option<String>,
}

/// File received through multipart, not yet handed to storage.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}
