use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::chatmodel::{Chat, Message};

pub const MAX_MESSAGE_LENGTH: usize = 5000;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SendMessageDto {
    #[validate(length(max = 5000, message = "Message is too long"))]
    pub content: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatWithMessagesDto {
    pub chat: Chat,
    pub messages: Vec<Message>,
}
