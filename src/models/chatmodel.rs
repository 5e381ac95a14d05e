use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::usermodel::Actor;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "chat_type", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChatType {
    Mission,
    Support,
}

#[derive(Debug, Serialize, Deserialize, Clone, sqlx::FromRow, PartialEq)]
pub struct Chat {
    pub id: Uuid,
    pub chat_type: ChatType,
    pub user1_id: Uuid,
    pub user2_id: Option<Uuid>,
    pub mission_id: Option<Uuid>,
    pub unread_user1: i32,
    pub unread_user2: i32,
    pub unread_admin: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One of the three per-chat unread counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterSlot {
    User1,
    User2,
    Admin,
}

impl CounterSlot {
    pub fn column(&self) -> &'static str {
        match self {
            CounterSlot::User1 => "unread_user1",
            CounterSlot::User2 => "unread_user2",
            CounterSlot::Admin => "unread_admin",
        }
    }
}

/// How an actor relates to a chat.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatAccess {
    /// Participant owning the given counter.
    Participant(CounterSlot),
    /// Admin looking at a mission chat; may read without side effects.
    Observer,
    None,
}

impl Chat {
    pub fn access_for(&self, actor: &Actor) -> ChatAccess {
        match self.chat_type {
            ChatType::Mission => {
                if actor.id == self.user1_id {
                    ChatAccess::Participant(CounterSlot::User1)
                } else if Some(actor.id) == self.user2_id {
                    ChatAccess::Participant(CounterSlot::User2)
                } else if actor.is_admin() {
                    ChatAccess::Observer
                } else {
                    ChatAccess::None
                }
            }
            ChatType::Support => {
                if actor.id == self.user1_id {
                    ChatAccess::Participant(CounterSlot::User1)
                } else if actor.is_admin() {
                    ChatAccess::Participant(CounterSlot::Admin)
                } else {
                    ChatAccess::None
                }
            }
        }
    }

    /// Counter bumped when a participant in `sender` slot posts.
    pub fn recipient_of(&self, sender: CounterSlot) -> CounterSlot {
        match (self.chat_type, sender) {
            (ChatType::Mission, CounterSlot::User1) => CounterSlot::User2,
            (ChatType::Mission, _) => CounterSlot::User1,
            (ChatType::Support, CounterSlot::Admin) => CounterSlot::User1,
            (ChatType::Support, _) => CounterSlot::Admin,
        }
    }

    pub fn unread(&self, slot: CounterSlot) -> i32 {
        match slot {
            CounterSlot::User1 => self.unread_user1,
            CounterSlot::User2 => self.unread_user2,
            CounterSlot::Admin => self.unread_admin,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, sqlx::FromRow, PartialEq)]
pub struct Message {
    pub id: Uuid,
    pub chat_id: Uuid,
    pub sender_id: Uuid,
    pub content: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ChatUnread {
    pub chat_id: Uuid,
    pub chat_type: ChatType,
    pub mission_id: Option<Uuid>,
    pub unread: i32,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct UnreadStatus {
    pub total_unread: i64,
    pub chats: Vec<ChatUnread>,
}
