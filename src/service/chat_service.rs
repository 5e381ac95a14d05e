// service/chat_service.rs
use std::sync::Arc;

use uuid::Uuid;

use crate::{
    db::{chatdb::ChatExt, missiondb::MissionExt, MarketStore},
    dtos::chatdtos::MAX_MESSAGE_LENGTH,
    models::{
        chatmodel::{Chat, ChatAccess, ChatType, ChatUnread, CounterSlot, Message, UnreadStatus},
        usermodel::{Actor, UserRole},
    },
    service::{error::ServiceError, guard::authorize},
};

#[derive(Clone)]
pub struct ChatService {
    store: Arc<dyn MarketStore>,
}

impl ChatService {
    pub fn new(store: Arc<dyn MarketStore>) -> Self {
        Self { store }
    }

    async fn load(&self, chat_id: Uuid) -> Result<Chat, ServiceError> {
        self.store
            .get_chat(chat_id)
            .await?
            .ok_or_else(|| ServiceError::not_found(format!("Chat {} not found", chat_id)))
    }

    /// Lazily creates the mission chat. When the assigned freelancer changed
    /// since the chat was created, its second participant is rebound.
    pub async fn get_or_create_mission_chat(
        &self,
        mission_id: Uuid,
        actor: &Actor,
    ) -> Result<Chat, ServiceError> {
        let mission = self
            .store
            .get_mission(mission_id)
            .await?
            .ok_or_else(|| ServiceError::not_found(format!("Mission {} not found", mission_id)))?;

        let allowed = actor.id == mission.client_id
            || mission.assigned_freelance_id == Some(actor.id)
            || actor.is_admin();
        if !allowed {
            return Err(ServiceError::permission(
                "Only the mission client, its freelancer or an admin can open this chat",
            ));
        }

        if let Some(chat) = self.store.get_mission_chat(mission_id).await? {
            if chat.user2_id == mission.assigned_freelance_id {
                return Ok(chat);
            }
        }

        let chat = self
            .store
            .upsert_mission_chat(mission_id, mission.client_id, mission.assigned_freelance_id)
            .await?;
        tracing::info!("Mission chat {} ready for mission {}", chat.id, mission_id);
        Ok(chat)
    }

    pub async fn get_or_create_support_chat(&self, actor: &Actor) -> Result<Chat, ServiceError> {
        authorize(actor, &[UserRole::Client, UserRole::Freelance])?;
        Ok(self.store.get_or_create_support_chat(actor.id).await?)
    }

    fn participant_slot(chat: &Chat, actor: &Actor) -> Result<CounterSlot, ServiceError> {
        match chat.access_for(actor) {
            ChatAccess::Participant(slot) => Ok(slot),
            ChatAccess::Observer => Err(ServiceError::permission(
                "Admins can only observe mission chats",
            )),
            ChatAccess::None => Err(ServiceError::permission(
                "You are not a participant of this chat",
            )),
        }
    }

    pub async fn send_message(
        &self,
        chat_id: Uuid,
        actor: &Actor,
        content: &str,
    ) -> Result<Message, ServiceError> {
        let chat = self.load(chat_id).await?;
        let slot = Self::participant_slot(&chat, actor)?;

        let content = content.trim();
        if content.is_empty() {
            return Err(ServiceError::validation("Message content cannot be empty"));
        }
        if content.chars().count() > MAX_MESSAGE_LENGTH {
            return Err(ServiceError::validation(format!(
                "Message cannot exceed {} characters",
                MAX_MESSAGE_LENGTH
            )));
        }

        let recipient = chat.recipient_of(slot);
        let support_agent = (chat.chat_type == ChatType::Support && slot == CounterSlot::Admin)
            .then_some(actor.id);

        let message = self
            .store
            .send_message(chat_id, actor.id, content.to_string(), recipient, support_agent)
            .await?;

        tracing::debug!("Message {} posted in chat {}", message.id, chat_id);
        Ok(message)
    }

    /// Participants get their counter reset and foreign messages marked
    /// read. Admin observers of mission chats read without side effects.
    pub async fn list_messages(&self, chat_id: Uuid, actor: &Actor) -> Result<Vec<Message>, ServiceError> {
        let chat = self.load(chat_id).await?;

        match chat.access_for(actor) {
            ChatAccess::Participant(slot) => {
                Ok(self.store.read_messages(chat_id, actor.id, slot).await?)
            }
            ChatAccess::Observer => Ok(self.store.list_messages(chat_id).await?),
            ChatAccess::None => Err(ServiceError::permission(
                "You are not a participant of this chat",
            )),
        }
    }

    pub async fn mark_read(&self, chat_id: Uuid, actor: &Actor) -> Result<Chat, ServiceError> {
        let chat = self.load(chat_id).await?;

        match chat.access_for(actor) {
            ChatAccess::Participant(slot) => {
                Ok(self.store.mark_chat_read(chat_id, actor.id, slot).await?)
            }
            ChatAccess::Observer => Ok(chat),
            ChatAccess::None => Err(ServiceError::permission(
                "You are not a participant of this chat",
            )),
        }
    }

    pub async fn delete_message(&self, message_id: Uuid, actor: &Actor) -> Result<(), ServiceError> {
        let message = self
            .store
            .get_message(message_id)
            .await?
            .ok_or_else(|| ServiceError::not_found(format!("Message {} not found", message_id)))?;

        if message.sender_id != actor.id && !actor.is_admin() {
            return Err(ServiceError::permission("You can only delete your own messages"));
        }

        if !self.store.delete_message(message_id).await? {
            return Err(ServiceError::not_found(format!("Message {} not found", message_id)));
        }
        tracing::info!("Message {} deleted by {}", message_id, actor.id);
        Ok(())
    }

    /// Polling endpoint: unread counters visible to the actor.
    pub async fn check_status(&self, actor: &Actor) -> Result<UnreadStatus, ServiceError> {
        let chats = if actor.is_admin() {
            self.store.list_support_chats().await?
        } else {
            self.store.list_chats_for_user(actor.id).await?
        };

        let mut status = UnreadStatus::default();
        for chat in chats {
            let ChatAccess::Participant(slot) = chat.access_for(actor) else {
                continue;
            };
            let unread = chat.unread(slot);
            status.total_unread += unread as i64;
            status.chats.push(ChatUnread {
                chat_id: chat.id,
                chat_type: chat.chat_type,
                mission_id: chat.mission_id,
                unread,
            });
        }
        Ok(status)
    }

    pub async fn list_my_chats(&self, actor: &Actor) -> Result<Vec<Chat>, ServiceError> {
        Ok(self.store.list_chats_for_user(actor.id).await?)
    }

    pub async fn list_support_chats(&self, actor: &Actor) -> Result<Vec<Chat>, ServiceError> {
        authorize(actor, &[UserRole::Admin])?;
        Ok(self.store.list_support_chats().await?)
    }
}
