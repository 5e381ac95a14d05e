// db/chatdb.rs
use async_trait::async_trait;
use sqlx::{Error, Postgres, Transaction};
use uuid::Uuid;

use super::db::DBClient;
use crate::models::chatmodel::*;

#[async_trait]
pub trait ChatExt {
    async fn get_chat(&self, chat_id: Uuid) -> Result<Option<Chat>, Error>;

    async fn get_mission_chat(&self, mission_id: Uuid) -> Result<Option<Chat>, Error>;

    /// Creates the mission chat or rebinds its second participant.
    async fn upsert_mission_chat(
        &self,
        mission_id: Uuid,
        client_id: Uuid,
        freelance_id: Option<Uuid>,
    ) -> Result<Chat, Error>;

    async fn get_or_create_support_chat(&self, user_id: Uuid) -> Result<Chat, Error>;

    async fn list_chats_for_user(&self, user_id: Uuid) -> Result<Vec<Chat>, Error>;

    async fn list_support_chats(&self) -> Result<Vec<Chat>, Error>;

    /// Inserts the message and bumps `recipient` in one transaction.
    /// `support_agent` claims an unassigned support chat for that admin.
    async fn send_message(
        &self,
        chat_id: Uuid,
        sender_id: Uuid,
        content: String,
        recipient: CounterSlot,
        support_agent: Option<Uuid>,
    ) -> Result<Message, Error>;

    /// Marks every message not sent by `reader_id` as read, zeroes `slot`
    /// and returns the full history, oldest first.
    async fn read_messages(
        &self,
        chat_id: Uuid,
        reader_id: Uuid,
        slot: CounterSlot,
    ) -> Result<Vec<Message>, Error>;

    async fn mark_chat_read(
        &self,
        chat_id: Uuid,
        reader_id: Uuid,
        slot: CounterSlot,
    ) -> Result<Chat, Error>;

    async fn list_messages(&self, chat_id: Uuid) -> Result<Vec<Message>, Error>;

    async fn get_message(&self, message_id: Uuid) -> Result<Option<Message>, Error>;

    async fn delete_message(&self, message_id: Uuid) -> Result<bool, Error>;
}

pub(crate) async fn upsert_mission_chat_tx(
    tx: &mut Transaction<'_, Postgres>,
    mission_id: Uuid,
    client_id: Uuid,
    freelance_id: Option<Uuid>,
) -> Result<Chat, Error> {
    sqlx::query_as::<_, Chat>(
        r#"
        INSERT INTO chats (chat_type, user1_id, user2_id, mission_id)
        VALUES ('MISSION', $2, $3, $1)
        ON CONFLICT (mission_id) WHERE chat_type = 'MISSION'
        DO UPDATE SET user2_id = EXCLUDED.user2_id, updated_at = NOW()
        RETURNING *
        "#,
    )
    .bind(mission_id)
    .bind(client_id)
    .bind(freelance_id)
    .fetch_one(&mut **tx)
    .await
}

async fn mark_read_tx(
    tx: &mut Transaction<'_, Postgres>,
    chat_id: Uuid,
    reader_id: Uuid,
    slot: CounterSlot,
) -> Result<Chat, Error> {
    sqlx::query(
        r#"
        UPDATE messages
        SET is_read = TRUE
        WHERE chat_id = $1 AND sender_id <> $2 AND is_read = FALSE
        "#,
    )
    .bind(chat_id)
    .bind(reader_id)
    .execute(&mut **tx)
    .await?;

    let sql = format!(
        "UPDATE chats SET {} = 0 WHERE id = $1 RETURNING *",
        slot.column()
    );
    sqlx::query_as::<_, Chat>(&sql)
        .bind(chat_id)
        .fetch_one(&mut **tx)
        .await
}

#[async_trait]
impl ChatExt for DBClient {
    async fn get_chat(&self, chat_id: Uuid) -> Result<Option<Chat>, Error> {
        sqlx::query_as::<_, Chat>(r#"SELECT * FROM chats WHERE id = $1"#)
            .bind(chat_id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn get_mission_chat(&self, mission_id: Uuid) -> Result<Option<Chat>, Error> {
        sqlx::query_as::<_, Chat>(
            r#"SELECT * FROM chats WHERE mission_id = $1 AND chat_type = 'MISSION'"#,
        )
        .bind(mission_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn upsert_mission_chat(
        &self,
        mission_id: Uuid,
        client_id: Uuid,
        freelance_id: Option<Uuid>,
    ) -> Result<Chat, Error> {
        let mut tx = self.pool.begin().await?;
        let chat = upsert_mission_chat_tx(&mut tx, mission_id, client_id, freelance_id).await?;
        tx.commit().await?;
        Ok(chat)
    }

    async fn get_or_create_support_chat(&self, user_id: Uuid) -> Result<Chat, Error> {
        sqlx::query_as::<_, Chat>(
            r#"
            INSERT INTO chats (chat_type, user1_id)
            VALUES ('SUPPORT', $1)
            ON CONFLICT (user1_id) WHERE chat_type = 'SUPPORT'
            DO UPDATE SET user1_id = EXCLUDED.user1_id
            RETURNING *
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
    }

    async fn list_chats_for_user(&self, user_id: Uuid) -> Result<Vec<Chat>, Error> {
        sqlx::query_as::<_, Chat>(
            r#"
            SELECT * FROM chats
            WHERE (chat_type = 'MISSION' AND (user1_id = $1 OR user2_id = $1))
               OR (chat_type = 'SUPPORT' AND user1_id = $1)
            ORDER BY updated_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn list_support_chats(&self) -> Result<Vec<Chat>, Error> {
        sqlx::query_as::<_, Chat>(
            r#"SELECT * FROM chats WHERE chat_type = 'SUPPORT' ORDER BY updated_at DESC"#,
        )
        .fetch_all(&self.pool)
        .await
    }

    async fn send_message(
        &self,
        chat_id: Uuid,
        sender_id: Uuid,
        content: String,
        recipient: CounterSlot,
        support_agent: Option<Uuid>,
    ) -> Result<Message, Error> {
        let mut tx = self.pool.begin().await?;

        let message = sqlx::query_as::<_, Message>(
            r#"
            INSERT INTO messages (chat_id, sender_id, content)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(chat_id)
        .bind(sender_id)
        .bind(content)
        .fetch_one(&mut *tx)
        .await?;

        let column = recipient.column();
        let sql = format!(
            "UPDATE chats SET {column} = {column} + 1, updated_at = NOW(), \
             user2_id = COALESCE(user2_id, $2) WHERE id = $1"
        );
        sqlx::query(&sql)
            .bind(chat_id)
            .bind(support_agent)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(message)
    }

    async fn read_messages(
        &self,
        chat_id: Uuid,
        reader_id: Uuid,
        slot: CounterSlot,
    ) -> Result<Vec<Message>, Error> {
        let mut tx = self.pool.begin().await?;

        mark_read_tx(&mut tx, chat_id, reader_id, slot).await?;

        let messages = sqlx::query_as::<_, Message>(
            r#"SELECT * FROM messages WHERE chat_id = $1 ORDER BY created_at ASC"#,
        )
        .bind(chat_id)
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(messages)
    }

    async fn mark_chat_read(
        &self,
        chat_id: Uuid,
        reader_id: Uuid,
        slot: CounterSlot,
    ) -> Result<Chat, Error> {
        let mut tx = self.pool.begin().await?;
        let chat = mark_read_tx(&mut tx, chat_id, reader_id, slot).await?;
        tx.commit().await?;
        Ok(chat)
    }

    async fn list_messages(&self, chat_id: Uuid) -> Result<Vec<Message>, Error> {
        sqlx::query_as::<_, Message>(
            r#"SELECT * FROM messages WHERE chat_id = $1 ORDER BY created_at ASC"#,
        )
        .bind(chat_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn get_message(&self, message_id: Uuid) -> Result<Option<Message>, Error> {
        sqlx::query_as::<_, Message>(r#"SELECT * FROM messages WHERE id = $1"#)
            .bind(message_id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn delete_message(&self, message_id: Uuid) -> Result<bool, Error> {
        let result = sqlx::query(r#"DELETE FROM messages WHERE id = $1"#)
            .bind(message_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
