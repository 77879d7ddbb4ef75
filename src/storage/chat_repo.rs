use crate::domain::chat::{Conversation, Message, MessageKind};
use crate::error::Result;
use sqlx::{Executor, PgConnection, Postgres};
use uuid::Uuid;

const CONVERSATION_COLUMNS: &str = "id, listing_id, buyer_id, seller_id, is_active, created_at, updated_at";
const MESSAGE_COLUMNS: &str =
    "id, conversation_id, sender_id, content, kind, offer_id, is_read, is_deleted, deleted_at, created_at";

#[derive(Debug, Clone)]
pub struct NewMessage {
    pub conversation_id: Uuid,
    pub sender_id: Uuid,
    pub content: String,
    pub kind: MessageKind,
    pub offer_id: Option<Uuid>,
}

#[derive(Clone, Debug, Default)]
pub struct ChatRepository {}

impl ChatRepository {
    #[must_use]
    pub const fn new() -> Self {
        Self {}
    }

    pub async fn create_conversation<'e, E>(
        &self,
        executor: E,
        listing_id: Uuid,
        buyer_id: Uuid,
        seller_id: Uuid,
    ) -> Result<Conversation>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let conversation = sqlx::query_as::<_, Conversation>(&format!(
            r#"
            INSERT INTO conversations (listing_id, buyer_id, seller_id)
            VALUES ($1, $2, $3)
            RETURNING {CONVERSATION_COLUMNS}
            "#
        ))
        .bind(listing_id)
        .bind(buyer_id)
        .bind(seller_id)
        .fetch_one(executor)
        .await?;

        Ok(conversation)
    }

    pub async fn find_conversation<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Conversation>>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let conversation = sqlx::query_as::<_, Conversation>(&format!(
            "SELECT {CONVERSATION_COLUMNS} FROM conversations WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(executor)
        .await?;

        Ok(conversation)
    }

    /// The active thread between a buyer and the listing's seller, if any.
    pub async fn find_active<'e, E>(&self, executor: E, listing_id: Uuid, buyer_id: Uuid) -> Result<Option<Conversation>>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let conversation = sqlx::query_as::<_, Conversation>(&format!(
            r#"
            SELECT {CONVERSATION_COLUMNS}
            FROM conversations
            WHERE listing_id = $1 AND buyer_id = $2 AND is_active
            "#
        ))
        .bind(listing_id)
        .bind(buyer_id)
        .fetch_optional(executor)
        .await?;

        Ok(conversation)
    }

    pub async fn list_for_user<'e, E>(&self, executor: E, user_id: Uuid) -> Result<Vec<Conversation>>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let conversations = sqlx::query_as::<_, Conversation>(&format!(
            r#"
            SELECT {CONVERSATION_COLUMNS}
            FROM conversations
            WHERE (buyer_id = $1 OR seller_id = $1) AND is_active
            ORDER BY updated_at DESC
            "#
        ))
        .bind(user_id)
        .fetch_all(executor)
        .await?;

        Ok(conversations)
    }

    pub async fn archive<'e, E>(&self, executor: E, id: Uuid) -> Result<()>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("UPDATE conversations SET is_active = FALSE, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;

        Ok(())
    }

    /// Appends a message and bumps the conversation's `updated_at`, so
    /// thread lists sort by latest activity.
    pub async fn append_message(&self, executor: &mut PgConnection, new: &NewMessage) -> Result<Message> {
        let message = sqlx::query_as::<_, Message>(&format!(
            r#"
            INSERT INTO messages (conversation_id, sender_id, content, kind, offer_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {MESSAGE_COLUMNS}
            "#
        ))
        .bind(new.conversation_id)
        .bind(new.sender_id)
        .bind(&new.content)
        .bind(new.kind)
        .bind(new.offer_id)
        .fetch_one(&mut *executor)
        .await?;

        sqlx::query("UPDATE conversations SET updated_at = NOW() WHERE id = $1")
            .bind(new.conversation_id)
            .execute(&mut *executor)
            .await?;

        Ok(message)
    }

    pub async fn find_message<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Message>>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let message =
            sqlx::query_as::<_, Message>(&format!("SELECT {MESSAGE_COLUMNS} FROM messages WHERE id = $1"))
                .bind(id)
                .fetch_optional(executor)
                .await?;

        Ok(message)
    }

    /// Messages in creation order; soft-deleted rows are excluded from
    /// reads but stay in storage.
    pub async fn messages<'e, E>(&self, executor: E, conversation_id: Uuid) -> Result<Vec<Message>>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let messages = sqlx::query_as::<_, Message>(&format!(
            r#"
            SELECT {MESSAGE_COLUMNS}
            FROM messages
            WHERE conversation_id = $1 AND NOT is_deleted
            ORDER BY created_at ASC
            "#
        ))
        .bind(conversation_id)
        .fetch_all(executor)
        .await?;

        Ok(messages)
    }

    pub async fn mark_read<'e, E>(&self, executor: E, message_id: Uuid) -> Result<()>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("UPDATE messages SET is_read = TRUE WHERE id = $1")
            .bind(message_id)
            .execute(executor)
            .await?;

        Ok(())
    }

    pub async fn soft_delete<'e, E>(&self, executor: E, message_id: Uuid) -> Result<()>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("UPDATE messages SET is_deleted = TRUE, deleted_at = NOW() WHERE id = $1")
            .bind(message_id)
            .execute(executor)
            .await?;

        Ok(())
    }
}
