use crate::domain::chat::{Conversation, Message, MessageKind};
use crate::domain::user::User;
use crate::error::{AppError, Result};
use crate::services::notification_service::{self as fanout, NotificationService};
use crate::storage::DbPool;
use crate::storage::chat_repo::{ChatRepository, NewMessage};
use crate::storage::listing_repo::ListingRepository;
use crate::storage::user_repo::UserRepository;
use sqlx::PgConnection;
use uuid::Uuid;

/// Buyer-to-seller threads, always anchored to a listing.
#[derive(Clone, Debug)]
pub struct ChatService {
    pool: DbPool,
    chat_repo: ChatRepository,
    listing_repo: ListingRepository,
    user_repo: UserRepository,
    notifier: NotificationService,
}

impl ChatService {
    #[must_use]
    pub fn new(
        pool: DbPool,
        chat_repo: ChatRepository,
        listing_repo: ListingRepository,
        user_repo: UserRepository,
        notifier: NotificationService,
    ) -> Self {
        Self { pool, chat_repo, listing_repo, user_repo, notifier }
    }

    /// Opens a conversation with a listing's seller, or returns the active
    /// one if it already exists.
    ///
    /// # Errors
    /// Returns `AppError::Validation` when the actor is the seller.
    #[tracing::instrument(skip(self), fields(listing_id = %listing_id), err(level = "warn"))]
    pub async fn start_conversation(&self, actor_id: Uuid, listing_id: Uuid) -> Result<Conversation> {
        let mut conn = self.pool.acquire().await?;
        self.require_user(&mut conn, actor_id).await?;
        let listing = self.listing_repo.find_by_id(&mut *conn, listing_id).await?.ok_or(AppError::NotFound)?;

        if listing.is_owned_by(actor_id) {
            return Err(AppError::Validation("You cannot start a conversation on your own listing".into()));
        }

        if let Some(existing) = self.chat_repo.find_active(&mut *conn, listing_id, actor_id).await? {
            return Ok(existing);
        }

        self.chat_repo.create_conversation(&mut *conn, listing_id, actor_id, listing.seller_id).await
    }

    pub async fn list(&self, actor_id: Uuid) -> Result<Vec<Conversation>> {
        self.chat_repo.list_for_user(&self.pool, actor_id).await
    }

    /// Messages in a thread, oldest first; participants only.
    pub async fn messages(&self, actor_id: Uuid, conversation_id: Uuid) -> Result<Vec<Message>> {
        let mut conn = self.pool.acquire().await?;
        let conversation = self.require_participant(&mut conn, actor_id, conversation_id).await?;
        self.chat_repo.messages(&mut *conn, conversation.id).await
    }

    /// Closes a thread; participants only. Archived threads reject new
    /// messages and drop out of listings.
    pub async fn archive(&self, actor_id: Uuid, conversation_id: Uuid) -> Result<()> {
        let mut conn = self.pool.acquire().await?;
        let conversation = self.require_participant(&mut conn, actor_id, conversation_id).await?;
        self.chat_repo.archive(&mut *conn, conversation.id).await
    }

    /// Sends a message and notifies the other participant. The message row
    /// and the notification record commit together; push follows after.
    #[tracing::instrument(skip(self, content), fields(conversation_id = %conversation_id), err(level = "warn"))]
    pub async fn send_message(
        &self,
        actor_id: Uuid,
        conversation_id: Uuid,
        content: String,
        kind: MessageKind,
    ) -> Result<Message> {
        if content.trim().is_empty() {
            return Err(AppError::Validation("Message content cannot be empty".into()));
        }

        let mut tx = self.pool.begin().await?;

        let sender = self.require_user(&mut tx, actor_id).await?;
        let conversation = self.require_participant(&mut tx, actor_id, conversation_id).await?;
        if !conversation.is_active {
            return Err(AppError::InvalidState("Conversation is archived".into()));
        }

        let message = self
            .chat_repo
            .append_message(
                &mut tx,
                &NewMessage { conversation_id, sender_id: actor_id, content, kind, offer_id: None },
            )
            .await?;

        let recipient = conversation.other_participant(actor_id);
        let notification = self
            .notifier
            .record(&mut tx, &fanout::compose_new_message(recipient, actor_id, &sender.nickname, message.id))
            .await?;

        tx.commit().await?;

        self.notifier.dispatch_push(&notification).await;

        Ok(message)
    }

    /// Marks a message read. Only the receiving side can ack; the sender's
    /// own messages are left alone.
    pub async fn mark_read(&self, actor_id: Uuid, message_id: Uuid) -> Result<()> {
        let mut conn = self.pool.acquire().await?;
        let message = self.chat_repo.find_message(&mut *conn, message_id).await?.ok_or(AppError::NotFound)?;
        self.require_participant(&mut conn, actor_id, message.conversation_id).await?;

        if message.sender_id == actor_id {
            return Err(AppError::Validation("You cannot mark your own message as read".into()));
        }

        self.chat_repo.mark_read(&mut *conn, message_id).await
    }

    /// Soft-deletes a message; sender only. The row stays, reads skip it.
    pub async fn delete_message(&self, actor_id: Uuid, message_id: Uuid) -> Result<()> {
        let mut conn = self.pool.acquire().await?;
        let message = self.chat_repo.find_message(&mut *conn, message_id).await?.ok_or(AppError::NotFound)?;

        if message.sender_id != actor_id {
            return Err(AppError::Forbidden("Only the sender can delete a message".into()));
        }

        self.chat_repo.soft_delete(&mut *conn, message_id).await
    }

    async fn require_participant(
        &self,
        conn: &mut PgConnection,
        actor_id: Uuid,
        conversation_id: Uuid,
    ) -> Result<Conversation> {
        let conversation =
            self.chat_repo.find_conversation(&mut *conn, conversation_id).await?.ok_or(AppError::NotFound)?;

        if !conversation.has_participant(actor_id) {
            return Err(AppError::Forbidden("You are not part of this conversation".into()));
        }

        Ok(conversation)
    }

    async fn require_user(&self, conn: &mut PgConnection, user_id: Uuid) -> Result<User> {
        self.user_repo.find_by_id(&mut *conn, user_id).await?.ok_or(AppError::AuthError)
    }
}
