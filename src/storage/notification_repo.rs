use crate::domain::notification::{EntityKind, EntityRef, NewNotification, Notification, NotificationKind};
use crate::error::Result;
use sqlx::{Executor, Postgres};
use time::OffsetDateTime;
use uuid::Uuid;

const NOTIFICATION_COLUMNS: &str =
    "id, recipient_id, sender_id, kind, text, entity_kind, entity_id, is_read, push_sent, created_at";

/// Row shape; the (kind, id) column pair folds back into [`EntityRef`].
#[derive(Debug, sqlx::FromRow)]
struct NotificationRecord {
    id: Uuid,
    recipient_id: Uuid,
    sender_id: Option<Uuid>,
    kind: NotificationKind,
    text: String,
    entity_kind: Option<EntityKind>,
    entity_id: Option<Uuid>,
    is_read: bool,
    push_sent: bool,
    created_at: OffsetDateTime,
}

impl From<NotificationRecord> for Notification {
    fn from(record: NotificationRecord) -> Self {
        let entity = match (record.entity_kind, record.entity_id) {
            (Some(kind), Some(id)) => Some(EntityRef::from_parts(kind, id)),
            _ => None,
        };

        Self {
            id: record.id,
            recipient_id: record.recipient_id,
            sender_id: record.sender_id,
            kind: record.kind,
            text: record.text,
            entity,
            is_read: record.is_read,
            push_sent: record.push_sent,
            created_at: record.created_at,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct NotificationRepository {}

impl NotificationRepository {
    #[must_use]
    pub const fn new() -> Self {
        Self {}
    }

    pub async fn insert<'e, E>(&self, executor: E, new: &NewNotification) -> Result<Notification>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let record = sqlx::query_as::<_, NotificationRecord>(&format!(
            r#"
            INSERT INTO notifications (recipient_id, sender_id, kind, text, entity_kind, entity_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {NOTIFICATION_COLUMNS}
            "#
        ))
        .bind(new.recipient_id)
        .bind(new.sender_id)
        .bind(new.kind)
        .bind(&new.text)
        .bind(new.entity.map(EntityRef::kind))
        .bind(new.entity.map(EntityRef::id))
        .fetch_one(executor)
        .await?;

        Ok(record.into())
    }

    pub async fn list_for_recipient<'e, E>(
        &self,
        executor: E,
        recipient_id: Uuid,
        unread_only: bool,
        limit: i64,
    ) -> Result<Vec<Notification>>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let records = sqlx::query_as::<_, NotificationRecord>(&format!(
            r#"
            SELECT {NOTIFICATION_COLUMNS}
            FROM notifications
            WHERE recipient_id = $1 AND (NOT $2 OR NOT is_read)
            ORDER BY created_at DESC
            LIMIT $3
            "#
        ))
        .bind(recipient_id)
        .bind(unread_only)
        .bind(limit)
        .fetch_all(executor)
        .await?;

        Ok(records.into_iter().map(Into::into).collect())
    }

    pub async fn unread_count<'e, E>(&self, executor: E, recipient_id: Uuid) -> Result<i64>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM notifications WHERE recipient_id = $1 AND NOT is_read")
                .bind(recipient_id)
                .fetch_one(executor)
                .await?;

        Ok(count)
    }

    /// Marks one notification read; scoped to the recipient so users cannot
    /// touch each other's rows. Returns whether a row changed.
    pub async fn mark_read<'e, E>(&self, executor: E, id: Uuid, recipient_id: Uuid) -> Result<bool>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("UPDATE notifications SET is_read = TRUE WHERE id = $1 AND recipient_id = $2")
            .bind(id)
            .bind(recipient_id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn mark_all_read<'e, E>(&self, executor: E, recipient_id: Uuid) -> Result<u64>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("UPDATE notifications SET is_read = TRUE WHERE recipient_id = $1 AND NOT is_read")
            .bind(recipient_id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected())
    }

    pub async fn mark_push_sent<'e, E>(&self, executor: E, id: Uuid) -> Result<()>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("UPDATE notifications SET push_sent = TRUE WHERE id = $1").bind(id).execute(executor).await?;
        Ok(())
    }
}
