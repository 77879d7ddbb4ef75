use crate::domain::notification::{EntityKind, Notification, NotificationKind};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub unread: bool,
    pub limit: Option<i64>,
}

#[derive(Deserialize)]
pub struct DeviceToken {
    pub token: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityRefResponse {
    pub kind: EntityKind,
    pub id: Uuid,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationResponse {
    pub id: Uuid,
    pub sender_id: Option<Uuid>,
    pub kind: NotificationKind,
    pub text: String,
    pub entity: Option<EntityRefResponse>,
    pub is_read: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<Notification> for NotificationResponse {
    fn from(n: Notification) -> Self {
        Self {
            id: n.id,
            sender_id: n.sender_id,
            kind: n.kind,
            text: n.text,
            entity: n.entity.map(|e| EntityRefResponse { kind: e.kind(), id: e.id() }),
            is_read: n.is_read,
            created_at: n.created_at,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnreadCount {
    pub unread: i64,
}
