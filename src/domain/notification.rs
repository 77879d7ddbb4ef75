use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "notification_kind", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Message,
    Offer,
    OfferAccepted,
    OfferRejected,
    OfferCancelled,
    Like,
    NewListing,
    ListingUpdated,
    ItemSold,
    Review,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "entity_kind", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Listing,
    Offer,
    Review,
    Message,
}

/// Strongly-typed reference to the entity that triggered a notification.
///
/// Stored as a (kind, id) column pair. A weak reference only: deleting the
/// referenced row does not cascade into notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityRef {
    Listing(Uuid),
    Offer(Uuid),
    Review(Uuid),
    Message(Uuid),
}

impl EntityRef {
    #[must_use]
    pub const fn kind(self) -> EntityKind {
        match self {
            Self::Listing(_) => EntityKind::Listing,
            Self::Offer(_) => EntityKind::Offer,
            Self::Review(_) => EntityKind::Review,
            Self::Message(_) => EntityKind::Message,
        }
    }

    #[must_use]
    pub const fn id(self) -> Uuid {
        match self {
            Self::Listing(id) | Self::Offer(id) | Self::Review(id) | Self::Message(id) => id,
        }
    }

    #[must_use]
    pub const fn from_parts(kind: EntityKind, id: Uuid) -> Self {
        match kind {
            EntityKind::Listing => Self::Listing(id),
            EntityKind::Offer => Self::Offer(id),
            EntityKind::Review => Self::Review(id),
            EntityKind::Message => Self::Message(id),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Notification {
    pub id: Uuid,
    pub recipient_id: Uuid,
    pub sender_id: Option<Uuid>,
    pub kind: NotificationKind,
    pub text: String,
    pub entity: Option<EntityRef>,
    pub is_read: bool,
    pub push_sent: bool,
    pub created_at: OffsetDateTime,
}

/// A notification about to be recorded; recipient and text already resolved.
#[derive(Debug, Clone)]
pub struct NewNotification {
    pub recipient_id: Uuid,
    pub sender_id: Option<Uuid>,
    pub kind: NotificationKind,
    pub text: String,
    pub entity: Option<EntityRef>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_ref_roundtrip() {
        let id = Uuid::new_v4();
        for entity in [
            EntityRef::Listing(id),
            EntityRef::Offer(id),
            EntityRef::Review(id),
            EntityRef::Message(id),
        ] {
            let rebuilt = EntityRef::from_parts(entity.kind(), entity.id());
            assert_eq!(rebuilt, entity);
        }
    }
}
