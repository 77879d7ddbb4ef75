use crate::domain::listing::Listing;
use crate::domain::notification::{EntityRef, NewNotification, Notification, NotificationKind};
use crate::domain::offer::{Offer, format_price};
use crate::domain::review::Review;
use crate::error::Result;
use crate::services::push::{PushPayload, PushProvider};
use crate::storage::DbPool;
use crate::storage::device_token_repo::DeviceTokenRepository;
use crate::storage::notification_repo::NotificationRepository;
use serde_json::json;
use sqlx::PgConnection;
use std::sync::Arc;
use uuid::Uuid;

/// Persists recipient-addressed notification records and attempts
/// best-effort push delivery.
///
/// The row insert is the durable part of the contract; push failures are
/// logged and swallowed, `push_sent` records actual delivery only.
#[derive(Clone, Debug)]
pub struct NotificationService {
    pool: DbPool,
    repo: NotificationRepository,
    token_repo: DeviceTokenRepository,
    provider: Arc<dyn PushProvider>,
}

impl NotificationService {
    #[must_use]
    pub fn new(
        pool: DbPool,
        repo: NotificationRepository,
        token_repo: DeviceTokenRepository,
        provider: Arc<dyn PushProvider>,
    ) -> Self {
        Self { pool, repo, token_repo, provider }
    }

    /// Inserts the notification row on the caller's connection, so command
    /// handlers can commit it atomically with their own mutations.
    pub async fn record(&self, conn: &mut PgConnection, new: &NewNotification) -> Result<Notification> {
        self.repo.insert(&mut *conn, new).await
    }

    /// Persists and then attempts push delivery. For callers without their
    /// own transaction.
    pub async fn notify(&self, new: NewNotification) -> Result<Notification> {
        let notification = self.repo.insert(&self.pool, &new).await?;
        self.dispatch_push(&notification).await;
        Ok(notification)
    }

    /// Best-effort push for an already-persisted notification. Never fails;
    /// a transport error is a server-side log line and nothing more.
    #[tracing::instrument(skip(self, notification), fields(notification_id = %notification.id, recipient_id = %notification.recipient_id))]
    pub async fn dispatch_push(&self, notification: &Notification) {
        let tokens = match self.token_repo.active_tokens(&self.pool, notification.recipient_id).await {
            Ok(tokens) => tokens,
            Err(e) => {
                tracing::error!(error = %e, "Failed to load device tokens for push");
                return;
            }
        };

        if tokens.is_empty() {
            tracing::debug!("Recipient has no active device tokens");
            return;
        }

        let payload = push_payload(notification);

        match self.provider.send(&tokens, &payload).await {
            Ok(0) => {
                tracing::debug!("Push delivery reported zero successes");
            }
            Ok(delivered) => {
                tracing::debug!(delivered, "Push delivered");
                if let Err(e) = self.repo.mark_push_sent(&self.pool, notification.id).await {
                    tracing::error!(error = %e, "Failed to record push_sent flag");
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Push delivery failed");
            }
        }
    }

    // --- Read/ack surface ---

    pub async fn list(&self, recipient_id: Uuid, unread_only: bool, limit: i64) -> Result<Vec<Notification>> {
        self.repo.list_for_recipient(&self.pool, recipient_id, unread_only, limit).await
    }

    pub async fn unread_count(&self, recipient_id: Uuid) -> Result<i64> {
        self.repo.unread_count(&self.pool, recipient_id).await
    }

    pub async fn mark_read(&self, id: Uuid, recipient_id: Uuid) -> Result<bool> {
        self.repo.mark_read(&self.pool, id, recipient_id).await
    }

    pub async fn mark_all_read(&self, recipient_id: Uuid) -> Result<u64> {
        self.repo.mark_all_read(&self.pool, recipient_id).await
    }

    pub async fn register_device(&self, user_id: Uuid, token: &str) -> Result<()> {
        self.token_repo.upsert(&self.pool, user_id, token).await
    }

    pub async fn unregister_device(&self, user_id: Uuid, token: &str) -> Result<bool> {
        self.token_repo.deactivate(&self.pool, user_id, token).await
    }
}

fn push_payload(notification: &Notification) -> PushPayload {
    let title = match notification.kind {
        NotificationKind::Message => "New message",
        NotificationKind::Offer => "New offer",
        NotificationKind::OfferAccepted => "Offer accepted",
        NotificationKind::OfferRejected => "Offer rejected",
        NotificationKind::OfferCancelled => "Offer cancelled",
        NotificationKind::Like => "New like",
        NotificationKind::NewListing => "New listing",
        NotificationKind::ListingUpdated => "Listing updated",
        NotificationKind::ItemSold => "Item sold",
        NotificationKind::Review => "New review",
    };

    let data = notification.entity.map_or_else(
        || json!({ "kind": notification.kind }),
        |entity| json!({ "kind": notification.kind, "entity_kind": entity.kind(), "entity_id": entity.id() }),
    );

    PushPayload { title: title.to_string(), body: notification.text.clone(), data }
}

// --- Composers ---
//
// Pure functions that resolve the recipient and synthesize the text for
// each domain event. The command services call these and hand the result
// to `record`/`notify`, keeping the causal chain explicit.

#[must_use]
pub fn compose_offer_created(listing: &Listing, bidder_nickname: &str, offer: &Offer) -> NewNotification {
    NewNotification {
        recipient_id: listing.seller_id,
        sender_id: Some(offer.offered_by),
        kind: NotificationKind::Offer,
        text: format!(
            "{bidder_nickname} made an offer of ${} on your listing: {}",
            format_price(offer.price),
            listing.title
        ),
        entity: Some(EntityRef::Offer(offer.id)),
    }
}

#[must_use]
pub fn compose_offer_accepted(listing: &Listing, offer: &Offer) -> NewNotification {
    NewNotification {
        recipient_id: offer.offered_by,
        sender_id: Some(listing.seller_id),
        kind: NotificationKind::OfferAccepted,
        text: format!(
            "Your offer of ${} for {} has been accepted!",
            format_price(offer.price),
            listing.title
        ),
        entity: Some(EntityRef::Offer(offer.id)),
    }
}

#[must_use]
pub fn compose_offer_rejected(listing: &Listing, offer: &Offer) -> NewNotification {
    NewNotification {
        recipient_id: offer.offered_by,
        sender_id: Some(listing.seller_id),
        kind: NotificationKind::OfferRejected,
        text: format!(
            "Your offer of ${} for {} has been rejected",
            format_price(offer.price),
            listing.title
        ),
        entity: Some(EntityRef::Offer(offer.id)),
    }
}

#[must_use]
pub fn compose_offer_cancelled(listing: &Listing, bidder_nickname: &str, offer: &Offer) -> NewNotification {
    NewNotification {
        recipient_id: listing.seller_id,
        sender_id: Some(offer.offered_by),
        kind: NotificationKind::OfferCancelled,
        text: format!(
            "{bidder_nickname} cancelled their offer of ${} on {}",
            format_price(offer.price),
            listing.title
        ),
        entity: Some(EntityRef::Offer(offer.id)),
    }
}

#[must_use]
pub fn compose_new_message(
    recipient_id: Uuid,
    sender_id: Uuid,
    sender_nickname: &str,
    message_id: Uuid,
) -> NewNotification {
    NewNotification {
        recipient_id,
        sender_id: Some(sender_id),
        kind: NotificationKind::Message,
        text: format!("You have a new message from {sender_nickname}"),
        entity: Some(EntityRef::Message(message_id)),
    }
}

/// `None` when the liker is the seller: no self-notification.
#[must_use]
pub fn compose_listing_liked(listing: &Listing, liker_id: Uuid, liker_nickname: &str) -> Option<NewNotification> {
    if listing.seller_id == liker_id {
        return None;
    }

    Some(NewNotification {
        recipient_id: listing.seller_id,
        sender_id: Some(liker_id),
        kind: NotificationKind::Like,
        text: format!("{liker_nickname} liked your listing: {}", listing.title),
        entity: Some(EntityRef::Listing(listing.id)),
    })
}

#[must_use]
pub fn compose_new_listing(listing: &Listing, seller_nickname: &str, follower_id: Uuid) -> NewNotification {
    NewNotification {
        recipient_id: follower_id,
        sender_id: Some(listing.seller_id),
        kind: NotificationKind::NewListing,
        text: format!("{seller_nickname} has listed a new item: {}", listing.title),
        entity: Some(EntityRef::Listing(listing.id)),
    }
}

/// Fan-out target is a user who liked the listing; sellers never notify
/// themselves about their own edits.
#[must_use]
pub fn compose_listing_updated(
    listing: &Listing,
    seller_nickname: &str,
    liker_id: Uuid,
    price_changed: bool,
) -> Option<NewNotification> {
    if liker_id == listing.seller_id {
        return None;
    }

    let text = if price_changed {
        format!("The price of {} is now ${}", listing.title, format_price(listing.price))
    } else {
        format!("{seller_nickname} updated the listing: {}", listing.title)
    };

    Some(NewNotification {
        recipient_id: liker_id,
        sender_id: Some(listing.seller_id),
        kind: NotificationKind::ListingUpdated,
        text,
        entity: Some(EntityRef::Listing(listing.id)),
    })
}

#[must_use]
pub fn compose_item_sold(listing: &Listing, buyer_id: Uuid, buyer_nickname: &str) -> NewNotification {
    NewNotification {
        recipient_id: listing.seller_id,
        sender_id: Some(buyer_id),
        kind: NotificationKind::ItemSold,
        text: format!("Your listing {} has been sold to {buyer_nickname}", listing.title),
        entity: Some(EntityRef::Listing(listing.id)),
    }
}

#[must_use]
pub fn compose_review(review: &Review, reviewer_nickname: &str) -> NewNotification {
    NewNotification {
        recipient_id: review.reviewed_user_id,
        sender_id: Some(review.reviewer_id),
        kind: NotificationKind::Review,
        text: format!("{reviewer_nickname} left you a {}-star review", review.rating),
        entity: Some(EntityRef::Review(review.id)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::listing::{Condition, ListingStatus};
    use crate::domain::offer::OfferStatus;
    use time::OffsetDateTime;

    fn listing(seller_id: Uuid) -> Listing {
        Listing {
            id: Uuid::new_v4(),
            seller_id,
            title: "Vintage Camera".to_string(),
            slug: "vintage-camera-1a2b3c4d".to_string(),
            description: "Works great".to_string(),
            price: "120.00".parse().unwrap(),
            condition: Condition::LightlyUsed,
            location: "Berlin".to_string(),
            status: ListingStatus::Available,
            created_at: OffsetDateTime::now_utc(),
            updated_at: OffsetDateTime::now_utc(),
        }
    }

    fn offer(listing_id: Uuid, offered_by: Uuid, price: &str) -> Offer {
        Offer {
            id: Uuid::new_v4(),
            listing_id,
            offered_by,
            price: price.parse().unwrap(),
            status: OfferStatus::Pending,
            message: None,
            created_at: OffsetDateTime::now_utc(),
        }
    }

    #[test]
    fn test_offer_created_goes_to_seller() {
        let seller = Uuid::new_v4();
        let bidder = Uuid::new_v4();
        let listing = listing(seller);
        let offer = offer(listing.id, bidder, "150.00");

        let n = compose_offer_created(&listing, "alice", &offer);
        assert_eq!(n.recipient_id, seller);
        assert_eq!(n.sender_id, Some(bidder));
        assert!(n.text.contains("150.00"));
        assert!(n.text.contains("alice"));
        assert_eq!(n.entity, Some(EntityRef::Offer(offer.id)));
    }

    #[test]
    fn test_offer_transitions_go_to_bidder() {
        let seller = Uuid::new_v4();
        let bidder = Uuid::new_v4();
        let listing = listing(seller);
        let offer = offer(listing.id, bidder, "99.99");

        let accepted = compose_offer_accepted(&listing, &offer);
        assert_eq!(accepted.recipient_id, bidder);
        assert!(accepted.text.contains("accepted"));

        let rejected = compose_offer_rejected(&listing, &offer);
        assert_eq!(rejected.recipient_id, bidder);
        assert!(rejected.text.contains("rejected"));
    }

    #[test]
    fn test_offer_cancelled_goes_to_seller() {
        let seller = Uuid::new_v4();
        let bidder = Uuid::new_v4();
        let listing = listing(seller);
        let offer = offer(listing.id, bidder, "75.50");

        let n = compose_offer_cancelled(&listing, "bob", &offer);
        assert_eq!(n.recipient_id, seller);
        assert!(n.text.contains("75.50"));
    }

    #[test]
    fn test_self_like_produces_nothing() {
        let seller = Uuid::new_v4();
        let listing = listing(seller);

        assert!(compose_listing_liked(&listing, seller, "self").is_none());
        assert!(compose_listing_liked(&listing, Uuid::new_v4(), "carol").is_some());
    }

    #[test]
    fn test_listing_updated_skips_seller_and_reports_price() {
        let seller = Uuid::new_v4();
        let liker = Uuid::new_v4();
        let listing = listing(seller);

        assert!(compose_listing_updated(&listing, "dave", seller, true).is_none());

        let n = compose_listing_updated(&listing, "dave", liker, true).unwrap();
        assert_eq!(n.recipient_id, liker);
        assert!(n.text.contains("120.00"));

        let n = compose_listing_updated(&listing, "dave", liker, false).unwrap();
        assert!(n.text.contains("updated"));
    }

    #[test]
    fn test_item_sold_goes_to_seller() {
        let seller = Uuid::new_v4();
        let buyer = Uuid::new_v4();
        let listing = listing(seller);

        let n = compose_item_sold(&listing, buyer, "erin");
        assert_eq!(n.recipient_id, seller);
        assert_eq!(n.sender_id, Some(buyer));
        assert!(n.text.contains("erin"));
    }

    #[test]
    fn test_review_goes_to_reviewed_user() {
        let review = Review {
            id: Uuid::new_v4(),
            reviewer_id: Uuid::new_v4(),
            reviewed_user_id: Uuid::new_v4(),
            listing_id: Uuid::new_v4(),
            rating: 4,
            review_text: None,
            created_at: OffsetDateTime::now_utc(),
        };

        let n = compose_review(&review, "frank");
        assert_eq!(n.recipient_id, review.reviewed_user_id);
        assert!(n.text.contains("4-star"));
    }

    #[test]
    fn test_push_payload_carries_entity() {
        let id = Uuid::new_v4();
        let notification = Notification {
            id: Uuid::new_v4(),
            recipient_id: Uuid::new_v4(),
            sender_id: None,
            kind: NotificationKind::Offer,
            text: "something happened".to_string(),
            entity: Some(EntityRef::Offer(id)),
            is_read: false,
            push_sent: false,
            created_at: OffsetDateTime::now_utc(),
        };

        let payload = push_payload(&notification);
        assert_eq!(payload.title, "New offer");
        assert_eq!(payload.body, "something happened");
        assert_eq!(payload.data["entity_id"], serde_json::json!(id));
    }
}
