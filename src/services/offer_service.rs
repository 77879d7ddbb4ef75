use crate::domain::chat::{Conversation, MessageKind};
use crate::domain::listing::Listing;
use crate::domain::offer::{self, Offer, OfferStatus};
use crate::domain::user::User;
use crate::error::{AppError, Result};
use crate::services::notification_service::{
    self as fanout, NotificationService,
};
use crate::storage::DbPool;
use crate::storage::chat_repo::{ChatRepository, NewMessage};
use crate::storage::listing_repo::ListingRepository;
use crate::storage::offer_repo::OfferRepository;
use crate::storage::user_repo::UserRepository;
use rust_decimal::Decimal;
use sqlx::PgConnection;
use uuid::Uuid;

/// The offer negotiation workflow.
///
/// Every mutation runs the full chain (offer row, synthetic chat message,
/// notification record) in one transaction, so a crash mid-sequence cannot
/// leave an accepted offer without its chat trail. Push delivery happens
/// after commit and is best-effort.
#[derive(Clone, Debug)]
pub struct OfferService {
    pool: DbPool,
    offer_repo: OfferRepository,
    listing_repo: ListingRepository,
    chat_repo: ChatRepository,
    user_repo: UserRepository,
    notifier: NotificationService,
}

impl OfferService {
    #[must_use]
    pub fn new(
        pool: DbPool,
        offer_repo: OfferRepository,
        listing_repo: ListingRepository,
        chat_repo: ChatRepository,
        user_repo: UserRepository,
        notifier: NotificationService,
    ) -> Self {
        Self { pool, offer_repo, listing_repo, chat_repo, user_repo, notifier }
    }

    /// Creates a `Pending` offer on an available listing.
    ///
    /// # Errors
    /// Returns `AppError::Validation` for a non-positive price, an
    /// unavailable listing, a self-offer, or a duplicate pending offer.
    #[tracing::instrument(skip(self, message), fields(listing_id = %listing_id), err(level = "warn"))]
    pub async fn create(
        &self,
        actor_id: Uuid,
        listing_id: Uuid,
        price: Decimal,
        message: Option<String>,
    ) -> Result<Offer> {
        if price <= Decimal::ZERO {
            return Err(AppError::Validation("Offer price must be positive".into()));
        }

        let mut conn = self.pool.acquire().await?;
        let actor = self.require_user(&mut conn, actor_id).await?;
        let listing = self.listing_repo.find_by_id(&mut *conn, listing_id).await?.ok_or(AppError::NotFound)?;

        if listing.is_owned_by(actor_id) {
            return Err(AppError::Validation("You cannot make an offer on your own listing".into()));
        }
        if !listing.is_available() {
            return Err(AppError::Validation("Listing is not available".into()));
        }
        if self.offer_repo.has_pending(&mut *conn, listing_id, actor_id).await? {
            return Err(AppError::Validation("You already have a pending offer on this listing".into()));
        }
        drop(conn);

        let mut tx = self.pool.begin().await?;

        let offer = self.offer_repo.create(&mut *tx, listing_id, actor_id, price, message.as_deref()).await?;

        let conversation = self.ensure_conversation(&mut tx, &listing, actor_id).await?;
        self.chat_repo
            .append_message(
                &mut tx,
                &NewMessage {
                    conversation_id: conversation.id,
                    sender_id: actor_id,
                    content: offer::created_message(offer.price),
                    kind: MessageKind::Text,
                    offer_id: Some(offer.id),
                },
            )
            .await?;

        let notification =
            self.notifier.record(&mut tx, &fanout::compose_offer_created(&listing, &actor.nickname, &offer)).await?;

        tx.commit().await?;

        self.notifier.dispatch_push(&notification).await;

        tracing::info!(offer_id = %offer.id, "Offer created");
        Ok(offer)
    }

    /// Accepts a pending offer. Listing-owner only.
    ///
    /// Leaves the listing status untouched; marking it sold is the seller's
    /// separate, explicit action.
    #[tracing::instrument(skip(self), fields(offer_id = %offer_id), err(level = "warn"))]
    pub async fn accept(&self, actor_id: Uuid, offer_id: Uuid) -> Result<Offer> {
        self.transition(actor_id, offer_id, OfferStatus::Accepted).await
    }

    /// Rejects a pending offer. Listing-owner only.
    #[tracing::instrument(skip(self), fields(offer_id = %offer_id), err(level = "warn"))]
    pub async fn reject(&self, actor_id: Uuid, offer_id: Uuid) -> Result<Offer> {
        self.transition(actor_id, offer_id, OfferStatus::Rejected).await
    }

    /// Cancels a pending offer. Bidder only.
    #[tracing::instrument(skip(self), fields(offer_id = %offer_id), err(level = "warn"))]
    pub async fn cancel(&self, actor_id: Uuid, offer_id: Uuid) -> Result<Offer> {
        self.transition(actor_id, offer_id, OfferStatus::Cancelled).await
    }

    async fn transition(&self, actor_id: Uuid, offer_id: Uuid, to: OfferStatus) -> Result<Offer> {
        let mut tx = self.pool.begin().await?;

        let actor = self.require_user(&mut tx, actor_id).await?;
        let offer = self.offer_repo.find_by_id(&mut *tx, offer_id).await?.ok_or(AppError::NotFound)?;
        let listing =
            self.listing_repo.find_by_id(&mut *tx, offer.listing_id).await?.ok_or(AppError::NotFound)?;

        match to {
            OfferStatus::Accepted | OfferStatus::Rejected => {
                if !listing.is_owned_by(actor_id) {
                    return Err(AppError::Forbidden("Only the listing owner can respond to an offer".into()));
                }
            }
            OfferStatus::Cancelled => {
                if offer.offered_by != actor_id {
                    return Err(AppError::Forbidden("Only the bidder can cancel an offer".into()));
                }
            }
            OfferStatus::Pending => return Err(AppError::Internal),
        }

        // Compare-and-swap; a concurrent transition wins exactly once.
        let Some(updated) = self.offer_repo.transition(&mut *tx, offer_id, to).await? else {
            let current = self.offer_repo.find_by_id(&mut *tx, offer_id).await?.ok_or(AppError::NotFound)?;
            current.ensure_pending()?;
            return Err(AppError::InvalidState("Offer was modified concurrently".into()));
        };

        let conversation = self.ensure_conversation(&mut tx, &listing, updated.offered_by).await?;
        let content = match to {
            OfferStatus::Accepted => offer::accepted_message(updated.price),
            OfferStatus::Rejected => offer::rejected_message(updated.price),
            OfferStatus::Cancelled => offer::cancelled_message(updated.price),
            OfferStatus::Pending => return Err(AppError::Internal),
        };

        self.chat_repo
            .append_message(
                &mut tx,
                &NewMessage {
                    conversation_id: conversation.id,
                    sender_id: actor_id,
                    content,
                    kind: MessageKind::Text,
                    offer_id: Some(updated.id),
                },
            )
            .await?;

        let new_notification = match to {
            OfferStatus::Accepted => fanout::compose_offer_accepted(&listing, &updated),
            OfferStatus::Rejected => fanout::compose_offer_rejected(&listing, &updated),
            OfferStatus::Cancelled => fanout::compose_offer_cancelled(&listing, &actor.nickname, &updated),
            OfferStatus::Pending => return Err(AppError::Internal),
        };
        let notification = self.notifier.record(&mut tx, &new_notification).await?;

        tx.commit().await?;

        self.notifier.dispatch_push(&notification).await;

        tracing::info!(offer_id = %updated.id, status = ?updated.status, "Offer transitioned");
        Ok(updated)
    }

    /// Fetches an offer; only the bidder and the listing owner may see it.
    ///
    /// # Errors
    /// Returns `AppError::NotFound` for anyone else; invisible, not
    /// forbidden.
    pub async fn get(&self, actor_id: Uuid, offer_id: Uuid) -> Result<Offer> {
        let mut conn = self.pool.acquire().await?;
        let offer = self.offer_repo.find_by_id(&mut *conn, offer_id).await?.ok_or(AppError::NotFound)?;
        let listing =
            self.listing_repo.find_by_id(&mut *conn, offer.listing_id).await?.ok_or(AppError::NotFound)?;

        if offer.offered_by != actor_id && !listing.is_owned_by(actor_id) {
            return Err(AppError::NotFound);
        }

        Ok(offer)
    }

    pub async fn list_mine(&self, actor_id: Uuid) -> Result<Vec<Offer>> {
        self.offer_repo.list_by_bidder(&self.pool, actor_id).await
    }

    /// Offers on a listing; owner only.
    pub async fn list_for_listing(&self, actor_id: Uuid, listing_id: Uuid) -> Result<Vec<Offer>> {
        let mut conn = self.pool.acquire().await?;
        let listing = self.listing_repo.find_by_id(&mut *conn, listing_id).await?.ok_or(AppError::NotFound)?;

        if !listing.is_owned_by(actor_id) {
            return Err(AppError::Forbidden("Only the listing owner can list its offers".into()));
        }

        self.offer_repo.list_for_listing(&mut *conn, listing_id).await
    }

    async fn ensure_conversation(
        &self,
        conn: &mut PgConnection,
        listing: &Listing,
        buyer_id: Uuid,
    ) -> Result<Conversation> {
        if let Some(existing) = self.chat_repo.find_active(&mut *conn, listing.id, buyer_id).await? {
            return Ok(existing);
        }

        self.chat_repo.create_conversation(&mut *conn, listing.id, buyer_id, listing.seller_id).await
    }

    async fn require_user(&self, conn: &mut PgConnection, user_id: Uuid) -> Result<User> {
        self.user_repo.find_by_id(&mut *conn, user_id).await?.ok_or(AppError::AuthError)
    }
}
