use crate::domain::chat::MessageKind;
use crate::domain::review::{Review, validate_rating};
use crate::domain::user::User;
use crate::error::{AppError, Result};
use crate::services::notification_service::{self as fanout, NotificationService};
use crate::storage::DbPool;
use crate::storage::chat_repo::{ChatRepository, NewMessage};
use crate::storage::listing_repo::ListingRepository;
use crate::storage::review_repo::ReviewRepository;
use crate::storage::user_repo::UserRepository;
use sqlx::PgConnection;
use uuid::Uuid;

#[derive(Clone, Debug)]
pub struct ReviewService {
    pool: DbPool,
    review_repo: ReviewRepository,
    listing_repo: ListingRepository,
    chat_repo: ChatRepository,
    user_repo: UserRepository,
    notifier: NotificationService,
}

impl ReviewService {
    #[must_use]
    pub fn new(
        pool: DbPool,
        review_repo: ReviewRepository,
        listing_repo: ListingRepository,
        chat_repo: ChatRepository,
        user_repo: UserRepository,
        notifier: NotificationService,
    ) -> Self {
        Self { pool, review_repo, listing_repo, chat_repo, user_repo, notifier }
    }

    /// Leaves a review on a listing; the reviewed user is always the
    /// seller. If the reviewer has an active conversation on the listing, a
    /// synthetic message announces the review there too.
    ///
    /// # Errors
    /// Returns `AppError::Validation` for an out-of-range rating or a
    /// self-review.
    #[tracing::instrument(skip(self, review_text), fields(listing_id = %listing_id), err(level = "warn"))]
    pub async fn create(
        &self,
        actor_id: Uuid,
        listing_id: Uuid,
        rating: i16,
        review_text: Option<String>,
    ) -> Result<Review> {
        validate_rating(rating)?;

        let mut tx = self.pool.begin().await?;

        let reviewer = self.require_user(&mut tx, actor_id).await?;
        let listing = self.listing_repo.find_by_id(&mut *tx, listing_id).await?.ok_or(AppError::NotFound)?;

        if listing.is_owned_by(actor_id) {
            return Err(AppError::Validation("You cannot review your own listing".into()));
        }

        let review = self
            .review_repo
            .create(&mut *tx, actor_id, listing.seller_id, listing_id, rating, review_text.as_deref())
            .await?;

        if let Some(conversation) = self.chat_repo.find_active(&mut *tx, listing_id, actor_id).await? {
            self.chat_repo
                .append_message(
                    &mut tx,
                    &NewMessage {
                        conversation_id: conversation.id,
                        sender_id: actor_id,
                        content: format!("Left a {rating}-star review"),
                        kind: MessageKind::Text,
                        offer_id: None,
                    },
                )
                .await?;
        }

        let notification =
            self.notifier.record(&mut tx, &fanout::compose_review(&review, &reviewer.nickname)).await?;

        tx.commit().await?;

        self.notifier.dispatch_push(&notification).await;

        tracing::info!(review_id = %review.id, "Review created");
        Ok(review)
    }

    pub async fn list_for_user(&self, reviewed_user_id: Uuid) -> Result<Vec<Review>> {
        self.review_repo.list_for_user(&self.pool, reviewed_user_id).await
    }

    pub async fn list_for_listing(&self, listing_id: Uuid) -> Result<Vec<Review>> {
        self.review_repo.list_for_listing(&self.pool, listing_id).await
    }

    async fn require_user(&self, conn: &mut PgConnection, user_id: Uuid) -> Result<User> {
        self.user_repo.find_by_id(&mut *conn, user_id).await?.ok_or(AppError::AuthError)
    }
}
