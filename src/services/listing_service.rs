use crate::domain::listing::{Condition, Listing, ListingStatus, slugify};
use crate::domain::user::User;
use crate::error::{AppError, Result};
use crate::services::notification_service::{self as fanout, NotificationService};
use crate::storage::DbPool;
use crate::storage::listing_repo::{ListingPatch, ListingRepository, ListingSearch, NewListing};
use crate::storage::offer_repo::OfferRepository;
use crate::storage::user_repo::UserRepository;
use rust_decimal::Decimal;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct CreateListingInput {
    pub title: String,
    pub description: String,
    pub price: Decimal,
    pub condition: Condition,
    pub location: String,
    pub images: Vec<String>,
}

/// A listing plus its image references, as the API serves it.
#[derive(Debug, Clone)]
pub struct ListingWithImages {
    pub listing: Listing,
    pub images: Vec<String>,
}

#[derive(Clone, Debug)]
pub struct ListingService {
    pool: DbPool,
    listing_repo: ListingRepository,
    offer_repo: OfferRepository,
    user_repo: UserRepository,
    notifier: NotificationService,
}

impl ListingService {
    #[must_use]
    pub fn new(
        pool: DbPool,
        listing_repo: ListingRepository,
        offer_repo: OfferRepository,
        user_repo: UserRepository,
        notifier: NotificationService,
    ) -> Self {
        Self { pool, listing_repo, offer_repo, user_repo, notifier }
    }

    /// Creates a listing and fans out to the seller's followers.
    ///
    /// # Errors
    /// Returns `AppError::Validation` on an empty title or negative price.
    #[tracing::instrument(skip(self, input), fields(listing_id = tracing::field::Empty), err(level = "warn"))]
    pub async fn create(&self, actor_id: Uuid, input: CreateListingInput) -> Result<ListingWithImages> {
        let title = input.title.trim().to_string();
        if title.is_empty() || title.len() > 255 {
            return Err(AppError::Validation("Title must be 1-255 characters".into()));
        }
        if input.price < Decimal::ZERO {
            return Err(AppError::Validation("Price cannot be negative".into()));
        }

        let mut conn = self.pool.acquire().await?;
        let seller = self.require_user(&mut conn, actor_id).await?;
        drop(conn);

        // The slug never changes after this point; a short random suffix
        // keeps identical titles from colliding.
        let suffix = Uuid::new_v4().simple().to_string();
        let slug = format!("{}-{}", slugify(&title), &suffix[..8]);

        let new = NewListing {
            title,
            slug,
            description: input.description,
            price: input.price,
            condition: input.condition,
            location: input.location,
        };

        let mut tx = self.pool.begin().await?;
        let listing = self.listing_repo.create(&mut *tx, actor_id, &new).await?;
        self.listing_repo.add_images(&mut tx, listing.id, &input.images).await?;
        tx.commit().await?;

        tracing::Span::current().record("listing_id", tracing::field::display(listing.id));

        // New-listing fan-out to followers; each notify persists its row
        // and pushes best-effort.
        let followers = self.user_repo.followers_of(&self.pool, actor_id).await?;
        for follower_id in followers {
            let new_notification = fanout::compose_new_listing(&listing, &seller.nickname, follower_id);
            if let Err(e) = self.notifier.notify(new_notification).await {
                tracing::error!(error = %e, %follower_id, "Failed to notify follower of new listing");
            }
        }

        tracing::info!("Listing created");
        Ok(ListingWithImages { listing, images: input.images })
    }

    pub async fn get(&self, id: Uuid) -> Result<ListingWithImages> {
        let mut conn = self.pool.acquire().await?;
        let listing = self.listing_repo.find_by_id(&mut *conn, id).await?.ok_or(AppError::NotFound)?;
        let images = self.listing_repo.images(&mut *conn, id).await?;
        Ok(ListingWithImages { listing, images })
    }

    pub async fn get_by_slug(&self, slug: &str) -> Result<ListingWithImages> {
        let mut conn = self.pool.acquire().await?;
        let listing = self.listing_repo.find_by_slug(&mut *conn, slug).await?.ok_or(AppError::NotFound)?;
        let images = self.listing_repo.images(&mut *conn, listing.id).await?;
        Ok(ListingWithImages { listing, images })
    }

    /// Applies a partial update; owner only. Edits fan out to everyone who
    /// liked the listing, and marking it sold notifies the seller's side
    /// with the buyer resolved from the latest accepted offer.
    #[tracing::instrument(skip(self, patch), fields(listing_id = %id), err(level = "warn"))]
    pub async fn update(&self, actor_id: Uuid, id: Uuid, patch: ListingPatch) -> Result<ListingWithImages> {
        if let Some(price) = patch.price {
            if price < Decimal::ZERO {
                return Err(AppError::Validation("Price cannot be negative".into()));
            }
        }

        let mut conn = self.pool.acquire().await?;
        let seller = self.require_user(&mut conn, actor_id).await?;
        let before = self.listing_repo.find_by_id(&mut *conn, id).await?.ok_or(AppError::NotFound)?;

        if !before.is_owned_by(actor_id) {
            return Err(AppError::Forbidden("Only the seller can edit a listing".into()));
        }

        let updated = self.listing_repo.update(&mut *conn, id, &patch).await?.ok_or(AppError::NotFound)?;
        let images = self.listing_repo.images(&mut *conn, id).await?;
        drop(conn);

        let price_changed = updated.price != before.price;
        let became_sold =
            updated.status == ListingStatus::Sold && before.status != ListingStatus::Sold;

        let likers = self.listing_repo.likers_of(&self.pool, id).await?;
        for liker_id in likers {
            let Some(new_notification) =
                fanout::compose_listing_updated(&updated, &seller.nickname, liker_id, price_changed)
            else {
                continue;
            };
            if let Err(e) = self.notifier.notify(new_notification).await {
                tracing::error!(error = %e, %liker_id, "Failed to notify liker of listing update");
            }
        }

        if became_sold {
            self.notify_sold(&updated).await;
        }

        Ok(ListingWithImages { listing: updated, images })
    }

    /// Deletes a listing; owner only. Offers, messages and likes cascade.
    pub async fn delete(&self, actor_id: Uuid, id: Uuid) -> Result<()> {
        let mut conn = self.pool.acquire().await?;
        let listing = self.listing_repo.find_by_id(&mut *conn, id).await?.ok_or(AppError::NotFound)?;

        if !listing.is_owned_by(actor_id) {
            return Err(AppError::Forbidden("Only the seller can delete a listing".into()));
        }

        self.listing_repo.delete(&mut *conn, id).await?;
        Ok(())
    }

    pub async fn search(&self, params: ListingSearch) -> Result<Vec<Listing>> {
        self.listing_repo.search(&self.pool, &params).await
    }

    /// Likes a listing; idempotent. Notifies the seller unless the liker is
    /// the seller.
    #[tracing::instrument(skip(self), fields(listing_id = %listing_id), err(level = "warn"))]
    pub async fn like(&self, actor_id: Uuid, listing_id: Uuid) -> Result<()> {
        let mut conn = self.pool.acquire().await?;
        let liker = self.require_user(&mut conn, actor_id).await?;
        let listing = self.listing_repo.find_by_id(&mut *conn, listing_id).await?.ok_or(AppError::NotFound)?;

        let inserted = self.listing_repo.like(&mut *conn, actor_id, listing_id).await?;
        drop(conn);

        if inserted {
            if let Some(new_notification) = fanout::compose_listing_liked(&listing, actor_id, &liker.nickname) {
                if let Err(e) = self.notifier.notify(new_notification).await {
                    tracing::error!(error = %e, "Failed to notify seller of like");
                }
            }
        }

        Ok(())
    }

    pub async fn unlike(&self, actor_id: Uuid, listing_id: Uuid) -> Result<()> {
        self.listing_repo.unlike(&self.pool, actor_id, listing_id).await?;
        Ok(())
    }

    async fn notify_sold(&self, listing: &Listing) {
        let buyer = match self.offer_repo.latest_accepted(&self.pool, listing.id).await {
            Ok(Some(offer)) => offer.offered_by,
            Ok(None) => {
                tracing::debug!("Listing marked sold without an accepted offer; skipping sold fan-out");
                return;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to resolve buyer for sold listing");
                return;
            }
        };

        let buyer_nickname = match self.user_repo.profile_by_id(&self.pool, buyer).await {
            Ok(Some(profile)) => profile.nickname,
            _ => {
                tracing::error!("Failed to resolve buyer profile for sold listing");
                return;
            }
        };

        let new_notification = fanout::compose_item_sold(listing, buyer, &buyer_nickname);
        if let Err(e) = self.notifier.notify(new_notification).await {
            tracing::error!(error = %e, "Failed to record item-sold notification");
        }
    }

    async fn require_user(&self, conn: &mut sqlx::PgConnection, user_id: Uuid) -> Result<User> {
        self.user_repo.find_by_id(&mut *conn, user_id).await?.ok_or(AppError::AuthError)
    }
}
