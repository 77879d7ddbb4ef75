use crate::domain::offer::{Offer, OfferStatus};
use crate::error::{AppError, Result};
use rust_decimal::Decimal;
use sqlx::{Executor, Postgres};
use uuid::Uuid;

const OFFER_COLUMNS: &str = "id, listing_id, offered_by, price, status, message, created_at";

#[derive(Clone, Debug, Default)]
pub struct OfferRepository {}

impl OfferRepository {
    #[must_use]
    pub const fn new() -> Self {
        Self {}
    }

    /// Inserts a `Pending` offer.
    ///
    /// # Errors
    /// Returns `AppError::Validation` when the partial unique index rejects
    /// a second pending offer from the same bidder.
    pub async fn create<'e, E>(
        &self,
        executor: E,
        listing_id: Uuid,
        offered_by: Uuid,
        price: Decimal,
        message: Option<&str>,
    ) -> Result<Offer>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let offer = sqlx::query_as::<_, Offer>(&format!(
            r#"
            INSERT INTO offers (listing_id, offered_by, price, message)
            VALUES ($1, $2, $3, $4)
            RETURNING {OFFER_COLUMNS}
            "#
        ))
        .bind(listing_id)
        .bind(offered_by)
        .bind(price)
        .bind(message)
        .fetch_one(executor)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                AppError::Validation("You already have a pending offer on this listing".into())
            }
            _ => AppError::Database(e),
        })?;

        Ok(offer)
    }

    pub async fn find_by_id<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Offer>>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let offer = sqlx::query_as::<_, Offer>(&format!("SELECT {OFFER_COLUMNS} FROM offers WHERE id = $1"))
            .bind(id)
            .fetch_optional(executor)
            .await?;

        Ok(offer)
    }

    pub async fn has_pending<'e, E>(&self, executor: E, listing_id: Uuid, offered_by: Uuid) -> Result<bool>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let row: Option<(i32,)> = sqlx::query_as(
            "SELECT 1 FROM offers WHERE listing_id = $1 AND offered_by = $2 AND status = 'Pending' LIMIT 1",
        )
        .bind(listing_id)
        .bind(offered_by)
        .fetch_optional(executor)
        .await?;

        Ok(row.is_some())
    }

    /// Conditionally transitions an offer out of `Pending`.
    ///
    /// Compare-and-swap on the status column: under concurrent requests
    /// exactly one transition wins; the loser sees `None` and re-reads to
    /// report the right error.
    pub async fn transition<'e, E>(&self, executor: E, id: Uuid, to: OfferStatus) -> Result<Option<Offer>>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let offer = sqlx::query_as::<_, Offer>(&format!(
            r#"
            UPDATE offers
            SET status = $2
            WHERE id = $1 AND status = 'Pending'
            RETURNING {OFFER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(to)
        .fetch_optional(executor)
        .await?;

        Ok(offer)
    }

    pub async fn list_by_bidder<'e, E>(&self, executor: E, offered_by: Uuid) -> Result<Vec<Offer>>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let offers = sqlx::query_as::<_, Offer>(&format!(
            "SELECT {OFFER_COLUMNS} FROM offers WHERE offered_by = $1 ORDER BY created_at DESC"
        ))
        .bind(offered_by)
        .fetch_all(executor)
        .await?;

        Ok(offers)
    }

    pub async fn list_for_listing<'e, E>(&self, executor: E, listing_id: Uuid) -> Result<Vec<Offer>>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let offers = sqlx::query_as::<_, Offer>(&format!(
            "SELECT {OFFER_COLUMNS} FROM offers WHERE listing_id = $1 ORDER BY created_at DESC"
        ))
        .bind(listing_id)
        .fetch_all(executor)
        .await?;

        Ok(offers)
    }

    /// The most recent accepted offer; resolves the buyer when a listing is
    /// marked sold.
    pub async fn latest_accepted<'e, E>(&self, executor: E, listing_id: Uuid) -> Result<Option<Offer>>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let offer = sqlx::query_as::<_, Offer>(&format!(
            r#"
            SELECT {OFFER_COLUMNS}
            FROM offers
            WHERE listing_id = $1 AND status = 'Accepted'
            ORDER BY created_at DESC
            LIMIT 1
            "#
        ))
        .bind(listing_id)
        .fetch_optional(executor)
        .await?;

        Ok(offer)
    }
}
