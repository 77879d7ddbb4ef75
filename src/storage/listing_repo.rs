use crate::domain::listing::{Condition, Listing, ListingStatus};
use crate::error::{AppError, Result};
use rust_decimal::Decimal;
use sqlx::{Executor, PgConnection, Postgres};
use uuid::Uuid;

const LISTING_COLUMNS: &str =
    "id, seller_id, title, slug, description, price, condition, location, status, created_at, updated_at";

#[derive(Debug, Clone)]
pub struct NewListing {
    pub title: String,
    pub slug: String,
    pub description: String,
    pub price: Decimal,
    pub condition: Condition,
    pub location: String,
}

/// Partial update; `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct ListingPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub condition: Option<Condition>,
    pub location: Option<String>,
    pub status: Option<ListingStatus>,
}

#[derive(Debug, Clone, Default)]
pub struct ListingSearch {
    pub title: Option<String>,
    pub condition: Option<Condition>,
    pub status: Option<ListingStatus>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub seller_id: Option<Uuid>,
    pub limit: i64,
    pub offset: i64,
}

#[derive(Clone, Debug, Default)]
pub struct ListingRepository {}

impl ListingRepository {
    #[must_use]
    pub const fn new() -> Self {
        Self {}
    }

    /// Inserts a listing.
    ///
    /// # Errors
    /// Returns `AppError::Validation` on a slug collision; the caller
    /// appends a unique suffix so this should not happen in practice.
    pub async fn create<'e, E>(&self, executor: E, seller_id: Uuid, new: &NewListing) -> Result<Listing>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let listing = sqlx::query_as::<_, Listing>(&format!(
            r#"
            INSERT INTO listings (seller_id, title, slug, description, price, condition, location)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {LISTING_COLUMNS}
            "#
        ))
        .bind(seller_id)
        .bind(&new.title)
        .bind(&new.slug)
        .bind(&new.description)
        .bind(new.price)
        .bind(new.condition)
        .bind(&new.location)
        .fetch_one(executor)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                AppError::Validation("A listing with this slug already exists".into())
            }
            _ => AppError::Database(e),
        })?;

        Ok(listing)
    }

    pub async fn find_by_id<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Listing>>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let listing =
            sqlx::query_as::<_, Listing>(&format!("SELECT {LISTING_COLUMNS} FROM listings WHERE id = $1"))
                .bind(id)
                .fetch_optional(executor)
                .await?;

        Ok(listing)
    }

    pub async fn find_by_slug<'e, E>(&self, executor: E, slug: &str) -> Result<Option<Listing>>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let listing =
            sqlx::query_as::<_, Listing>(&format!("SELECT {LISTING_COLUMNS} FROM listings WHERE slug = $1"))
                .bind(slug)
                .fetch_optional(executor)
                .await?;

        Ok(listing)
    }

    /// Applies a partial update and bumps `updated_at`. The slug is
    /// deliberately not updatable.
    pub async fn update<'e, E>(&self, executor: E, id: Uuid, patch: &ListingPatch) -> Result<Option<Listing>>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let listing = sqlx::query_as::<_, Listing>(&format!(
            r#"
            UPDATE listings
            SET title = COALESCE($2, title),
                description = COALESCE($3, description),
                price = COALESCE($4, price),
                condition = COALESCE($5, condition),
                location = COALESCE($6, location),
                status = COALESCE($7, status),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {LISTING_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&patch.title)
        .bind(&patch.description)
        .bind(patch.price)
        .bind(patch.condition)
        .bind(&patch.location)
        .bind(patch.status)
        .fetch_optional(executor)
        .await?;

        Ok(listing)
    }

    pub async fn delete<'e, E>(&self, executor: E, id: Uuid) -> Result<bool>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM listings WHERE id = $1").bind(id).execute(executor).await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn search<'e, E>(&self, executor: E, params: &ListingSearch) -> Result<Vec<Listing>>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let listings = sqlx::query_as::<_, Listing>(&format!(
            r#"
            SELECT {LISTING_COLUMNS}
            FROM listings
            WHERE ($1::text IS NULL OR title ILIKE '%' || $1 || '%')
              AND ($2::listing_condition IS NULL OR condition = $2)
              AND ($3::listing_status IS NULL OR status = $3)
              AND ($4::numeric IS NULL OR price >= $4)
              AND ($5::numeric IS NULL OR price <= $5)
              AND ($6::uuid IS NULL OR seller_id = $6)
            ORDER BY created_at DESC
            LIMIT $7 OFFSET $8
            "#
        ))
        .bind(&params.title)
        .bind(params.condition)
        .bind(params.status)
        .bind(params.min_price)
        .bind(params.max_price)
        .bind(params.seller_id)
        .bind(params.limit)
        .bind(params.offset)
        .fetch_all(executor)
        .await?;

        Ok(listings)
    }

    pub async fn add_images(&self, executor: &mut PgConnection, listing_id: Uuid, refs: &[String]) -> Result<()> {
        for (position, image_ref) in refs.iter().enumerate() {
            sqlx::query("INSERT INTO listing_images (listing_id, image_ref, position) VALUES ($1, $2, $3)")
                .bind(listing_id)
                .bind(image_ref)
                .bind(i32::try_from(position).unwrap_or(i32::MAX))
                .execute(&mut *executor)
                .await?;
        }
        Ok(())
    }

    pub async fn images<'e, E>(&self, executor: E, listing_id: Uuid) -> Result<Vec<String>>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let rows: Vec<(String,)> =
            sqlx::query_as("SELECT image_ref FROM listing_images WHERE listing_id = $1 ORDER BY position")
                .bind(listing_id)
                .fetch_all(executor)
                .await?;

        Ok(rows.into_iter().map(|(r,)| r).collect())
    }

    /// Records a like. Idempotent; returns whether a row was inserted.
    pub async fn like<'e, E>(&self, executor: E, user_id: Uuid, listing_id: Uuid) -> Result<bool>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result =
            sqlx::query("INSERT INTO likes (user_id, listing_id) VALUES ($1, $2) ON CONFLICT DO NOTHING")
                .bind(user_id)
                .bind(listing_id)
                .execute(executor)
                .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn unlike<'e, E>(&self, executor: E, user_id: Uuid, listing_id: Uuid) -> Result<bool>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM likes WHERE user_id = $1 AND listing_id = $2")
            .bind(user_id)
            .bind(listing_id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn likers_of<'e, E>(&self, executor: E, listing_id: Uuid) -> Result<Vec<Uuid>>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let rows: Vec<(Uuid,)> = sqlx::query_as("SELECT user_id FROM likes WHERE listing_id = $1")
            .bind(listing_id)
            .fetch_all(executor)
            .await?;

        Ok(rows.into_iter().map(|(id,)| id).collect())
    }
}
