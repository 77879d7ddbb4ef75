use crate::domain::review::Review;
use crate::error::Result;
use sqlx::{Executor, Postgres};
use uuid::Uuid;

const REVIEW_COLUMNS: &str = "id, reviewer_id, reviewed_user_id, listing_id, rating, review_text, created_at";

#[derive(Clone, Debug, Default)]
pub struct ReviewRepository {}

impl ReviewRepository {
    #[must_use]
    pub const fn new() -> Self {
        Self {}
    }

    pub async fn create<'e, E>(
        &self,
        executor: E,
        reviewer_id: Uuid,
        reviewed_user_id: Uuid,
        listing_id: Uuid,
        rating: i16,
        review_text: Option<&str>,
    ) -> Result<Review>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let review = sqlx::query_as::<_, Review>(&format!(
            r#"
            INSERT INTO reviews (reviewer_id, reviewed_user_id, listing_id, rating, review_text)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {REVIEW_COLUMNS}
            "#
        ))
        .bind(reviewer_id)
        .bind(reviewed_user_id)
        .bind(listing_id)
        .bind(rating)
        .bind(review_text)
        .fetch_one(executor)
        .await?;

        Ok(review)
    }

    pub async fn find_by_id<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Review>>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let review = sqlx::query_as::<_, Review>(&format!("SELECT {REVIEW_COLUMNS} FROM reviews WHERE id = $1"))
            .bind(id)
            .fetch_optional(executor)
            .await?;

        Ok(review)
    }

    pub async fn list_for_user<'e, E>(&self, executor: E, reviewed_user_id: Uuid) -> Result<Vec<Review>>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let reviews = sqlx::query_as::<_, Review>(&format!(
            "SELECT {REVIEW_COLUMNS} FROM reviews WHERE reviewed_user_id = $1 ORDER BY created_at DESC"
        ))
        .bind(reviewed_user_id)
        .fetch_all(executor)
        .await?;

        Ok(reviews)
    }

    pub async fn list_for_listing<'e, E>(&self, executor: E, listing_id: Uuid) -> Result<Vec<Review>>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let reviews = sqlx::query_as::<_, Review>(&format!(
            "SELECT {REVIEW_COLUMNS} FROM reviews WHERE listing_id = $1 ORDER BY created_at DESC"
        ))
        .bind(listing_id)
        .fetch_all(executor)
        .await?;

        Ok(reviews)
    }
}
