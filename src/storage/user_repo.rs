use crate::domain::user::{Profile, User};
use crate::error::{AppError, Result};
use sqlx::{Executor, Postgres};
use uuid::Uuid;

#[derive(Clone, Debug, Default)]
pub struct UserRepository {}

impl UserRepository {
    #[must_use]
    pub const fn new() -> Self {
        Self {}
    }

    /// Inserts a new user.
    ///
    /// # Errors
    /// Returns `AppError::Validation` if the email or nickname is taken.
    pub async fn create<'e, E>(&self, executor: E, email: &str, nickname: &str, password_hash: &str) -> Result<User>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, nickname, password_hash)
            VALUES ($1, $2, $3)
            RETURNING id, email, nickname, password_hash, avatar, is_verified, created_at
            "#,
        )
        .bind(email)
        .bind(nickname)
        .bind(password_hash)
        .fetch_one(executor)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                AppError::Validation("Email or nickname is already taken".into())
            }
            _ => AppError::Database(e),
        })?;

        Ok(user)
    }

    pub async fn find_by_id<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<User>>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, email, nickname, password_hash, avatar, is_verified, created_at FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(executor)
        .await?;

        Ok(user)
    }

    pub async fn find_by_email<'e, E>(&self, executor: E, email: &str) -> Result<Option<User>>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, email, nickname, password_hash, avatar, is_verified, created_at FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(executor)
        .await?;

        Ok(user)
    }

    pub async fn profile_by_id<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Profile>>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let profile = sqlx::query_as::<_, Profile>(
            "SELECT id, nickname, avatar, is_verified, created_at FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(executor)
        .await?;

        Ok(profile)
    }

    /// Updates profile fields; `None` leaves a field untouched.
    ///
    /// # Errors
    /// Returns `AppError::Validation` if the new nickname is taken and
    /// `AppError::NotFound` if the user does not exist.
    pub async fn update_profile<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        nickname: Option<&str>,
        avatar: Option<&str>,
    ) -> Result<User>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET nickname = COALESCE($2, nickname),
                avatar = COALESCE($3, avatar)
            WHERE id = $1
            RETURNING id, email, nickname, password_hash, avatar, is_verified, created_at
            "#,
        )
        .bind(id)
        .bind(nickname)
        .bind(avatar)
        .fetch_optional(executor)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                AppError::Validation("Nickname is already taken".into())
            }
            _ => AppError::Database(e),
        })?;

        user.ok_or(AppError::NotFound)
    }

    /// Records a follow edge. Idempotent; returns whether a row was inserted.
    pub async fn follow<'e, E>(&self, executor: E, follower_id: Uuid, followee_id: Uuid) -> Result<bool>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            "INSERT INTO follows (follower_id, followee_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(follower_id)
        .bind(followee_id)
        .execute(executor)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn unfollow<'e, E>(&self, executor: E, follower_id: Uuid, followee_id: Uuid) -> Result<bool>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM follows WHERE follower_id = $1 AND followee_id = $2")
            .bind(follower_id)
            .bind(followee_id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn followers_of<'e, E>(&self, executor: E, user_id: Uuid) -> Result<Vec<Uuid>>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let rows: Vec<(Uuid,)> = sqlx::query_as("SELECT follower_id FROM follows WHERE followee_id = $1")
            .bind(user_id)
            .fetch_all(executor)
            .await?;

        Ok(rows.into_iter().map(|(id,)| id).collect())
    }
}
