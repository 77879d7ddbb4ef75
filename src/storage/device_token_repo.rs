use crate::error::Result;
use sqlx::{Executor, Postgres};
use uuid::Uuid;

#[derive(Clone, Debug, Default)]
pub struct DeviceTokenRepository {}

impl DeviceTokenRepository {
    #[must_use]
    pub const fn new() -> Self {
        Self {}
    }

    /// Registers a device token, reclaiming it from a previous owner and
    /// reactivating it if needed.
    pub async fn upsert<'e, E>(&self, executor: E, user_id: Uuid, token: &str) -> Result<()>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"
            INSERT INTO device_tokens (user_id, token)
            VALUES ($1, $2)
            ON CONFLICT (token)
            DO UPDATE SET user_id = EXCLUDED.user_id, is_active = TRUE, updated_at = NOW()
            "#,
        )
        .bind(user_id)
        .bind(token)
        .execute(executor)
        .await?;

        Ok(())
    }

    /// Deactivates one of the user's tokens. Returns whether it existed.
    pub async fn deactivate<'e, E>(&self, executor: E, user_id: Uuid, token: &str) -> Result<bool>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            "UPDATE device_tokens SET is_active = FALSE, updated_at = NOW() WHERE user_id = $1 AND token = $2",
        )
        .bind(user_id)
        .bind(token)
        .execute(executor)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn active_tokens<'e, E>(&self, executor: E, user_id: Uuid) -> Result<Vec<String>>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let rows: Vec<(String,)> =
            sqlx::query_as("SELECT token FROM device_tokens WHERE user_id = $1 AND is_active")
                .bind(user_id)
                .fetch_all(executor)
                .await?;

        Ok(rows.into_iter().map(|(t,)| t).collect())
    }
}
