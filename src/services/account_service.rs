use crate::domain::user::{Profile, User};
use crate::error::{AppError, Result};
use crate::storage::DbPool;
use crate::storage::user_repo::UserRepository;
use uuid::Uuid;

/// Profiles and the follow graph.
#[derive(Clone, Debug)]
pub struct AccountService {
    pool: DbPool,
    user_repo: UserRepository,
}

impl AccountService {
    #[must_use]
    pub fn new(pool: DbPool, user_repo: UserRepository) -> Self {
        Self { pool, user_repo }
    }

    pub async fn profile(&self, user_id: Uuid) -> Result<Profile> {
        self.user_repo.profile_by_id(&self.pool, user_id).await?.ok_or(AppError::NotFound)
    }

    pub async fn me(&self, user_id: Uuid) -> Result<User> {
        self.user_repo.find_by_id(&self.pool, user_id).await?.ok_or(AppError::AuthError)
    }

    #[tracing::instrument(skip(self, nickname, avatar), err(level = "warn"))]
    pub async fn update_profile(
        &self,
        user_id: Uuid,
        nickname: Option<String>,
        avatar: Option<String>,
    ) -> Result<User> {
        if let Some(nickname) = nickname.as_deref() {
            let nickname = nickname.trim();
            if nickname.is_empty() || nickname.len() > 20 {
                return Err(AppError::Validation("Nickname must be 1-20 characters".into()));
            }
        }

        self.user_repo.update_profile(&self.pool, user_id, nickname.as_deref(), avatar.as_deref()).await
    }

    /// Follows another user. Idempotent; following carries no notification,
    /// followers hear about the user through new-listing fan-out instead.
    pub async fn follow(&self, actor_id: Uuid, followee_id: Uuid) -> Result<()> {
        if actor_id == followee_id {
            return Err(AppError::Validation("You cannot follow yourself".into()));
        }

        let mut conn = self.pool.acquire().await?;
        self.user_repo.profile_by_id(&mut *conn, followee_id).await?.ok_or(AppError::NotFound)?;
        self.user_repo.follow(&mut *conn, actor_id, followee_id).await?;
        Ok(())
    }

    pub async fn unfollow(&self, actor_id: Uuid, followee_id: Uuid) -> Result<()> {
        self.user_repo.unfollow(&self.pool, actor_id, followee_id).await?;
        Ok(())
    }
}
