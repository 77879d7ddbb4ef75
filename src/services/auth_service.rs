use crate::config::AuthConfig;
use crate::domain::auth::{Claims, OpaqueToken, Password};
use crate::domain::auth_session::AuthSession;
use crate::domain::user::User;
use crate::error::{AppError, Result};
use crate::storage::DbPool;
use crate::storage::refresh_token_repo::RefreshTokenRepository;
use crate::storage::user_repo::UserRepository;
use sqlx::PgConnection;
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

#[derive(Clone, Debug)]
pub struct AuthService {
    config: AuthConfig,
    pool: DbPool,
    user_repo: UserRepository,
    refresh_repo: RefreshTokenRepository,
}

impl AuthService {
    #[must_use]
    pub fn new(config: AuthConfig, pool: DbPool, user_repo: UserRepository, refresh_repo: RefreshTokenRepository) -> Self {
        Self { config, pool, user_repo, refresh_repo }
    }

    /// Registers a new account and immediately issues a session.
    ///
    /// # Errors
    /// Returns `AppError::Validation` on malformed input or taken
    /// email/nickname.
    #[tracing::instrument(skip(self, email, nickname, password), fields(user_id = tracing::field::Empty), err(level = "warn"))]
    pub async fn register(&self, email: String, nickname: String, password: String) -> Result<(User, AuthSession)> {
        validate_registration(&email, &nickname, &password)?;

        let password_hash = self.hash_password(&password).await?;

        let mut tx = self.pool.begin().await?;
        let user = self.user_repo.create(&mut *tx, &email, &nickname, &password_hash).await?;

        tracing::Span::current().record("user_id", tracing::field::display(user.id));

        let session = self.create_session(&mut tx, user.id).await?;
        tx.commit().await?;

        tracing::info!("User registered successfully");
        Ok((user, session))
    }

    #[tracing::instrument(skip(self, email, password), fields(user_id = tracing::field::Empty), err(level = "warn"))]
    pub async fn login(&self, email: String, password: String) -> Result<AuthSession> {
        let mut conn = self.pool.acquire().await?;
        let Some(user) = self.user_repo.find_by_email(&mut *conn, &email).await? else {
            tracing::warn!("Login failed: user not found");
            return Err(AppError::AuthError);
        };

        tracing::Span::current().record("user_id", tracing::field::display(user.id));

        let is_valid = self.verify_password(&password, &user.password_hash).await?;
        if !is_valid {
            tracing::warn!("Login failed: invalid password");
            return Err(AppError::AuthError);
        }

        let session = self.create_session(&mut conn, user.id).await?;
        Ok(session)
    }

    /// Rotates a refresh token: the presented token is consumed and a fresh
    /// pair is issued in one transaction.
    #[tracing::instrument(skip(self, refresh_token), err(level = "warn"))]
    pub async fn refresh(&self, refresh_token: String) -> Result<AuthSession> {
        let token_hash = OpaqueToken::hash(&refresh_token);

        let mut tx = self.pool.begin().await?;
        let Some(user_id) = self.refresh_repo.verify_and_consume(&mut tx, &token_hash).await? else {
            return Err(AppError::AuthError);
        };

        let session = self.create_session(&mut tx, user_id).await?;
        tx.commit().await?;

        Ok(session)
    }

    #[tracing::instrument(skip(self, refresh_token), err(level = "warn"))]
    pub async fn logout(&self, user_id: Uuid, refresh_token: String) -> Result<()> {
        let token_hash = OpaqueToken::hash(&refresh_token);
        self.refresh_repo.delete(&self.pool, user_id, &token_hash).await?;
        Ok(())
    }

    pub(crate) async fn create_session(&self, conn: &mut PgConnection, user_id: Uuid) -> Result<AuthSession> {
        let claims = Claims::new(user_id, self.config.access_token_ttl_secs);
        let token = claims.encode(&self.config.jwt_secret)?;

        let refresh_token = OpaqueToken::generate();
        let refresh_hash = OpaqueToken::hash(&refresh_token);
        self.refresh_repo.create(&mut *conn, user_id, &refresh_hash, self.config.refresh_token_ttl_days).await?;

        let expires_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or(std::time::Duration::from_secs(0))
            .as_secs() as i64
            + self.config.access_token_ttl_secs as i64;

        Ok(AuthSession { token, refresh_token, expires_at })
    }

    /// Argon2 is CPU-heavy; keep it off the async runtime.
    async fn hash_password(&self, password: &str) -> Result<String> {
        let password = password.to_string();
        tokio::task::spawn_blocking(move || Password::hash(&password)).await.map_err(|_| AppError::Internal)?
    }

    async fn verify_password(&self, password: &str, hash: &str) -> Result<bool> {
        let password = password.to_string();
        let hash = hash.to_string();
        tokio::task::spawn_blocking(move || Password::verify(&password, &hash))
            .await
            .map_err(|_| AppError::Internal)?
    }
}

fn validate_registration(email: &str, nickname: &str, password: &str) -> Result<()> {
    if !email.contains('@') || email.len() > 254 {
        return Err(AppError::Validation("Invalid email address".into()));
    }
    let nickname = nickname.trim();
    if nickname.is_empty() || nickname.len() > 20 {
        return Err(AppError::Validation("Nickname must be 1-20 characters".into()));
    }
    if password.len() < 8 {
        return Err(AppError::Validation("Password must be at least 8 characters".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registration_validation() {
        assert!(validate_registration("a@example.com", "alice", "longenough").is_ok());
        assert!(validate_registration("not-an-email", "alice", "longenough").is_err());
        assert!(validate_registration("a@example.com", "", "longenough").is_err());
        assert!(validate_registration("a@example.com", "a-very-long-nickname-over-limit", "longenough").is_err());
        assert!(validate_registration("a@example.com", "alice", "short").is_err());
    }
}
