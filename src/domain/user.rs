use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub nickname: String,
    pub password_hash: String,
    pub avatar: Option<String>,
    pub is_verified: bool,
    pub created_at: OffsetDateTime,
}

/// Public view of a user, safe to hand to other users.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Profile {
    pub id: Uuid,
    pub nickname: String,
    pub avatar: Option<String>,
    pub is_verified: bool,
    pub created_at: OffsetDateTime,
}

impl From<User> for Profile {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            nickname: user.nickname,
            avatar: user.avatar,
            is_verified: user.is_verified,
            created_at: user.created_at,
        }
    }
}
