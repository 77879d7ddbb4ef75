use crate::domain::user::{Profile, User};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    pub id: Uuid,
    pub nickname: String,
    pub avatar: Option<String>,
    pub is_verified: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<Profile> for ProfileResponse {
    fn from(profile: Profile) -> Self {
        Self {
            id: profile.id,
            nickname: profile.nickname,
            avatar: profile.avatar,
            is_verified: profile.is_verified,
            created_at: profile.created_at,
        }
    }
}

impl From<User> for ProfileResponse {
    fn from(user: User) -> Self {
        Profile::from(user).into()
    }
}

/// The authenticated user's own view; includes the email.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeResponse {
    pub id: Uuid,
    pub email: String,
    pub nickname: String,
    pub avatar: Option<String>,
    pub is_verified: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<User> for MeResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            nickname: user.nickname,
            avatar: user.avatar,
            is_verified: user.is_verified,
            created_at: user.created_at,
        }
    }
}

#[derive(Deserialize)]
pub struct UpdateProfile {
    pub nickname: Option<String>,
    pub avatar: Option<String>,
}
