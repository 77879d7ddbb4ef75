use crate::api::schemas::users::ProfileResponse;
use serde::{Deserialize, Serialize};

#[derive(Deserialize)]
pub struct Registration {
    pub email: String,
    pub nickname: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct Login {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Refresh {
    pub refresh_token: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Logout {
    pub refresh_token: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthSession {
    pub token: String,
    pub refresh_token: String,
    pub expires_at: i64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Registered {
    pub user: ProfileResponse,
    pub session: AuthSession,
}
