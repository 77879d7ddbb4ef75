/// Tokens handed to a client after registration, login or refresh.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub token: String,
    pub refresh_token: String,
    pub expires_at: i64,
}
