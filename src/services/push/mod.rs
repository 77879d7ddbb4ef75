use async_trait::async_trait;
use thiserror::Error;

pub mod fcm;

#[derive(Error, Debug)]
pub enum PushError {
    #[error("Push transport rejected the request: {0}")]
    Transport(String),
    #[error("External service error: {0}")]
    Other(#[from] anyhow::Error),
}

/// What a device shows for a notification.
#[derive(Debug, Clone)]
pub struct PushPayload {
    pub title: String,
    pub body: String,
    pub data: serde_json::Value,
}

/// Boundary to the push transport. Implementations take a batch of device
/// tokens and report only the aggregate success count; raw per-token
/// transport errors never cross this seam.
#[async_trait]
pub trait PushProvider: Send + Sync + std::fmt::Debug {
    /// Attempts delivery to every token; returns how many succeeded.
    ///
    /// # Errors
    /// Returns `PushError` when the transport as a whole is unreachable.
    async fn send(&self, tokens: &[String], payload: &PushPayload) -> Result<u32, PushError>;
}

/// Stand-in provider for deployments without push credentials; logs the
/// would-be delivery and reports zero successes.
#[derive(Debug, Default)]
pub struct LogOnlyProvider;

#[async_trait]
impl PushProvider for LogOnlyProvider {
    async fn send(&self, tokens: &[String], payload: &PushPayload) -> Result<u32, PushError> {
        tracing::info!(tokens = tokens.len(), title = %payload.title, "Push delivery skipped (no provider configured)");
        Ok(0)
    }
}
