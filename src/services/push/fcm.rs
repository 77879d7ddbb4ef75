use crate::config::PushConfig;
use crate::services::push::{PushError, PushPayload, PushProvider};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

/// Delivers pushes through the FCM HTTP endpoint.
#[derive(Debug)]
pub struct FcmProvider {
    client: reqwest::Client,
    endpoint: String,
    server_key: String,
}

#[derive(Debug, Deserialize)]
struct FcmResponse {
    success: u32,
    failure: u32,
}

impl FcmProvider {
    /// Builds the provider; `None` when no server key is configured.
    #[must_use]
    pub fn from_config(config: &PushConfig) -> Option<Self> {
        let server_key = config.fcm_server_key.clone()?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .ok()?;

        Some(Self { client, endpoint: config.fcm_endpoint.clone(), server_key })
    }
}

#[async_trait]
impl PushProvider for FcmProvider {
    async fn send(&self, tokens: &[String], payload: &PushPayload) -> Result<u32, PushError> {
        if tokens.is_empty() {
            return Ok(0);
        }

        let body = json!({
            "registration_ids": tokens,
            "notification": {
                "title": payload.title,
                "body": payload.body,
                "sound": "default",
            },
            "data": payload.data,
            "priority": "high",
        });

        let response = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("key={}", self.server_key))
            .json(&body)
            .send()
            .await
            .map_err(|e| PushError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(PushError::Transport(format!("FCM returned {}", response.status())));
        }

        let parsed: FcmResponse =
            response.json().await.map_err(|e| PushError::Transport(e.to_string()))?;

        if parsed.failure > 0 {
            tracing::debug!(failure = parsed.failure, "Some push tokens failed delivery");
        }

        Ok(parsed.success)
    }
}
