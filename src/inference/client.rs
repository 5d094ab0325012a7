use super::types::ApiErrorBody;
use super::InferenceService;
use crate::config::{InferenceConfig, KeyStatus};
use crate::{Error, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::sync::Arc;

/// reqwest client for the hosted inference endpoint.
///
/// No timeout is configured: a request stays pending until the transport
/// itself resolves it.
pub struct HfHttpClient {
    client: Client,
    config: Arc<InferenceConfig>,
}

impl HfHttpClient {
    pub fn new(config: Arc<InferenceConfig>) -> Self {
        Self::new_with_client(config, Client::new())
    }

    pub fn new_with_client(config: Arc<InferenceConfig>, client: Client) -> Self {
        Self { client, config }
    }
}

#[async_trait]
impl InferenceService for HfHttpClient {
    async fn validate_key(&self) -> KeyStatus {
        self.config.validate_api_key(&self.client).await
    }

    async fn query(&self, model_id: &str, body: &serde_json::Value) -> Result<Vec<u8>> {
        let url = self.config.model_url(model_id);
        tracing::debug!("Sending inference request to {}", url);

        let response = self
            .client
            .post(&url)
            .headers(self.config.headers())
            .json(body)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Failed to send request to inference API: {}", e);
                Error::Network(e.to_string())
            })?;

        let status = response.status();
        let payload = response
            .bytes()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        if !status.is_success() {
            let message = ApiErrorBody::parse(&payload)
                .error
                .filter(|message| !message.is_empty())
                .unwrap_or_else(|| {
                    format!(
                        "API Error: {} {}",
                        status.as_u16(),
                        status.canonical_reason().unwrap_or("")
                    )
                    .trim_end()
                    .to_string()
                });
            tracing::error!("Inference API error (status {}): {}", status, message);
            return Err(Error::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(payload.to_vec())
    }
}
