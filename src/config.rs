//! Inference endpoint configuration
//!
//! Built once at startup (usually from the environment) and shared read-only
//! with every component that talks to the service.

use crate::inference::types::{ImageOptions, TextParameters};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, StatusCode};

pub const DEFAULT_BASE_URL: &str = "https://api-inference.huggingface.co/models";
pub const DEFAULT_IMAGE_MODEL: &str = "black-forest-labs/FLUX.1-schnell";
pub const DEFAULT_TEXT_MODEL: &str = "gpt2";

const API_KEY_VAR: &str = "HUGGINGFACE_API_KEY";
const LEGACY_API_KEY_VAR: &str = "VITE_HUGGINGFACE_API_KEY";

/// Outcome of probing the service with the configured key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyStatus {
    Valid,
    Unconfigured,
    /// The service answered 401.
    Invalid,
    /// Any other non-2xx answer to the probe.
    Rejected { status: u16 },
    /// The probe never got an answer.
    Unreachable(String),
}

impl KeyStatus {
    pub fn is_valid(&self) -> bool {
        matches!(self, KeyStatus::Valid)
    }

    pub fn error(&self) -> Option<String> {
        match self {
            KeyStatus::Valid | KeyStatus::Rejected { .. } => None,
            KeyStatus::Unconfigured => Some("API key is not configured".to_string()),
            KeyStatus::Invalid => Some("Invalid API key".to_string()),
            KeyStatus::Unreachable(message) => Some(message.clone()),
        }
    }

    /// Converts a failed probe into the error surfaced by generation.
    pub fn into_error(self) -> crate::Error {
        match self {
            KeyStatus::Unconfigured => crate::Error::UnconfiguredKey,
            KeyStatus::Unreachable(message) => crate::Error::Network(message),
            KeyStatus::Valid | KeyStatus::Invalid | KeyStatus::Rejected { .. } => {
                crate::Error::InvalidKey("Invalid API key".to_string())
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct InferenceConfig {
    pub base_url: String,
    pub default_image_model: String,
    pub default_text_model: String,
    pub image_options: ImageOptions,
    pub text_parameters: TextParameters,
    api_key: Option<String>,
}

impl InferenceConfig {
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            default_image_model: DEFAULT_IMAGE_MODEL.to_string(),
            default_text_model: DEFAULT_TEXT_MODEL.to_string(),
            image_options: ImageOptions::default(),
            text_parameters: TextParameters::default(),
            api_key: api_key.filter(|key| !key.trim().is_empty()),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Reads the key and optional overrides from the process environment.
    ///
    /// A missing key is not an error; it leaves the config in a state where
    /// every generation is refused.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let api_key = std::env::var(API_KEY_VAR)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .or_else(|| std::env::var(LEGACY_API_KEY_VAR).ok());

        let mut config = Self::new(api_key);
        if let Ok(base_url) = std::env::var("HUGGINGFACE_BASE_URL") {
            config = config.with_base_url(base_url);
        }
        if let Ok(model) = std::env::var("HUGGINGFACE_IMAGE_MODEL") {
            config.default_image_model = model;
        }
        if let Ok(model) = std::env::var("HUGGINGFACE_TEXT_MODEL") {
            config.default_text_model = model;
        }

        if config.api_key.is_none() {
            tracing::warn!("{} is not set; generation is disabled", API_KEY_VAR);
        }

        config
    }

    pub fn api_key(&self) -> &str {
        match &self.api_key {
            Some(key) => key,
            None => {
                tracing::error!(
                    "Hugging Face API key is not configured. Please check your .env file."
                );
                ""
            }
        }
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Key shortened for display, e.g. in `env` diagnostics.
    pub fn masked_api_key(&self) -> String {
        match &self.api_key {
            Some(key) => format!("{}…", key.chars().take(4).collect::<String>()),
            None => "Not found".to_string(),
        }
    }

    pub fn model_url(&self, model_id: &str) -> String {
        format!("{}/{}", self.base_url, model_id)
    }

    /// Headers for a generation request. Built even when the key is empty;
    /// callers check `has_api_key` first.
    pub fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        match HeaderValue::from_str(&format!("Bearer {}", self.api_key())) {
            Ok(value) => {
                headers.insert(AUTHORIZATION, value);
            }
            Err(e) => tracing::error!("API key is not a valid header value: {}", e),
        }
        headers
    }

    /// Probes `{base_url}/{default_image_model}` with the configured key.
    pub async fn validate_api_key(&self, client: &Client) -> KeyStatus {
        if !self.has_api_key() {
            return KeyStatus::Unconfigured;
        }

        let url = self.model_url(&self.default_image_model);
        tracing::debug!("Validating API key against {}", url);

        match client.get(&url).bearer_auth(self.api_key()).send().await {
            Ok(response) if response.status() == StatusCode::UNAUTHORIZED => KeyStatus::Invalid,
            Ok(response) if response.status().is_success() => KeyStatus::Valid,
            Ok(response) => {
                tracing::warn!("Key probe returned status {}", response.status());
                KeyStatus::Rejected {
                    status: response.status().as_u16(),
                }
            }
            Err(e) => {
                tracing::error!("Failed to reach inference service: {}", e);
                KeyStatus::Unreachable(e.to_string())
            }
        }
    }
}
