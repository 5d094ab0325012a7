//! Hosted inference service integration
//!
//! [`InferenceService`] is the only seam that touches the network. The
//! reqwest-backed [`HfHttpClient`] talks to the real endpoint and
//! [`MockInferenceClient`] replays scripted outcomes for tests.

pub mod client;
pub mod mock;
pub mod task;
pub mod types;

pub use client::HfHttpClient;
pub use mock::{MockInferenceClient, MockOutcome};
pub use task::{GenerationTask, ImageTask, TextTask};

use crate::config::KeyStatus;
use crate::Result;
use async_trait::async_trait;

#[async_trait]
pub trait InferenceService: Send + Sync {
    /// Probes the service with the configured key. Never fails; problems are
    /// reported through the returned status.
    async fn validate_key(&self) -> KeyStatus;

    /// POSTs `body` to the model endpoint and returns the raw 2xx body.
    async fn query(&self, model_id: &str, body: &serde_json::Value) -> Result<Vec<u8>>;
}
