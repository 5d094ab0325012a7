//! Generation session
//!
//! A [`GenerationSession`] owns the transient state of one prompt-to-artifact
//! workflow: whether a request is in flight, the last result, and the last
//! error. Image and text generation run through the same lifecycle, driven by
//! a [`GenerationTask`] strategy:
//!
//! 1. reject blank prompts before touching state or the network
//! 2. flag `loading` and clear `error`, keeping the previous `data`
//! 3. optionally probe the key
//! 4. POST the payload and decode the answer
//! 5. commit `data` or `error` and clear `loading`
//!
//! Failures are written to state *and* returned, so callers can react on top
//! of an already consistent session.
//!
//! Each request takes a ticket when it starts. Only the holder of the newest
//! ticket may commit, and [`reset`](GenerationSession::reset) invalidates every
//! outstanding ticket, so a late answer can never overwrite newer state.

use crate::blob::BlobStore;
use crate::config::{InferenceConfig, KeyStatus};
use crate::inference::{GenerationTask, ImageTask, InferenceService, TextTask};
use crate::models::{GenerationResult, ImageResult, RequestState, TextResult};
use crate::{Error, Result};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info, warn};

pub struct GenerationSession {
    service: Arc<dyn InferenceService>,
    config: Arc<InferenceConfig>,
    blobs: BlobStore,
    state: Mutex<RequestState>,
    latest_ticket: AtomicU64,
    key_configured: bool,
}

impl GenerationSession {
    pub fn new(service: Arc<dyn InferenceService>, config: Arc<InferenceConfig>) -> Self {
        let key_configured = config.has_api_key();
        Self {
            service,
            config,
            blobs: BlobStore::new(),
            state: Mutex::new(RequestState::default()),
            latest_ticket: AtomicU64::new(0),
            key_configured,
        }
    }

    /// Whether a key was present when the session was built. Front ends use
    /// this to refuse generation up front.
    pub fn api_key_configured(&self) -> bool {
        self.key_configured
    }

    pub fn config(&self) -> &InferenceConfig {
        &self.config
    }

    pub fn blobs(&self) -> &BlobStore {
        &self.blobs
    }

    /// Probes the service with the configured key without touching state.
    pub async fn validate_key(&self) -> KeyStatus {
        self.service.validate_key().await
    }

    pub fn state(&self) -> RequestState {
        self.lock_state().clone()
    }

    fn lock_state(&self) -> MutexGuard<'_, RequestState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub async fn generate_image(
        &self,
        prompt: &str,
        model_id: Option<&str>,
    ) -> Result<ImageResult> {
        self.run(&ImageTask, prompt, model_id).await
    }

    pub async fn generate_text(
        &self,
        prompt: &str,
        model_id: Option<&str>,
    ) -> Result<TextResult> {
        self.run(&TextTask, prompt, model_id).await
    }

    /// Returns to the initial state and releases the current image handle.
    /// Requests still in flight keep running but can no longer commit.
    pub fn reset(&self) {
        self.latest_ticket.fetch_add(1, Ordering::SeqCst);
        let previous = std::mem::take(&mut *self.lock_state());
        self.release(previous.data.as_ref());
    }

    async fn run<T: GenerationTask>(
        &self,
        task: &T,
        prompt: &str,
        model_id: Option<&str>,
    ) -> Result<T::Output> {
        if prompt.trim().is_empty() {
            return Err(Error::EmptyPrompt);
        }

        let model_id = model_id.unwrap_or_else(|| task.default_model(&self.config));
        let ticket = self.begin();
        info!("Starting {} generation with model {}", task.kind(), model_id);

        let outcome = self.execute(task, prompt, model_id).await;
        self.finish(ticket, task.kind(), outcome)
    }

    fn begin(&self) -> u64 {
        let mut state = self.lock_state();
        let ticket = self.latest_ticket.fetch_add(1, Ordering::SeqCst) + 1;
        state.loading = true;
        state.error = None;
        ticket
    }

    async fn execute<T: GenerationTask>(
        &self,
        task: &T,
        prompt: &str,
        model_id: &str,
    ) -> Result<T::Output> {
        if task.probes_key() {
            let status = self.service.validate_key().await;
            if !status.is_valid() {
                warn!("API key check failed: {:?}", status);
                return Err(status.into_error());
            }
        }

        let payload = task.payload(prompt, &self.config)?;
        let body = self.service.query(model_id, &payload).await?;
        task.decode(body, &self.blobs)
    }

    fn finish<O>(&self, ticket: u64, kind: &str, outcome: Result<O>) -> Result<O>
    where
        O: Clone + Into<GenerationResult>,
    {
        let mut state = self.lock_state();

        if ticket != self.latest_ticket.load(Ordering::SeqCst) {
            drop(state);
            debug!("Discarding superseded {} generation #{}", kind, ticket);
            return match outcome {
                Ok(output) => {
                    let discarded: GenerationResult = output.into();
                    self.release(Some(&discarded));
                    Err(Error::Superseded)
                }
                Err(e) => Err(e),
            };
        }

        state.loading = false;
        match outcome {
            Ok(output) => {
                let previous = state.data.replace(output.clone().into());
                drop(state);
                self.release(previous.as_ref());
                info!("{} generation succeeded", kind);
                Ok(output)
            }
            Err(e) => {
                state.error = Some(e.to_string());
                warn!("{} generation failed: {}", kind, e);
                Err(e)
            }
        }
    }

    fn release(&self, result: Option<&GenerationResult>) {
        if let Some(url) = result.and_then(GenerationResult::object_url) {
            self.blobs.revoke_object_url(url);
        }
    }
}

impl Drop for GenerationSession {
    fn drop(&mut self) {
        let state = std::mem::take(&mut *self.lock_state());
        self.release(state.data.as_ref());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::{MockInferenceClient, MockOutcome};
    use crate::models::Phase;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn session_with(client: Arc<MockInferenceClient>) -> GenerationSession {
        let config = InferenceConfig::new(Some("hf_test".to_string()));
        GenerationSession::new(client, Arc::new(config))
    }

    #[tokio::test]
    async fn test_image_success_commits_result() {
        let client = Arc::new(
            MockInferenceClient::new().with_outcome(MockOutcome::Body(b"\x89PNG...".to_vec())),
        );
        let session = session_with(Arc::clone(&client));

        let image = session
            .generate_image("a red cube", Some("black-forest-labs/FLUX.1-schnell"))
            .await
            .unwrap();

        assert!(image.url.starts_with("blob:"));
        assert_eq!(image.blob.as_slice(), b"\x89PNG...");

        let state = session.state();
        assert!(!state.loading);
        assert!(state.error.is_none());
        assert_eq!(state.data, Some(GenerationResult::Image(image)));
        assert_eq!(state.phase(), Phase::Success);

        assert_eq!(client.validation_count(), 1);
        let requests = client.requests();
        assert_eq!(requests[0].0, "black-forest-labs/FLUX.1-schnell");
        assert_eq!(
            requests[0].1,
            json!({
                "inputs": "a red cube",
                "options": { "wait_for_model": true, "use_cache": false }
            })
        );
    }

    #[tokio::test]
    async fn test_blank_prompt_is_rejected_before_anything() {
        let client = Arc::new(MockInferenceClient::new());
        let session = session_with(Arc::clone(&client));

        for prompt in ["", "   ", "\n\t"] {
            assert!(matches!(
                session.generate_image(prompt, None).await,
                Err(Error::EmptyPrompt)
            ));
            assert!(matches!(
                session.generate_text(prompt, None).await,
                Err(Error::EmptyPrompt)
            ));
        }

        assert_eq!(client.validation_count(), 0);
        assert_eq!(client.query_count(), 0);
        assert_eq!(session.state(), RequestState::default());
    }

    #[tokio::test]
    async fn test_failed_key_probe_skips_generation_post() {
        let client = Arc::new(MockInferenceClient::new().with_key_status(KeyStatus::Invalid));
        let session = session_with(Arc::clone(&client));

        let err = session.generate_image("a red cube", None).await.unwrap_err();
        assert_eq!(err.to_string(), "Invalid API key");

        assert_eq!(client.validation_count(), 1);
        assert_eq!(client.query_count(), 0);
        let state = session.state();
        assert_eq!(state.error.as_deref(), Some("Invalid API key"));
        assert!(!state.loading);
    }

    #[tokio::test]
    async fn test_text_generation_skips_probe() {
        let client = Arc::new(
            MockInferenceClient::new()
                .with_key_status(KeyStatus::Invalid)
                .with_outcome(MockOutcome::json(json!([{ "generated_text": "hello there" }]))),
        );
        let session = session_with(Arc::clone(&client));

        let text = session.generate_text("hello", None).await.unwrap();
        assert_eq!(text.generated_text(), "hello there");
        assert_eq!(client.validation_count(), 0);
        assert_eq!(client.requests()[0].0, "gpt2");
    }

    #[tokio::test]
    async fn test_api_error_keeps_previous_data() {
        let client = Arc::new(
            MockInferenceClient::new()
                .with_outcome(MockOutcome::json(json!([{ "generated_text": "first" }])))
                .with_outcome(MockOutcome::Api {
                    status: 500,
                    message: "model loading".to_string(),
                }),
        );
        let session = session_with(client);

        session.generate_text("one", None).await.unwrap();
        let err = session.generate_text("two", None).await.unwrap_err();
        assert_eq!(err.to_string(), "model loading");

        let state = session.state();
        assert_eq!(state.error.as_deref(), Some("model loading"));
        assert_eq!(
            state.data.and_then(|d| d.as_text().map(|t| t.generated_text().to_string())),
            Some("first".to_string())
        );
    }

    #[tokio::test]
    async fn test_loading_retains_previous_result() {
        let client = Arc::new(
            MockInferenceClient::new()
                .with_outcome(MockOutcome::json(json!([{ "generated_text": "done" }])))
                .held(),
        );
        let session = Arc::new(session_with(Arc::clone(&client)));

        client.release(1);
        session.generate_text("first", None).await.unwrap();
        let before = session.state().data;

        let pending = tokio::spawn({
            let session = Arc::clone(&session);
            async move { session.generate_text("second", None).await }
        });
        while client.query_count() < 2 {
            tokio::task::yield_now().await;
        }

        let mid = session.state();
        assert!(mid.loading);
        assert!(mid.error.is_none());
        assert_eq!(mid.data, before);

        client.release(1);
        pending.await.unwrap().unwrap();
        assert!(!session.state().loading);
    }

    #[tokio::test]
    async fn test_newer_request_wins() {
        let client = Arc::new(
            MockInferenceClient::new()
                .with_outcome(MockOutcome::json(json!([{ "generated_text": "old" }])))
                .with_outcome(MockOutcome::json(json!([{ "generated_text": "new" }])))
                .held(),
        );
        let session = Arc::new(session_with(Arc::clone(&client)));

        let first = tokio::spawn({
            let session = Arc::clone(&session);
            async move { session.generate_text("first", None).await }
        });
        while client.query_count() < 1 {
            tokio::task::yield_now().await;
        }
        let second = tokio::spawn({
            let session = Arc::clone(&session);
            async move { session.generate_text("second", None).await }
        });
        while client.query_count() < 2 {
            tokio::task::yield_now().await;
        }

        client.release(2);
        let first = first.await.unwrap();
        let second = second.await.unwrap().unwrap();

        assert!(matches!(first, Err(Error::Superseded)));
        assert_eq!(second.generated_text(), "new");
        let state = session.state();
        assert!(!state.loading);
        assert_eq!(state.data, Some(GenerationResult::Text(second)));
    }

    #[tokio::test]
    async fn test_reset_is_idempotent_and_blocks_late_results() {
        let client = Arc::new(MockInferenceClient::new().held());
        let session = Arc::new(session_with(Arc::clone(&client)));

        let pending = tokio::spawn({
            let session = Arc::clone(&session);
            async move { session.generate_image("a red cube", None).await }
        });
        while client.query_count() < 1 {
            tokio::task::yield_now().await;
        }

        session.reset();
        session.reset();
        assert_eq!(session.state(), RequestState::default());

        client.release(1);
        assert!(matches!(pending.await.unwrap(), Err(Error::Superseded)));
        assert_eq!(session.state(), RequestState::default());
        assert_eq!(session.blobs().live_handles(), 0);
    }

    #[tokio::test]
    async fn test_new_image_releases_previous_handle() {
        let client = Arc::new(MockInferenceClient::new());
        let session = session_with(client);

        let first = session.generate_image("one", None).await.unwrap();
        let second = session.generate_image("two", None).await.unwrap();

        assert!(session.blobs().resolve(&first.url).is_none());
        assert!(session.blobs().resolve(&second.url).is_some());
        assert_eq!(session.blobs().live_handles(), 1);

        session.reset();
        assert_eq!(session.blobs().live_handles(), 0);
    }

    #[tokio::test]
    async fn test_drop_releases_handle() {
        let client = Arc::new(MockInferenceClient::new());
        let session = session_with(client);
        let blobs = session.blobs().clone();

        session.generate_image("one", None).await.unwrap();
        assert_eq!(blobs.live_handles(), 1);

        drop(session);
        assert_eq!(blobs.live_handles(), 0);
    }

    #[test]
    fn test_key_presence_captured_at_construction() {
        let client = Arc::new(MockInferenceClient::new());
        let session = GenerationSession::new(client, Arc::new(InferenceConfig::new(None)));
        assert!(!session.api_key_configured());
    }
}
