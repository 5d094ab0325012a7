use super::InferenceService;
use crate::config::KeyStatus;
use crate::{Error, Result};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;

/// One scripted answer to a generation POST.
#[derive(Debug, Clone)]
pub enum MockOutcome {
    Body(Vec<u8>),
    Api { status: u16, message: String },
    Network(String),
}

impl MockOutcome {
    pub fn json(value: serde_json::Value) -> Self {
        MockOutcome::Body(value.to_string().into_bytes())
    }

    fn into_result(self) -> Result<Vec<u8>> {
        match self {
            MockOutcome::Body(body) => Ok(body),
            MockOutcome::Api { status, message } => Err(Error::Api { status, message }),
            MockOutcome::Network(message) => Err(Error::Network(message)),
        }
    }
}

/// Scripted [`InferenceService`]; outcomes are replayed in order and cycle.
pub struct MockInferenceClient {
    key_status: Mutex<KeyStatus>,
    outcomes: Arc<Mutex<Vec<MockOutcome>>>,
    validation_calls: Arc<Mutex<usize>>,
    query_calls: Arc<Mutex<usize>>,
    requests: Arc<Mutex<Vec<(String, serde_json::Value)>>>,
    gate: Option<Arc<Semaphore>>,
}

impl MockInferenceClient {
    pub fn new() -> Self {
        Self {
            key_status: Mutex::new(KeyStatus::Valid),
            outcomes: Arc::new(Mutex::new(Vec::new())),
            validation_calls: Arc::new(Mutex::new(0)),
            query_calls: Arc::new(Mutex::new(0)),
            requests: Arc::new(Mutex::new(Vec::new())),
            gate: None,
        }
    }

    pub fn with_key_status(self, status: KeyStatus) -> Self {
        *self.key_status.lock().unwrap() = status;
        self
    }

    pub fn with_outcome(self, outcome: MockOutcome) -> Self {
        self.outcomes.lock().unwrap().push(outcome);
        self
    }

    /// Parks every `query` until a matching [`release`](Self::release).
    pub fn held(mut self) -> Self {
        self.gate = Some(Arc::new(Semaphore::new(0)));
        self
    }

    pub fn release(&self, count: usize) {
        if let Some(gate) = &self.gate {
            gate.add_permits(count);
        }
    }

    pub fn validation_count(&self) -> usize {
        *self.validation_calls.lock().unwrap()
    }

    pub fn query_count(&self) -> usize {
        *self.query_calls.lock().unwrap()
    }

    /// `(model_id, body)` for every POST received so far.
    pub fn requests(&self) -> Vec<(String, serde_json::Value)> {
        self.requests.lock().unwrap().clone()
    }
}

impl Default for MockInferenceClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl InferenceService for MockInferenceClient {
    async fn validate_key(&self) -> KeyStatus {
        *self.validation_calls.lock().unwrap() += 1;
        self.key_status.lock().unwrap().clone()
    }

    async fn query(&self, model_id: &str, body: &serde_json::Value) -> Result<Vec<u8>> {
        let outcome = {
            let mut count = self.query_calls.lock().unwrap();
            *count += 1;
            self.requests
                .lock()
                .unwrap()
                .push((model_id.to_string(), body.clone()));

            let outcomes = self.outcomes.lock().unwrap();
            if outcomes.is_empty() {
                // 1x1 PNG header
                MockOutcome::Body(vec![
                    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49,
                    0x48, 0x44, 0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01,
                ])
            } else {
                outcomes[(*count - 1) % outcomes.len()].clone()
            }
        };

        if let Some(gate) = &self.gate {
            gate.acquire()
                .await
                .map_err(|e| Error::Generic(format!("mock gate closed: {}", e)))?
                .forget();
        }

        outcome.into_result()
    }
}
