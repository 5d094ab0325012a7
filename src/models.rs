//! Data models
//!
//! Results of a generation request and the observable state of a session.

use serde_json::Value;
use std::sync::Arc;

const NO_TEXT_FALLBACK: &str = "No response generated";

#[derive(Debug, Clone, PartialEq)]
pub struct ImageResult {
    pub blob: Arc<Vec<u8>>,
    /// `blob:` URL registered in the session's blob store.
    pub url: String,
    pub mime: &'static str,
}

/// Decoded JSON exactly as the text model returned it.
#[derive(Debug, Clone, PartialEq)]
pub struct TextResult(pub Value);

impl TextResult {
    /// `result[0].generated_text`, or a fallback when the model answered in
    /// another shape.
    pub fn generated_text(&self) -> &str {
        self.0
            .get(0)
            .and_then(|first| first.get("generated_text"))
            .and_then(Value::as_str)
            .unwrap_or(NO_TEXT_FALLBACK)
    }

    pub fn raw(&self) -> &Value {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum GenerationResult {
    Image(ImageResult),
    Text(TextResult),
}

impl GenerationResult {
    pub fn object_url(&self) -> Option<&str> {
        match self {
            GenerationResult::Image(image) => Some(&image.url),
            GenerationResult::Text(_) => None,
        }
    }

    pub fn as_image(&self) -> Option<&ImageResult> {
        match self {
            GenerationResult::Image(image) => Some(image),
            GenerationResult::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&TextResult> {
        match self {
            GenerationResult::Text(text) => Some(text),
            GenerationResult::Image(_) => None,
        }
    }
}

impl From<ImageResult> for GenerationResult {
    fn from(image: ImageResult) -> Self {
        GenerationResult::Image(image)
    }
}

impl From<TextResult> for GenerationResult {
    fn from(text: TextResult) -> Self {
        GenerationResult::Text(text)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Loading,
    Success,
    Error,
}

/// Snapshot of a session.
///
/// While `loading` is true, `data` and `error` still describe the last
/// completed request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestState {
    pub data: Option<GenerationResult>,
    pub error: Option<String>,
    pub loading: bool,
}

impl RequestState {
    pub fn phase(&self) -> Phase {
        if self.loading {
            Phase::Loading
        } else if self.error.is_some() {
            Phase::Error
        } else if self.data.is_some() {
            Phase::Success
        } else {
            Phase::Idle
        }
    }
}
