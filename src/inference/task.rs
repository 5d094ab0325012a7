//! Per-kind request strategies
//!
//! Image and text generation share one request lifecycle and differ only in
//! the payload they send, the default model, whether the key is probed first
//! and how the response body is decoded. Each of those differences lives on
//! a [`GenerationTask`].

use super::types::{ImageRequest, TextRequest};
use crate::blob::BlobStore;
use crate::config::InferenceConfig;
use crate::mime::ImageFormat;
use crate::models::{GenerationResult, ImageResult, TextResult};
use crate::Result;
use serde_json::Value;
use std::sync::Arc;

pub trait GenerationTask: Send + Sync {
    type Output: Clone + Into<GenerationResult> + Send;

    /// Label used in log lines.
    fn kind(&self) -> &'static str;

    fn default_model<'a>(&self, config: &'a InferenceConfig) -> &'a str;

    /// Whether the key is validated with a separate round trip before the
    /// generation POST.
    fn probes_key(&self) -> bool;

    fn payload(&self, prompt: &str, config: &InferenceConfig) -> Result<Value>;

    fn decode(&self, body: Vec<u8>, blobs: &BlobStore) -> Result<Self::Output>;
}

/// Text-to-image: binary response, exposed through an object URL.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageTask;

impl GenerationTask for ImageTask {
    type Output = ImageResult;

    fn kind(&self) -> &'static str {
        "image"
    }

    fn default_model<'a>(&self, config: &'a InferenceConfig) -> &'a str {
        &config.default_image_model
    }

    fn probes_key(&self) -> bool {
        true
    }

    fn payload(&self, prompt: &str, config: &InferenceConfig) -> Result<Value> {
        Ok(serde_json::to_value(ImageRequest {
            inputs: prompt,
            options: &config.image_options,
        })?)
    }

    fn decode(&self, body: Vec<u8>, blobs: &BlobStore) -> Result<ImageResult> {
        let mime = ImageFormat::detect(&body).mime();
        let blob = Arc::new(body);
        let url = blobs.create_object_url(Arc::clone(&blob));
        Ok(ImageResult { blob, url, mime })
    }
}

/// Text generation: JSON response stored as-is.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextTask;

impl GenerationTask for TextTask {
    type Output = TextResult;

    fn kind(&self) -> &'static str {
        "text"
    }

    fn default_model<'a>(&self, config: &'a InferenceConfig) -> &'a str {
        &config.default_text_model
    }

    fn probes_key(&self) -> bool {
        false
    }

    fn payload(&self, prompt: &str, config: &InferenceConfig) -> Result<Value> {
        Ok(serde_json::to_value(TextRequest {
            inputs: prompt,
            parameters: &config.text_parameters,
        })?)
    }

    fn decode(&self, body: Vec<u8>, _blobs: &BlobStore) -> Result<TextResult> {
        Ok(TextResult(serde_json::from_slice(&body)?))
    }
}
