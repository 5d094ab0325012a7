//! Request/response payloads for the hosted inference endpoint.

use serde::{Deserialize, Serialize};

/// Options sent with image-model requests.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ImageOptions {
    pub wait_for_model: bool,
    pub use_cache: bool,
}

impl Default for ImageOptions {
    fn default() -> Self {
        Self {
            wait_for_model: true,
            use_cache: false,
        }
    }
}

/// Generation parameters sent with text-model requests.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TextParameters {
    pub max_length: u32,
    pub num_return_sequences: u32,
}

impl Default for TextParameters {
    fn default() -> Self {
        Self {
            max_length: 100,
            num_return_sequences: 1,
        }
    }
}

/// Request body for text-to-image models.
#[derive(Debug, Serialize)]
pub struct ImageRequest<'a> {
    pub inputs: &'a str,
    pub options: &'a ImageOptions,
}

/// Request body for text-generation models.
#[derive(Debug, Serialize)]
pub struct TextRequest<'a> {
    pub inputs: &'a str,
    pub parameters: &'a TextParameters,
}

/// Error payload the service returns alongside non-2xx statuses.
///
/// Every field is optional because the body may be HTML, empty, or some other
/// JSON shape entirely.
#[derive(Debug, Default, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub error: Option<String>,
}

impl ApiErrorBody {
    /// Lenient decode: anything that is not the expected shape yields `{}`.
    pub fn parse(body: &[u8]) -> Self {
        serde_json::from_slice(body).unwrap_or_default()
    }
}
