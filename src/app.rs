//! Terminal front end over a [`GenerationSession`].
//!
//! Plays the role a page plays in a browser: refuses to submit without a key,
//! reports errors, shows text results and saves image results to disk.

use crate::blob::BlobStore;
use crate::config::{InferenceConfig, KeyStatus};
use crate::inference::HfHttpClient;
use crate::mime::ImageFormat;
use crate::session::GenerationSession;
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info};

pub const MISSING_KEY_HINT: &str =
    "Create a .env file in the working directory with HUGGINGFACE_API_KEY=your_api_key_here";

pub struct App {
    session: GenerationSession,
}

impl App {
    /// Wire the real HTTP client from environment configuration.
    pub fn new() -> Self {
        let config = Arc::new(InferenceConfig::from_env());
        let service = Arc::new(HfHttpClient::new(Arc::clone(&config)));
        Self::with_session(GenerationSession::new(service, config))
    }

    /// Build an app around an existing session, e.g. one backed by a mock.
    pub fn with_session(session: GenerationSession) -> Self {
        Self { session }
    }

    pub fn session(&self) -> &GenerationSession {
        &self.session
    }

    fn ensure_key(&self) -> Result<()> {
        if self.session.api_key_configured() {
            Ok(())
        } else {
            error!("Hugging Face API key is not configured. {}", MISSING_KEY_HINT);
            Err(Error::UnconfiguredKey)
        }
    }

    /// Generates an image and writes it to `output` (a file or a directory).
    pub async fn generate_image(
        &self,
        prompt: &str,
        model_id: Option<&str>,
        output: Option<&Path>,
    ) -> Result<PathBuf> {
        self.ensure_key()?;

        let image = self.session.generate_image(prompt, model_id).await?;
        let path = save_image(self.session.blobs(), &image.url, output)?;
        info!("Your image has been generated: {}", path.display());
        Ok(path)
    }

    pub async fn generate_text(&self, prompt: &str, model_id: Option<&str>) -> Result<String> {
        self.ensure_key()?;

        let text = self.session.generate_text(prompt, model_id).await?;
        Ok(text.generated_text().to_string())
    }

    pub async fn check_key(&self) -> KeyStatus {
        self.session.validate_key().await
    }

    /// Name/value pairs describing the resolved configuration.
    pub fn environment_report(&self) -> Vec<(&'static str, String)> {
        let config = self.session.config();
        vec![
            ("HUGGINGFACE_API_KEY", config.masked_api_key()),
            ("base_url", config.base_url.clone()),
            ("image_model", config.default_image_model.clone()),
            ("text_model", config.default_text_model.clone()),
        ]
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

pub fn download_name(format: ImageFormat, at: DateTime<Utc>) -> String {
    format!("ai-generated-{}.{}", at.timestamp_millis(), format.extension())
}

/// Materializes the bytes behind an object URL as a file.
///
/// `target` may name a file, an existing directory (a timestamped name is
/// chosen inside it), or nothing (the current directory).
pub fn save_image(blobs: &BlobStore, url: &str, target: Option<&Path>) -> Result<PathBuf> {
    let data = blobs
        .resolve(url)
        .ok_or_else(|| Error::Generic(format!("Object URL {} has been revoked", url)))?;

    let name = download_name(ImageFormat::detect(&data), Utc::now());
    let path = match target {
        Some(dir) if dir.is_dir() => dir.join(name),
        Some(file) => file.to_path_buf(),
        None => PathBuf::from(name),
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(&path, data.as_slice())?;
    Ok(path)
}
