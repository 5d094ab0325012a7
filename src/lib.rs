//! Prompt-to-image and prompt-to-text client for the Hugging Face hosted
//! inference API.
//!
//! A [`session::GenerationSession`] tracks one workflow's loading/result/error
//! state on top of an [`inference::InferenceService`], configured once from
//! the environment through [`config::InferenceConfig`].

pub mod app;
pub mod blob;
pub mod config;
pub mod error;
pub mod inference;
pub mod mime;
pub mod models;
pub mod session;

pub use error::{Error, Result};
