//! Error handling and custom error types
//!
//! Every failure of a generation request maps onto one of these variants. The
//! `Display` output is what ends up in the session's `error` field, so the
//! messages are written for the person who typed the prompt.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Prompt cannot be empty")]
    EmptyPrompt,

    #[error("API key is not configured")]
    UnconfiguredKey,

    #[error("{0}")]
    InvalidKey(String),

    #[error("{message}")]
    Api { status: u16, message: String },

    #[error("{0}")]
    Network(String),

    #[error("Request superseded by a newer generation")]
    Superseded,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Generic error: {0}")]
    Generic(String),
}

pub type Result<T> = std::result::Result<T, Error>;
