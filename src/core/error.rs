//! Error types for this crate.
//!
//! Application-level operations return [`Result<T>`] with [`DemoError`]. Loader and
//! model internals use `anyhow` and surface here through [`DemoError::Other`].

use thiserror::Error;

/// A [`Result`](std::result::Result) alias using [`DemoError`] as the error type.
pub type Result<T> = std::result::Result<T, DemoError>;

#[derive(Error, Debug)]
pub enum DemoError {
    /// Network or download failure.
    #[error("{0}")]
    Download(String),

    /// The tokenizer rejected or could not decode the input.
    #[error("Tokenization failed: {0}")]
    Tokenization(String),

    /// The model ran but its output could not be turned into predictions.
    #[error("Inference failed: {0}")]
    Inference(String),

    /// Neither the primary nor the fallback fill-mask model could be loaded.
    #[error("could not load `{primary}` or fallback `{fallback}`: {reason}")]
    ModelUnavailable {
        primary: String,
        fallback: String,
        reason: String,
    },

    /// The built-in demo configuration is inconsistent.
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<tokenizers::Error> for DemoError {
    fn from(value: tokenizers::Error) -> Self {
        DemoError::Tokenization(value.to_string())
    }
}

impl From<candle_core::Error> for DemoError {
    fn from(value: candle_core::Error) -> Self {
        DemoError::Inference(value.to_string())
    }
}
