//! Crate error type.
//!
//! The matching core never returns these for malformed pages; they surface only
//! at the boundaries (profile/config decoding, transports, committers, FFI).

use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AutofillError {
    #[error("invalid pattern for rule '{rule}': {source}")]
    InvalidPattern {
        rule: String,
        #[source]
        source: regex::Error,
    },

    #[error("invalid profile: {0}")]
    Profile(String),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("failed to commit value to control {control}: {reason}")]
    Commit { control: usize, reason: String },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),
}

pub type Result<T> = std::result::Result<T, AutofillError>;
