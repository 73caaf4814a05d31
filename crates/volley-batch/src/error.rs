//! Error types for volley-batch

use std::time::Duration;

use thiserror::Error;

/// Result type alias using volley-batch Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while running a batch job against a provider
#[derive(Error, Debug)]
pub enum Error {
    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Failed to read or write a local artifact file
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// API returned an error response
    #[error("API error: {message} (type: {error_type})")]
    Api { error_type: String, message: String },

    /// Invalid or missing API key
    #[error("Invalid or missing API key")]
    InvalidApiKey,

    /// A polling loop exhausted its attempt budget
    #[error("{stage} did not reach a terminal state after {waited_for:?}")]
    PollTimeout { stage: &'static str, waited_for: Duration },

    /// The remote job finished with an error artifact
    #[error("batch job failed: {detail}")]
    Failed { detail: String },

    /// Completed job reported neither an output nor an error artifact
    #[error("batch {batch_id} completed with neither output nor error artifact")]
    MissingOutput { batch_id: String },

    /// An output line carried no choices for a request
    #[error("empty choices in batch output for request {custom_id}")]
    EmptyChoices { custom_id: String },
}

impl Error {
    /// Create an API error from type and message
    pub fn api(error_type: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Api {
            error_type: error_type.into(),
            message: message.into(),
        }
    }

    /// Check if this error is transient from the caller's point of view.
    ///
    /// A status poll that fails with a network or server-side error can be
    /// retried on the next tick; a failed or inconsistent job cannot.
    pub fn is_transient(&self) -> bool {
        match self {
            Error::Http(_) => true,
            Error::Api { error_type, message } => {
                let et = error_type.to_lowercase();
                let msg = message.to_lowercase();
                et.contains("rate_limit")
                    || et.contains("overloaded")
                    || msg.contains("rate limit")
                    || msg.contains("overloaded")
                    || msg.contains("too many requests")
                    || msg.contains("timeout")
            }
            _ => false,
        }
    }
}
