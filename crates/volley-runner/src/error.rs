//! Error types for volley-runner

use thiserror::Error;

/// Result type alias using volley-runner Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while seeding, merging, or persisting a run
#[derive(Error, Debug)]
pub enum Error {
    /// Two seed records share an identifier
    #[error("duplicate conversation identifier: {0}")]
    DuplicateIdentifier(String),

    /// A merge referenced an identifier absent from the store.
    ///
    /// This is a data-integrity mismatch between the request and response
    /// sets, never a normal branch.
    #[error("unknown conversation identifier: {0}")]
    UnknownIdentifier(String),

    /// An error from the batch layer
    #[error(transparent)]
    Batch(#[from] volley_batch::Error),

    /// Failed to create the run directory or write an artifact
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to encode transcripts for persistence
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
