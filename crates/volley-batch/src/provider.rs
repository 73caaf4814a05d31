//! Provider abstraction for hosted batch-inference APIs

use async_trait::async_trait;

use crate::{
    error::Result,
    types::{BatchId, BatchStatus, FileId},
};

/// One status poll's view of a remote batch job
#[derive(Debug, Clone)]
pub struct BatchSnapshot {
    pub id: BatchId,
    pub status: BatchStatus,
    /// Set once the job has produced results
    pub output_file: Option<FileId>,
    /// Set when the job (or individual requests) failed
    pub error_file: Option<FileId>,
}

/// Narrow interface over the remote batch provider.
///
/// The job lifecycle and the orchestrator only ever talk to this trait,
/// so both are testable against an in-memory fake without network access.
#[async_trait]
pub trait BatchProvider: Send + Sync {
    /// Upload an input artifact; returns the provider's handle for it
    async fn upload_input(&self, filename: &str, bytes: Vec<u8>) -> Result<FileId>;

    /// Whether an uploaded artifact has been accepted and is usable
    async fn input_ready(&self, file: &FileId) -> Result<bool>;

    /// Create an asynchronous batch job over an uploaded artifact
    async fn create_batch(
        &self,
        input_file: &FileId,
        endpoint: &str,
        completion_window: &str,
        description: &str,
    ) -> Result<BatchId>;

    /// Query current job status
    async fn batch_status(&self, batch: &BatchId) -> Result<BatchSnapshot>;

    /// Fetch the content of an output or error artifact
    async fn file_content(&self, file: &FileId) -> Result<String>;
}
