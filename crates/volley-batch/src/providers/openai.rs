//! OpenAI Batch API provider
//!
//! Talks to the file-upload, batch-create, batch-status, and file-content
//! endpoints. Authentication is a bearer token supplied at construction.

use reqwest::multipart;
use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    provider::{BatchProvider, BatchSnapshot},
    types::{BatchId, BatchStatus, FileId},
};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// OpenAI Batch API client
pub struct OpenAIBatchProvider {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl OpenAIBatchProvider {
    /// Create a new provider with an API key
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Create from the `OPENAI_API_KEY` environment variable
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY").map_err(|_| Error::InvalidApiKey)?;
        Ok(Self::new(api_key))
    }

    /// Override the API base URL (gateways, test servers)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn auth_header(&self) -> String {
        format!("Bearer {}", self.api_key)
    }

    async fn check_status(&self, response: reqwest::Response) -> Result<reqwest::Response> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        Err(Error::api(format!("http_{}", status.as_u16()), text))
    }
}

#[async_trait::async_trait]
impl BatchProvider for OpenAIBatchProvider {
    async fn upload_input(&self, filename: &str, bytes: Vec<u8>) -> Result<FileId> {
        let form = multipart::Form::new().text("purpose", "batch").part(
            "file",
            multipart::Part::bytes(bytes)
                .file_name(filename.to_string())
                .mime_str("application/jsonl")?,
        );

        let response = self
            .client
            .post(format!("{}/files", self.base_url))
            .header("Authorization", self.auth_header())
            .multipart(form)
            .send()
            .await?;
        let file: FileObject = self.check_status(response).await?.json().await?;

        tracing::debug!(file_id = %file.id, %filename, "uploaded batch input");
        Ok(FileId(file.id))
    }

    async fn input_ready(&self, file: &FileId) -> Result<bool> {
        let response = self
            .client
            .get(format!("{}/files/{}", self.base_url, file))
            .header("Authorization", self.auth_header())
            .send()
            .await?;
        let file: FileObject = self.check_status(response).await?.json().await?;

        match file.status.as_deref() {
            Some("error") => Err(Error::api(
                "file_error",
                format!("input file {} was rejected by the provider", file.id),
            )),
            // Older API versions report "uploaded" then "processed"; newer
            // ones omit the field entirely once the file is usable.
            Some("processed") | Some("uploaded") | None => Ok(true),
            Some(_) => Ok(false),
        }
    }

    async fn create_batch(
        &self,
        input_file: &FileId,
        endpoint: &str,
        completion_window: &str,
        description: &str,
    ) -> Result<BatchId> {
        let request = CreateBatchRequest {
            input_file_id: input_file.0.as_str(),
            endpoint,
            completion_window,
            metadata: BatchMetadata { description },
        };

        let response = self
            .client
            .post(format!("{}/batches", self.base_url))
            .header("Authorization", self.auth_header())
            .json(&request)
            .send()
            .await?;
        let batch: BatchObject = self.check_status(response).await?.json().await?;

        tracing::debug!(batch_id = %batch.id, status = %batch.status, "created batch job");
        Ok(BatchId(batch.id))
    }

    async fn batch_status(&self, batch: &BatchId) -> Result<BatchSnapshot> {
        let response = self
            .client
            .get(format!("{}/batches/{}", self.base_url, batch))
            .header("Authorization", self.auth_header())
            .send()
            .await?;
        let batch: BatchObject = self.check_status(response).await?.json().await?;

        Ok(BatchSnapshot {
            id: BatchId(batch.id),
            status: batch.status,
            output_file: batch.output_file_id.map(FileId),
            error_file: batch.error_file_id.map(FileId),
        })
    }

    async fn file_content(&self, file: &FileId) -> Result<String> {
        let response = self
            .client
            .get(format!("{}/files/{}/content", self.base_url, file))
            .header("Authorization", self.auth_header())
            .send()
            .await?;
        Ok(self.check_status(response).await?.text().await?)
    }
}

// Wire types

#[derive(Debug, Deserialize)]
struct FileObject {
    id: String,
    #[serde(default)]
    status: Option<String>,
}

#[derive(Debug, Serialize)]
struct CreateBatchRequest<'a> {
    input_file_id: &'a str,
    endpoint: &'a str,
    completion_window: &'a str,
    metadata: BatchMetadata<'a>,
}

#[derive(Debug, Serialize)]
struct BatchMetadata<'a> {
    description: &'a str,
}

#[derive(Debug, Deserialize)]
struct BatchObject {
    id: String,
    status: BatchStatus,
    #[serde(default)]
    output_file_id: Option<String>,
    #[serde(default)]
    error_file_id: Option<String>,
}
