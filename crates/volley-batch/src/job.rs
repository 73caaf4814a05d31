//! One turn's batch job lifecycle
//!
//! build input artifact -> upload -> confirm upload -> create job ->
//! poll until terminal -> fetch output. The two polling loops are the
//! only suspension points; both are bounded by [`PollPolicy`] so a hung
//! remote job surfaces as [`Error::PollTimeout`] instead of blocking
//! forever.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::{
    error::{Error, Result},
    jsonl,
    provider::{BatchProvider, BatchSnapshot},
    types::{BatchRequestItem, BatchResultItem, FileId},
};

/// Polling configuration for the upload and status loops
#[derive(Debug, Clone)]
pub struct PollPolicy {
    /// Delay between upload-confirmation checks
    pub upload_interval: Duration,
    /// Delay between job-status checks
    pub status_interval: Duration,
    /// Maximum checks per loop before giving up
    pub max_attempts: u32,
    /// Consecutive transient poll failures tolerated before escalating
    pub max_transient_failures: u32,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            upload_interval: Duration::from_secs(5),
            status_interval: Duration::from_secs(10),
            // 24h of status polls at the default interval
            max_attempts: 8640,
            max_transient_failures: 5,
        }
    }
}

/// Executes complete batch cycles against a provider
pub struct BatchJob {
    provider: Arc<dyn BatchProvider>,
    policy: PollPolicy,
    completion_window: String,
}

impl BatchJob {
    pub fn new(provider: Arc<dyn BatchProvider>, policy: PollPolicy) -> Self {
        Self {
            provider,
            policy,
            completion_window: "24h".to_string(),
        }
    }

    /// Override the provider-defined completion window (opaque, e.g. "24h")
    pub fn with_completion_window(mut self, window: impl Into<String>) -> Self {
        self.completion_window = window.into();
        self
    }

    /// Run one full cycle for a turn's worth of requests.
    ///
    /// The input artifact is also written to `input_path` so the run
    /// leaves one `turn{N}.jsonl` per turn on disk. Returns the parsed
    /// results, which may cover fewer identifiers than were submitted.
    pub async fn execute(
        &self,
        turn: usize,
        requests: &[BatchRequestItem],
        input_path: &Path,
    ) -> Result<Vec<BatchResultItem>> {
        let bytes = jsonl::encode_requests(requests)?;
        std::fs::write(input_path, &bytes)?;

        let filename = input_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| format!("turn{turn}.jsonl"));

        tracing::info!(turn, requests = requests.len(), "submitting batch");
        let input_file = self.provider.upload_input(&filename, bytes).await?;
        self.wait_for_upload(&input_file).await?;

        let batch_id = self
            .provider
            .create_batch(
                &input_file,
                jsonl::CHAT_COMPLETIONS_URL,
                &self.completion_window,
                &format!("turn {turn}"),
            )
            .await?;
        tracing::info!(turn, batch = %batch_id, "batch job created");

        let snapshot = self.wait_for_terminal(&batch_id).await?;
        self.fetch_results(snapshot).await
    }

    async fn wait_for_upload(&self, file: &FileId) -> Result<()> {
        for _ in 0..self.policy.max_attempts {
            if self.provider.input_ready(file).await? {
                return Ok(());
            }
            tracing::debug!(file = %file, "waiting for input artifact");
            tokio::time::sleep(self.policy.upload_interval).await;
        }
        Err(Error::PollTimeout {
            stage: "input upload",
            waited_for: self.policy.upload_interval * self.policy.max_attempts,
        })
    }

    async fn wait_for_terminal(&self, batch: &crate::types::BatchId) -> Result<BatchSnapshot> {
        let mut transient_failures = 0u32;
        for _ in 0..self.policy.max_attempts {
            match self.provider.batch_status(batch).await {
                Ok(snapshot) => {
                    transient_failures = 0;
                    tracing::debug!(batch = %batch, status = %snapshot.status, "batch status");
                    if snapshot.status.is_terminal() {
                        return Ok(snapshot);
                    }
                }
                Err(e) if e.is_transient() => {
                    transient_failures += 1;
                    if transient_failures > self.policy.max_transient_failures {
                        return Err(e);
                    }
                    tracing::warn!(
                        batch = %batch,
                        failures = transient_failures,
                        error = %e,
                        "status poll failed, will retry"
                    );
                }
                Err(e) => return Err(e),
            }
            tokio::time::sleep(self.policy.status_interval).await;
        }
        Err(Error::PollTimeout {
            stage: "batch status",
            waited_for: self.policy.status_interval * self.policy.max_attempts,
        })
    }

    async fn fetch_results(&self, snapshot: BatchSnapshot) -> Result<Vec<BatchResultItem>> {
        // Error artifact wins: a job can report completed while still
        // carrying per-request failures worth surfacing.
        if let Some(error_file) = &snapshot.error_file {
            let detail = self
                .provider
                .file_content(error_file)
                .await
                .unwrap_or_else(|e| format!("error artifact unavailable: {e}"));
            return Err(Error::Failed { detail });
        }

        if snapshot.status.is_failure() {
            return Err(Error::Failed {
                detail: format!("batch {} ended with status {}", snapshot.id, snapshot.status),
            });
        }

        match &snapshot.output_file {
            Some(output_file) => {
                let content = self.provider.file_content(output_file).await?;
                let results = jsonl::decode_results(&content)?;
                tracing::info!(batch = %snapshot.id, results = results.len(), "batch completed");
                Ok(results)
            }
            None => Err(Error::MissingOutput {
                batch_id: snapshot.id.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BatchId, BatchStatus, ChatMessage};
    use std::sync::Mutex;

    /// In-memory provider: scripted status sequence, canned artifacts.
    struct FakeProvider {
        pub uploads: Mutex<Vec<(String, Vec<u8>)>>,
        pub ready_after: u32,
        ready_checks: Mutex<u32>,
        pub statuses: Mutex<Vec<BatchSnapshot>>,
        pub output_content: Option<String>,
        pub error_content: Option<String>,
        pub status_errors: Mutex<Vec<Error>>,
    }

    impl FakeProvider {
        pub fn new(statuses: Vec<BatchSnapshot>) -> Self {
            Self {
                uploads: Mutex::new(Vec::new()),
                ready_after: 0,
                ready_checks: Mutex::new(0),
                statuses: Mutex::new(statuses),
                output_content: None,
                error_content: None,
                status_errors: Mutex::new(Vec::new()),
            }
        }

        pub fn snapshot(
            status: BatchStatus,
            output: Option<&str>,
            error: Option<&str>,
        ) -> BatchSnapshot {
            BatchSnapshot {
                id: BatchId("batch_test".into()),
                status,
                output_file: output.map(|s| FileId(s.into())),
                error_file: error.map(|s| FileId(s.into())),
            }
        }
    }

    #[async_trait::async_trait]
    impl BatchProvider for FakeProvider {
        async fn upload_input(&self, filename: &str, bytes: Vec<u8>) -> Result<FileId> {
            self.uploads.lock().unwrap().push((filename.into(), bytes));
            Ok(FileId("file_in".into()))
        }

        async fn input_ready(&self, _file: &FileId) -> Result<bool> {
            let mut checks = self.ready_checks.lock().unwrap();
            *checks += 1;
            Ok(*checks > self.ready_after)
        }

        async fn create_batch(
            &self,
            _input_file: &FileId,
            _endpoint: &str,
            _completion_window: &str,
            _description: &str,
        ) -> Result<BatchId> {
            Ok(BatchId("batch_test".into()))
        }

        async fn batch_status(&self, _batch: &BatchId) -> Result<BatchSnapshot> {
            if let Some(err) = self.status_errors.lock().unwrap().pop() {
                return Err(err);
            }
            let mut statuses = self.statuses.lock().unwrap();
            if statuses.len() > 1 {
                Ok(statuses.remove(0))
            } else {
                Ok(statuses[0].clone())
            }
        }

        async fn file_content(&self, file: &FileId) -> Result<String> {
            match file.0.as_str() {
                "file_out" => Ok(self.output_content.clone().unwrap_or_default()),
                "file_err" => Ok(self.error_content.clone().unwrap_or_default()),
                other => Err(Error::api("not_found", format!("no such file: {other}"))),
            }
        }
    }

    fn fast_policy() -> PollPolicy {
        PollPolicy {
            upload_interval: Duration::ZERO,
            status_interval: Duration::ZERO,
            max_attempts: 16,
            max_transient_failures: 2,
        }
    }

    fn request(id: &str) -> BatchRequestItem {
        BatchRequestItem {
            custom_id: id.into(),
            model: "gpt-4o-mini".into(),
            messages: vec![ChatMessage::user("hello")],
            max_tokens: 256,
        }
    }

    fn output_line(id: &str, content: &str) -> String {
        format!(
            r#"{{"custom_id":"{id}","response":{{"body":{{"choices":[{{"message":{{"role":"assistant","content":"{content}"}}}}]}}}}}}"#
        )
    }

    #[tokio::test]
    async fn test_completed_job_returns_results_and_writes_artifact() {
        let mut provider = FakeProvider::new(vec![
            FakeProvider::snapshot(BatchStatus::InProgress, None, None),
            FakeProvider::snapshot(BatchStatus::Completed, Some("file_out"), None),
        ]);
        provider.output_content = Some(format!(
            "{}\n{}\n",
            output_line("a", "alpha"),
            output_line("b", "beta")
        ));
        let provider = Arc::new(provider);

        let dir = tempfile::tempdir().unwrap();
        let input_path = dir.path().join("turn0.jsonl");
        let job = BatchJob::new(provider.clone(), fast_policy());

        let results = job
            .execute(0, &[request("a"), request("b")], &input_path)
            .await
            .unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].custom_id, "a");
        assert_eq!(results[1].message.content, "beta");

        // Input artifact on disk matches what was uploaded
        let on_disk = std::fs::read(&input_path).unwrap();
        let uploads = provider.uploads.lock().unwrap();
        assert_eq!(uploads.len(), 1);
        assert_eq!(uploads[0].0, "turn0.jsonl");
        assert_eq!(uploads[0].1, on_disk);
    }

    #[tokio::test]
    async fn test_upload_confirmation_polls_until_ready() {
        let mut provider = FakeProvider::new(vec![FakeProvider::snapshot(
            BatchStatus::Completed,
            Some("file_out"),
            None,
        )]);
        provider.ready_after = 3;
        provider.output_content = Some(output_line("a", "ok"));
        let provider = Arc::new(provider);

        let dir = tempfile::tempdir().unwrap();
        let job = BatchJob::new(provider, fast_policy());
        let results = job
            .execute(0, &[request("a")], &dir.path().join("turn0.jsonl"))
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
    }

    #[tokio::test]
    async fn test_upload_never_ready_times_out() {
        let mut provider = FakeProvider::new(vec![FakeProvider::snapshot(
            BatchStatus::Completed,
            Some("file_out"),
            None,
        )]);
        provider.ready_after = u32::MAX;
        let provider = Arc::new(provider);

        let dir = tempfile::tempdir().unwrap();
        let job = BatchJob::new(provider, fast_policy());
        let err = job
            .execute(0, &[request("a")], &dir.path().join("turn0.jsonl"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::PollTimeout { stage, .. } if stage == "input upload"));
    }

    #[tokio::test]
    async fn test_error_artifact_fails_with_payload() {
        let mut provider = FakeProvider::new(vec![FakeProvider::snapshot(
            BatchStatus::Completed,
            Some("file_out"),
            Some("file_err"),
        )]);
        provider.error_content = Some("request a: invalid model".into());
        let provider = Arc::new(provider);

        let dir = tempfile::tempdir().unwrap();
        let job = BatchJob::new(provider, fast_policy());
        let err = job
            .execute(0, &[request("a")], &dir.path().join("turn0.jsonl"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Failed { detail } if detail.contains("invalid model")));
    }

    #[tokio::test]
    async fn test_completed_without_artifacts_is_invariant_violation() {
        let provider = Arc::new(FakeProvider::new(vec![FakeProvider::snapshot(
            BatchStatus::Completed,
            None,
            None,
        )]));

        let dir = tempfile::tempdir().unwrap();
        let job = BatchJob::new(provider, fast_policy());
        let err = job
            .execute(0, &[request("a")], &dir.path().join("turn0.jsonl"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::MissingOutput { batch_id } if batch_id == "batch_test"));
    }

    #[tokio::test]
    async fn test_failed_status_without_error_file() {
        let provider = Arc::new(FakeProvider::new(vec![FakeProvider::snapshot(
            BatchStatus::Expired,
            None,
            None,
        )]));

        let dir = tempfile::tempdir().unwrap();
        let job = BatchJob::new(provider, fast_policy());
        let err = job
            .execute(0, &[request("a")], &dir.path().join("turn0.jsonl"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Failed { detail } if detail.contains("expired")));
    }

    #[tokio::test]
    async fn test_transient_status_failures_are_tolerated() {
        let mut provider = FakeProvider::new(vec![FakeProvider::snapshot(
            BatchStatus::Completed,
            Some("file_out"),
            None,
        )]);
        provider.output_content = Some(output_line("a", "ok"));
        provider.status_errors = Mutex::new(vec![
            Error::api("rate_limit_error", "slow down"),
            Error::api("error", "gateway timeout"),
        ]);
        let provider = Arc::new(provider);

        let dir = tempfile::tempdir().unwrap();
        let job = BatchJob::new(provider, fast_policy());
        let results = job
            .execute(0, &[request("a")], &dir.path().join("turn0.jsonl"))
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
    }

    #[tokio::test]
    async fn test_non_transient_status_failure_escalates() {
        let mut provider = FakeProvider::new(vec![FakeProvider::snapshot(
            BatchStatus::Completed,
            Some("file_out"),
            None,
        )]);
        provider.status_errors =
            Mutex::new(vec![Error::api("authentication_error", "key revoked")]);
        let provider = Arc::new(provider);

        let dir = tempfile::tempdir().unwrap();
        let job = BatchJob::new(provider, fast_policy());
        let err = job
            .execute(0, &[request("a")], &dir.path().join("turn0.jsonl"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Api { .. }));
    }

    #[tokio::test]
    async fn test_never_terminal_times_out() {
        let provider = Arc::new(FakeProvider::new(vec![FakeProvider::snapshot(
            BatchStatus::InProgress,
            None,
            None,
        )]));

        let dir = tempfile::tempdir().unwrap();
        let job = BatchJob::new(provider, fast_policy());
        let err = job
            .execute(0, &[request("a")], &dir.path().join("turn0.jsonl"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::PollTimeout { stage, .. } if stage == "batch status"));
    }
}
