//! Turn orchestration: one batch job per turn, merged back into the store

use std::path::PathBuf;
use std::sync::Arc;

use volley_batch::{BatchJob, BatchProvider, BatchRequestItem, ChatMessage, PollPolicy};

use crate::{
    error::Result,
    store::ConversationStore,
};

/// Settings for one evaluation run
#[derive(Debug, Clone)]
pub struct RunSettings {
    /// Model name submitted with every request
    pub model: String,
    /// Completion token limit per request
    pub max_tokens: u32,
    /// Root directory for run artifacts
    pub log_root: PathBuf,
    /// Provider-defined completion window, passed through opaquely
    pub completion_window: String,
    /// Polling configuration for the batch lifecycle
    pub poll: PollPolicy,
}

/// Drives N turns of batch submission and merging.
///
/// The run directory (`log_root/model/timestamp`) is fixed at
/// construction so every turn's input artifact and the final transcripts
/// land in the same place.
pub struct Orchestrator {
    job: BatchJob,
    store: ConversationStore,
    settings: RunSettings,
    run_dir: PathBuf,
}

impl Orchestrator {
    /// Create an orchestrator and its run directory.
    ///
    /// The timestamp component is captured once here and is stable across
    /// all turns of the run.
    pub fn new(
        provider: Arc<dyn BatchProvider>,
        store: ConversationStore,
        settings: RunSettings,
    ) -> Result<Self> {
        let timestamp = chrono::Local::now().format("%Y-%m-%d_%H-%M-%S").to_string();
        let run_dir = settings.log_root.join(&settings.model).join(timestamp);
        std::fs::create_dir_all(&run_dir)?;

        let job = BatchJob::new(provider, settings.poll.clone())
            .with_completion_window(&settings.completion_window);

        Ok(Self {
            job,
            store,
            settings,
            run_dir,
        })
    }

    /// Directory holding this run's artifacts
    pub fn run_dir(&self) -> &PathBuf {
        &self.run_dir
    }

    /// Current conversation state
    pub fn store(&self) -> &ConversationStore {
        &self.store
    }

    /// Run `turns` full cycles, appending `follow_up` as a user message
    /// to every conversation after each merge.
    ///
    /// Any batch lifecycle error aborts the run; messages merged during
    /// earlier turns stay in the store and remain valid for persistence.
    pub async fn run(&mut self, turns: usize, follow_up: &str) -> Result<()> {
        for turn in 0..turns {
            self.run_turn(turn).await?;
            self.store.append_all(&ChatMessage::user(follow_up));
        }
        Ok(())
    }

    async fn run_turn(&mut self, turn: usize) -> Result<()> {
        let snapshot = self.store.snapshot();
        let requests: Vec<BatchRequestItem> = snapshot
            .into_iter()
            .map(|(custom_id, messages)| BatchRequestItem {
                custom_id,
                model: self.settings.model.clone(),
                messages,
                max_tokens: self.settings.max_tokens,
            })
            .collect();

        let input_path = self.run_dir.join(format!("turn{turn}.jsonl"));
        let results = self.job.execute(turn, &requests, &input_path).await?;

        // A provider may omit lines for requests that failed individually,
        // so fewer results than requests is normal. An identifier we never
        // submitted is not.
        tracing::info!(
            turn,
            requests = requests.len(),
            results = results.len(),
            "merging turn results"
        );
        for result in results {
            self.store.append(&result.custom_id, result.message)?;
        }
        Ok(())
    }
}
