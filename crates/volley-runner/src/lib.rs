//! volley-runner: multi-turn batch evaluation runtime
//!
//! Holds the per-conversation transcripts, drives one batch job per turn,
//! merges returned assistant messages back into the transcripts, and
//! persists the final state.

pub mod error;
pub mod orchestrator;
pub mod persist;
pub mod store;

pub use error::{Error, Result};
pub use orchestrator::{Orchestrator, RunSettings};
pub use store::ConversationStore;
