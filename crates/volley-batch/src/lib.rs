//! volley-batch: batch inference provider abstraction
//!
//! This crate wraps a hosted batch-inference API behind a narrow trait and
//! drives one batch job through its full lifecycle: build the input
//! artifact, upload it, create the remote job, poll until terminal, and
//! fetch the results.

pub mod error;
pub mod job;
pub mod jsonl;
pub mod provider;
pub mod providers;
pub mod types;

pub use error::{Error, Result};
pub use job::{BatchJob, PollPolicy};
pub use provider::{BatchProvider, BatchSnapshot};
pub use types::*;
