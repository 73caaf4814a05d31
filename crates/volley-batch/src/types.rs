//! Core types for batch chat-completion requests

use serde::{Deserialize, Serialize};

/// Message roles understood by the chat-completion endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One entry in a conversation transcript
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    /// Create a system message
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    /// Create a user message
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Create an assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// One request inside a batch input artifact.
///
/// Ephemeral: built from a conversation snapshot at the start of a turn,
/// serialized into the input artifact, and discarded.
#[derive(Debug, Clone)]
pub struct BatchRequestItem {
    /// Stable identifier linking the request back to its conversation
    pub custom_id: String,
    /// Model to run the request against
    pub model: String,
    /// Full message history at snapshot time
    pub messages: Vec<ChatMessage>,
    /// Completion token limit
    pub max_tokens: u32,
}

/// One parsed line of a batch output artifact
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchResultItem {
    /// Identifier of the conversation the response belongs to
    pub custom_id: String,
    /// The assistant message produced for that conversation
    pub message: ChatMessage,
}

/// Handle to a file-like artifact held by the provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileId(pub String);

impl std::fmt::Display for FileId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Handle to a provider-managed batch job
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BatchId(pub String);

impl std::fmt::Display for BatchId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Remote batch job status as reported by the provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchStatus {
    Validating,
    InProgress,
    Finalizing,
    Completed,
    Failed,
    Expired,
    Cancelling,
    Cancelled,
    /// Status string this client does not know about
    #[serde(untagged)]
    Other(String),
}

impl BatchStatus {
    /// Whether the job will make no further progress
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            BatchStatus::Completed
                | BatchStatus::Failed
                | BatchStatus::Expired
                | BatchStatus::Cancelled
        )
    }

    /// Whether a terminal job ended without usable output
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            BatchStatus::Failed | BatchStatus::Expired | BatchStatus::Cancelled
        )
    }
}

impl std::fmt::Display for BatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BatchStatus::Validating => write!(f, "validating"),
            BatchStatus::InProgress => write!(f, "in_progress"),
            BatchStatus::Finalizing => write!(f, "finalizing"),
            BatchStatus::Completed => write!(f, "completed"),
            BatchStatus::Failed => write!(f, "failed"),
            BatchStatus::Expired => write!(f, "expired"),
            BatchStatus::Cancelling => write!(f, "cancelling"),
            BatchStatus::Cancelled => write!(f, "cancelled"),
            BatchStatus::Other(s) => write!(f, "{s}"),
        }
    }
}
