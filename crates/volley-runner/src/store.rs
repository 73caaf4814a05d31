//! Conversation store: identifier-keyed transcripts, append-only

use std::collections::HashMap;

use volley_batch::ChatMessage;

use crate::error::{Error, Result};

/// In-memory ordered set of conversation transcripts.
///
/// The identifier space is fixed at seed time: records are only ever
/// mutated by appending messages, never reordered or removed. Access is
/// single-threaded and strictly sequential.
#[derive(Debug, Default)]
pub struct ConversationStore {
    /// Seed order, preserved for snapshots and persistence
    order: Vec<String>,
    /// Identifier -> transcript
    records: HashMap<String, Vec<ChatMessage>>,
}

impl ConversationStore {
    /// Build a store from (identifier, initial transcript) pairs.
    ///
    /// Identifiers must be unique.
    pub fn seed(pairs: Vec<(String, Vec<ChatMessage>)>) -> Result<Self> {
        let mut store = Self::default();
        for (id, messages) in pairs {
            if store.records.contains_key(&id) {
                return Err(Error::DuplicateIdentifier(id));
            }
            store.order.push(id.clone());
            store.records.insert(id, messages);
        }
        Ok(store)
    }

    /// Append a message to the record with the given identifier.
    ///
    /// The store is left untouched when the identifier is unknown.
    pub fn append(&mut self, id: &str, message: ChatMessage) -> Result<()> {
        match self.records.get_mut(id) {
            Some(messages) => {
                messages.push(message);
                Ok(())
            }
            None => Err(Error::UnknownIdentifier(id.to_string())),
        }
    }

    /// Append the same message to every record (the per-turn follow-up)
    pub fn append_all(&mut self, message: &ChatMessage) {
        for id in &self.order {
            if let Some(messages) = self.records.get_mut(id) {
                messages.push(message.clone());
            }
        }
    }

    /// Ordered, cloned view of the current state.
    ///
    /// Later mutations do not affect a snapshot already taken.
    pub fn snapshot(&self) -> Vec<(String, Vec<ChatMessage>)> {
        self.order
            .iter()
            .map(|id| (id.clone(), self.records[id].clone()))
            .collect()
    }

    /// Number of tracked conversations
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
