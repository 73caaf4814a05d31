//! Final transcript persistence

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use serde::Serialize;
use volley_batch::ChatMessage;

use crate::{error::Result, store::ConversationStore};

#[derive(Debug, Serialize)]
struct TranscriptEntry<'a> {
    custom_id: &'a str,
    messages: &'a [ChatMessage],
}

/// Write the full store content to one structured JSON file.
///
/// Called opportunistically: also invoked after a failed run so that
/// turns merged before the failure are not lost.
pub fn write_transcripts(path: &Path, store: &ConversationStore) -> Result<()> {
    let snapshot = store.snapshot();
    let entries: Vec<TranscriptEntry> = snapshot
        .iter()
        .map(|(id, messages)| TranscriptEntry {
            custom_id: id,
            messages,
        })
        .collect();

    let file = File::create(path)?;
    serde_json::to_writer_pretty(BufWriter::new(file), &entries)?;
    tracing::info!(path = %path.display(), conversations = entries.len(), "wrote transcripts");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_transcripts_roundtrip() {
        let store = ConversationStore::seed(vec![(
            "behavior-1".into(),
            vec![
                ChatMessage::system("You are a helpful assistant."),
                ChatMessage::user("hello"),
                ChatMessage::assistant("hi there"),
            ],
        )])
        .unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("transcripts.json");
        write_transcripts(&path, &store).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value.as_array().unwrap().len(), 1);
        assert_eq!(value[0]["custom_id"], "behavior-1");
        assert_eq!(value[0]["messages"][2]["role"], "assistant");
        assert_eq!(value[0]["messages"][2]["content"], "hi there");
    }

    #[test]
    fn test_write_preserves_seed_order() {
        let store = ConversationStore::seed(vec![
            ("z".into(), vec![ChatMessage::user("1")]),
            ("a".into(), vec![ChatMessage::user("2")]),
        ])
        .unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("transcripts.json");
        write_transcripts(&path, &store).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value[0]["custom_id"], "z");
        assert_eq!(value[1]["custom_id"], "a");
    }
}
