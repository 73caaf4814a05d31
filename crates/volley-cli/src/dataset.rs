//! Behavior dataset loading
//!
//! Reads the tabular behavior dataset and produces the initial
//! conversation seeds: a fixed system message plus the row's prompt,
//! keyed by the row's identifier column. Rows whose category column does
//! not match the configured filter value are skipped.

use std::path::Path;

use anyhow::{Context, bail};
use volley_batch::ChatMessage;

use crate::config::Columns;

/// Options for reading the dataset
#[derive(Debug, Clone)]
pub struct DatasetOptions {
    /// Category value a row must carry to be included
    pub category: String,
    /// System message seeded into every conversation
    pub system_prompt: String,
    /// Column names
    pub columns: Columns,
}

impl Default for DatasetOptions {
    fn default() -> Self {
        Self {
            category: "standard".to_string(),
            system_prompt: "You are a helpful assistant.".to_string(),
            columns: Columns::default(),
        }
    }
}

/// Load conversation seeds from a CSV file.
///
/// Returns (identifier, initial messages) pairs in file order.
pub fn load_behaviors(
    path: &Path,
    options: &DatasetOptions,
) -> anyhow::Result<Vec<(String, Vec<ChatMessage>)>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("failed to open dataset: {}", path.display()))?;

    let headers = reader.headers()?.clone();
    let prompt_idx = column_index(&headers, &options.columns.prompt)?;
    let category_idx = column_index(&headers, &options.columns.category)?;
    let identifier_idx = column_index(&headers, &options.columns.identifier)?;

    let mut seeds = Vec::new();
    for record in reader.records() {
        let record = record?;
        if record.get(category_idx) != Some(options.category.as_str()) {
            continue;
        }
        let line = record.position().map(|p| p.line()).unwrap_or(0);
        let prompt = record
            .get(prompt_idx)
            .with_context(|| format!("row {line} has no prompt column"))?;
        let identifier = record
            .get(identifier_idx)
            .with_context(|| format!("row {line} has no identifier column"))?;

        seeds.push((
            identifier.to_string(),
            vec![
                ChatMessage::system(&options.system_prompt),
                ChatMessage::user(prompt),
            ],
        ));
    }

    tracing::info!(
        path = %path.display(),
        conversations = seeds.len(),
        category = %options.category,
        "loaded behavior dataset"
    );
    Ok(seeds)
}

fn column_index(headers: &csv::StringRecord, name: &str) -> anyhow::Result<usize> {
    match headers.iter().position(|h| h == name) {
        Some(idx) => Ok(idx),
        None => bail!("dataset is missing column '{name}'"),
    }
}
