//! JSONL codecs for batch input and output artifacts
//!
//! The input artifact carries one request object per line; the output
//! artifact carries one response object per line. A provider may omit
//! lines for individual requests that failed, so output parsing never
//! assumes 1:1 cardinality with the submitted requests.

use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    types::{BatchRequestItem, BatchResultItem, ChatMessage},
};

/// Target endpoint recorded in every input-artifact line
pub const CHAT_COMPLETIONS_URL: &str = "/v1/chat/completions";

#[derive(Debug, Serialize)]
struct RequestLine<'a> {
    custom_id: &'a str,
    method: &'static str,
    url: &'static str,
    body: RequestBody<'a>,
}

#[derive(Debug, Serialize)]
struct RequestBody<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ResponseLine {
    custom_id: String,
    response: ResponseEnvelope,
}

#[derive(Debug, Deserialize)]
struct ResponseEnvelope {
    body: ResponseBody,
}

#[derive(Debug, Deserialize)]
struct ResponseBody {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChatMessage,
}

/// Serialize a set of requests into input-artifact bytes
pub fn encode_requests(requests: &[BatchRequestItem]) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    for request in requests {
        let line = RequestLine {
            custom_id: &request.custom_id,
            method: "POST",
            url: CHAT_COMPLETIONS_URL,
            body: RequestBody {
                model: &request.model,
                messages: &request.messages,
                max_tokens: request.max_tokens,
            },
        };
        serde_json::to_writer(&mut out, &line)?;
        out.push(b'\n');
    }
    Ok(out)
}

/// Parse output-artifact content into result items.
///
/// Each result carries the first choice's message. Blank lines are
/// skipped; a line with no choices at all is a protocol violation.
pub fn decode_results(content: &str) -> Result<Vec<BatchResultItem>> {
    let mut results = Vec::new();
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let parsed: ResponseLine = serde_json::from_str(line)?;
        let message = parsed
            .response
            .body
            .choices
            .into_iter()
            .next()
            .map(|c| c.message)
            .ok_or(Error::EmptyChoices {
                custom_id: parsed.custom_id.clone(),
            })?;
        results.push(BatchResultItem {
            custom_id: parsed.custom_id,
            message,
        });
    }
    Ok(results)
}
