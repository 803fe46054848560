//! Tool-result normalization and tool-routing extraction.
//!
//! Agent transcripts arrive from a runtime we do not control: tool
//! results may be structured JSON, a stringified language literal, or
//! plain prose, and message items carry no reliable type tags. This
//! module recovers two things from such a transcript, robustly:
//!
//! - the documents a retrieval tool returned ([`get_documents`]), and
//! - which tool categories were invoked ([`extract_tool_usage`]).
//!
//! Every function here is total: malformed input degrades to an empty or
//! best-effort result, never an error.

pub mod literal;

use serde_json::{json, Map, Value};

use crate::models::document::Document;
use crate::models::message::Transcript;
use crate::models::role::Role;

/// The retrieval tool whose results ground the agent's answers.
pub const DEFAULT_TARGET_TOOL: &str = "rag_tool";

/// Mapping keys searched, in priority order, for a nested document list.
const DOC_LIST_KEYS: [&str; 5] = [
    "documents",
    "docs",
    "results",
    "retrieved_documents",
    "retrieved_docs",
];

/// Keys searched, in priority order, for a document's content and
/// metadata. An explicit empty string under a content key wins; an
/// explicit null falls through like a missing key.
const CONTENT_KEYS: [&str; 3] = ["content", "text", "page_content"];
const METADATA_KEYS: [&str; 2] = ["meta", "metadata"];

/// Normalize an opaque tool-result payload into a canonical value.
///
/// Sequences and mappings pass through unchanged. Text is run through an
/// ordered chain of decoders (structured JSON first, then relaxed
/// literal syntax) and wrapped as a single raw-content record when both
/// reject it. Anything else is stringified and wrapped the same way.
pub fn parse_payload(payload: &Value) -> Value {
    match payload {
        Value::Array(_) | Value::Object(_) => payload.clone(),
        Value::String(text) => decode_text(text),
        other => wrap_raw(&other.to_string()),
    }
}

// The decoder strategies tried in order; the raw wrap below is the
// terminal fallback and always succeeds.
const DECODERS: [fn(&str) -> Option<Value>; 2] = [
    |s| serde_json::from_str(s).ok(),
    |s| literal::parse(s).ok(),
];

fn decode_text(text: &str) -> Value {
    let trimmed = text.trim();
    for decode in DECODERS {
        if let Some(value) = decode(trimmed) {
            return value;
        }
    }
    wrap_raw(trimmed)
}

fn wrap_raw(text: &str) -> Value {
    json!([{ "content": text }])
}

/// Normalize a canonical payload value into an ordered document list.
///
/// Mappings are searched for a nested document list under the usual
/// keys; a mapping with none of them is treated as a lone document-like
/// record. Sequence items become documents best-effort; scalar input
/// yields an empty list. Output order matches input order.
pub fn coerce_documents(value: &Value) -> Vec<Document> {
    match value {
        Value::Object(map) => {
            for key in DOC_LIST_KEYS {
                if let Some(Value::Array(items)) = map.get(key) {
                    return items.iter().map(document_from_item).collect();
                }
            }
            vec![document_from_item(value)]
        }
        Value::Array(items) => items.iter().map(document_from_item).collect(),
        _ => Vec::new(),
    }
}

fn document_from_item(item: &Value) -> Document {
    let Value::Object(map) = item else {
        return Document::new(stringify(item));
    };

    let content = CONTENT_KEYS
        .iter()
        .find_map(|key| map.get(*key).and_then(content_string))
        .unwrap_or_default();

    let metadata = METADATA_KEYS
        .iter()
        .find_map(|key| map.get(*key).and_then(Value::as_object))
        .cloned()
        .unwrap_or_else(Map::new);

    Document { content, metadata }
}

fn content_string(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Collect raw tool-result payloads from a transcript's tool-role
/// messages, ordered for consumption: payloads whose origin matches
/// `target_tool_name` come first, then the rest, each group in traversal
/// order.
pub fn extract_candidates<'a>(
    transcript: &'a Transcript,
    target_tool_name: &str,
) -> Vec<&'a Value> {
    let mut matching = Vec::new();
    let mut fallback = Vec::new();

    for message in &transcript.messages {
        if message.role != Role::Tool {
            continue;
        }
        for item in &message.content {
            let Some(response) = item.as_tool_response() else {
                continue;
            };
            let origin = response.origin.as_ref().map(|o| o.tool_name.as_str());
            if origin == Some(target_tool_name) {
                matching.push(&response.result);
            } else {
                fallback.push(&response.result);
            }
        }
    }

    matching.extend(fallback);
    matching
}

/// Extract the grounding documents a retrieval tool returned in this
/// transcript. Returns an empty list when the transcript holds no tool
/// results at all.
pub fn get_documents(transcript: &Transcript, target_tool_name: &str) -> Vec<Document> {
    let candidates = extract_candidates(transcript, target_tool_name);
    let Some(payload) = candidates.first() else {
        tracing::debug!(
            tool = target_tool_name,
            "no tool result payloads found in transcript"
        );
        return Vec::new();
    };
    coerce_documents(&parse_payload(payload))
}

/// Summarize which tool categories the transcript invoked, deduplicated
/// in first-seen order and joined with `" | "`. Returns `"none"` for a
/// transcript without messages or without tool calls.
pub fn extract_tool_usage(transcript: &Transcript) -> String {
    let mut categories: Vec<String> = Vec::new();

    for message in &transcript.messages {
        for item in &message.content {
            let Some(request) = item.as_tool_request() else {
                continue;
            };
            let category = normalize_tool_name(&request.tool_name);
            if !categories.contains(&category) {
                categories.push(category);
            }
        }
    }

    if categories.is_empty() {
        "none".to_string()
    } else {
        categories.join(" | ")
    }
}

fn normalize_tool_name(name: &str) -> String {
    if name.contains("context_retrieval") || name.contains(DEFAULT_TARGET_TOOL) {
        "rag".to_string()
    } else if name.contains("web_search") {
        "web_search".to_string()
    } else {
        name.to_string()
    }
}
