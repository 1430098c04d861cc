// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Model envelope parsing.
//!
//! The model is instructed to return `{"actions": [...], "reasoning": "..."}`
//! but real replies arrive bare, fenced, or buried in prose. Parsing never
//! fails: every malformed shape coerces to a single `done{success:false}`
//! whose reason the driver's no-response retry recognizes.

use serde::Deserialize;
use serde_json::Value;

use crate::action::Action;

/// A parsed batch of requested actions.
#[derive(Clone, Debug, PartialEq)]
pub struct ModelBatch {
    pub actions: Vec<Action>,
    pub reasoning: String,
}

impl ModelBatch {
    fn failure(reason: impl Into<String>) -> Self {
        Self {
            actions: vec![Action::failed_done(reason)],
            reasoning: String::new(),
        }
    }

    /// Whether this batch is a coerced parse failure the driver should retry.
    pub fn is_retryable_failure(&self) -> bool {
        if self.actions.len() != 1 {
            return false;
        }
        match &self.actions[0] {
            Action::Done {
                success: false,
                reason,
            } => {
                reason.starts_with("No response")
                    || reason.starts_with("Failed to parse")
                    || reason.starts_with("Unknown action")
            }
            _ => false,
        }
    }
}

#[derive(Deserialize)]
struct RawEnvelope {
    actions: Vec<Value>,
    #[serde(default)]
    reasoning: String,
}

/// Parse raw model text into an action batch. Total: always returns a batch.
pub fn parse_batch(raw: &str) -> ModelBatch {
    let raw = raw.trim();
    if raw.is_empty() {
        return ModelBatch::failure("No response from model");
    }

    let envelope = match extract_envelope(raw) {
        Some(envelope) => envelope,
        None => {
            return ModelBatch::failure(format!(
                "Failed to parse model response: {}",
                snippet(raw)
            ))
        }
    };

    if envelope.actions.is_empty() {
        return ModelBatch {
            actions: vec![Action::failed_done("No actions returned")],
            reasoning: envelope.reasoning,
        };
    }

    let mut actions = Vec::with_capacity(envelope.actions.len());
    for value in envelope.actions {
        match serde_json::from_value::<Action>(value.clone()) {
            Ok(action) => actions.push(action),
            Err(_) => {
                // The rest of the batch is suspect once one action is
                // unparseable; truncate here.
                actions = vec![Action::failed_done(format!(
                    "Unknown action: {}",
                    snippet(&value.to_string())
                ))];
                break;
            }
        }
    }

    ModelBatch {
        actions,
        reasoning: envelope.reasoning,
    }
}

/// Find the JSON envelope in raw text: bare JSON, a fenced ```json block, or
/// the longest balanced `{...}` substring containing an `"actions"` key.
fn extract_envelope(raw: &str) -> Option<RawEnvelope> {
    extract_object(raw, "actions")
}

/// Generic envelope extraction: whole-string JSON, fenced blocks, then the
/// longest balanced object containing `required_key`. Shared with the
/// rewrite tier, whose envelope uses a different discriminant key.
pub(crate) fn extract_object<T: serde::de::DeserializeOwned>(
    raw: &str,
    required_key: &str,
) -> Option<T> {
    if let Ok(value) = serde_json::from_str::<T>(raw) {
        return Some(value);
    }

    for block in fenced_blocks(raw) {
        if let Ok(value) = serde_json::from_str::<T>(block) {
            return Some(value);
        }
    }

    let needle = format!("\"{}\"", required_key);
    let mut candidates = balanced_objects(raw);
    candidates.sort_by_key(|s| std::cmp::Reverse(s.len()));
    candidates
        .into_iter()
        .filter(|s| s.contains(&needle))
        .find_map(|s| serde_json::from_str::<T>(s).ok())
}

/// Contents of ``` fenced blocks, with an optional language tag stripped.
fn fenced_blocks(raw: &str) -> Vec<&str> {
    let mut blocks = Vec::new();
    let mut rest = raw;
    while let Some(start) = rest.find("```") {
        let after = &rest[start + 3..];
        let body_start = after.find('\n').map(|i| i + 1).unwrap_or(0);
        let body = &after[body_start..];
        match body.find("```") {
            Some(end) => {
                blocks.push(body[..end].trim());
                rest = &body[end + 3..];
            }
            None => break,
        }
    }
    blocks
}

/// All balanced top-level `{...}` substrings, respecting JSON string quoting.
fn balanced_objects(raw: &str) -> Vec<&str> {
    let bytes = raw.as_bytes();
    let mut objects = Vec::new();
    let mut start: Option<usize> = None;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, &b) in bytes.iter().enumerate() {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }
        match b {
            b'"' if depth > 0 => in_string = true,
            b'{' => {
                if depth == 0 {
                    start = Some(i);
                }
                depth += 1;
            }
            b'}' => {
                if depth > 0 {
                    depth -= 1;
                    if depth == 0 {
                        if let Some(s) = start.take() {
                            objects.push(&raw[s..=i]);
                        }
                    }
                }
            }
            _ => {}
        }
    }
    objects
}

fn snippet(raw: &str) -> String {
    let mut s: String = raw.chars().take(120).collect();
    if raw.chars().count() > 120 {
        s.push('…');
    }
    s
}

#[cfg(test)]
#[path = "parse_tests.rs"]
mod tests;
