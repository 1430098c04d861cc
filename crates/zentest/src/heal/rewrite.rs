// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! The rewrite tier: ask a model to repair a single failing test in place.
//!
//! The failing test block is located by its quoted name and brace-balanced
//! body, not by indentation, so hand-edited script files still splice. The
//! model returns a discriminated result: a new test body, or a decision to
//! escalate to a full agentic rerun.

use std::sync::Arc;

use serde::Deserialize;

use crate::model::parse::extract_object;
use crate::model::{ModelClient, ModelRequest};
use crate::script::locator::escape;

/// What the rewrite model decided.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(tag = "decision", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RewriteDecision {
    /// Replace the failing test's body with `new_test_body`.
    Rewrite {
        #[serde(default)]
        reasoning: String,
        new_test_body: String,
    },
    /// The page changed too much; rerun the suite agentically.
    Agentic {
        #[serde(default)]
        reasoning: String,
    },
}

/// Everything the rewrite model sees.
pub struct RewriteRequest<'a> {
    pub test_name: &'a str,
    pub test_code: &'a str,
    pub script: &'a str,
    pub error_message: &'a str,
    pub stack: Option<&'a str>,
    pub screenshot: Option<Vec<u8>>,
}

/// Drives the rewrite-oriented model call.
pub struct Rewriter {
    model: Arc<dyn ModelClient>,
}

const SYSTEM_PROMPT: &str = r#"You repair Playwright end-to-end tests after small UI changes. You get one failing test, the full spec file for context, the runner's error, and a screenshot of the page at the failure.

Reply with ONLY a JSON object, one of:
  {"decision":"REWRITE","reasoning":"...","new_test_body":"..."} — when a changed locator, label, or small flow tweak fixes the test. new_test_body is the statements inside the test function, one per line, no wrapping braces.
  {"decision":"AGENTIC","reasoning":"..."} — when the page changed too much for a local fix (new flow, moved feature, redesigned layout).

Keep working statements unchanged; change only what the error implicates."#;

impl Rewriter {
    pub fn new(model: Arc<dyn ModelClient>) -> Self {
        Self { model }
    }

    /// Ask the model to repair the failing test. Transport failures and
    /// unparseable replies escalate as `Agentic`.
    pub async fn propose(&self, request: &RewriteRequest<'_>) -> RewriteDecision {
        let user_text = build_user_text(request);
        let model_request = ModelRequest {
            system: SYSTEM_PROMPT.to_string(),
            user_text,
            image_png: request.screenshot.clone(),
        };
        match self.model.next(&model_request).await {
            Ok(reply) => parse_decision(&reply.raw_text).unwrap_or(RewriteDecision::Agentic {
                reasoning: "rewrite reply could not be parsed".to_string(),
            }),
            Err(e) => RewriteDecision::Agentic {
                reasoning: format!("rewrite model call failed: {}", e),
            },
        }
    }
}

fn build_user_text(request: &RewriteRequest<'_>) -> String {
    let mut text = format!(
        "Failing test: {name}\n\nError:\n{error}\n",
        name = request.test_name,
        error = request.error_message,
    );
    if let Some(stack) = request.stack {
        text.push_str(&format!("\nStack:\n{}\n", stack));
    }
    text.push_str(&format!(
        "\nFailing test code:\n{code}\n\nFull spec file:\n{script}\n",
        code = request.test_code,
        script = request.script,
    ));
    text
}

/// Parse the model's discriminated reply.
pub fn parse_decision(raw: &str) -> Option<RewriteDecision> {
    extract_object(raw, "decision")
}

/// A located test block inside a spec file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TestBlock {
    /// Byte range of the body between (exclusive) the braces.
    pub body_start: usize,
    pub body_end: usize,
}

impl TestBlock {
    pub fn body<'a>(&self, script: &'a str) -> &'a str {
        &script[self.body_start..self.body_end]
    }
}

/// Locate `test('<name>', ...)` and the byte range of its brace-balanced
/// body. Indentation-agnostic by construction.
pub fn find_test_block(script: &str, test_name: &str) -> Option<TestBlock> {
    let needle = format!("test('{}'", escape(test_name));
    let test_start = script.find(&needle)?;

    // First opening brace after the test header is the function body.
    let rest = &script[test_start..];
    let open_rel = rest.find('{')?;
    let open = test_start + open_rel;

    let close = matching_brace(script, open)?;
    Some(TestBlock {
        body_start: open + 1,
        body_end: close,
    })
}

/// Index of the `}` matching the `{` at `open`, respecting string literals.
fn matching_brace(script: &str, open: usize) -> Option<usize> {
    let bytes = script.as_bytes();
    let mut depth = 0usize;
    let mut in_string: Option<u8> = None;
    let mut escaped = false;

    for (offset, &b) in bytes[open..].iter().enumerate() {
        let i = open + offset;
        if let Some(quote) = in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == quote {
                in_string = None;
            }
            continue;
        }
        match b {
            b'\'' | b'"' | b'`' => in_string = Some(b),
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Replace the failing test's body with `new_body`, re-indented to the
/// script's test-body level. `None` when the test cannot be located.
pub fn splice_test_body(script: &str, test_name: &str, new_body: &str) -> Option<String> {
    let block = find_test_block(script, test_name)?;
    let mut body = String::from("\n");
    for line in new_body.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        body.push_str("    ");
        body.push_str(line);
        body.push('\n');
    }
    body.push_str("  ");

    let mut result = String::with_capacity(script.len() + body.len());
    result.push_str(&script[..block.body_start]);
    result.push_str(&body);
    result.push_str(&script[block.body_end..]);
    Some(result)
}

#[cfg(test)]
#[path = "rewrite_tests.rs"]
mod tests;
