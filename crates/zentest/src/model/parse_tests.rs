// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::action::Action;

#[test]
fn test_bare_json() {
    let batch = parse_batch(
        r#"{"actions":[{"type":"click_button","name":"Sign In"}],"reasoning":"log in"}"#,
    );
    assert_eq!(batch.reasoning, "log in");
    assert_eq!(
        batch.actions,
        vec![Action::ClickButton {
            name: "Sign In".to_string(),
            exact: None,
        }]
    );
}

#[test]
fn test_fenced_json_block() {
    let raw = "Here is my plan:\n```json\n{\"actions\":[{\"type\":\"wait\",\"ms\":500}],\"reasoning\":\"settle\"}\n```\nDone.";
    let batch = parse_batch(raw);
    assert_eq!(batch.actions, vec![Action::Wait { ms: 500 }]);
    assert_eq!(batch.reasoning, "settle");
}

#[test]
fn test_fenced_block_without_language_tag() {
    let raw = "```\n{\"actions\":[{\"type\":\"wait\",\"ms\":100}]}\n```";
    let batch = parse_batch(raw);
    assert_eq!(batch.actions, vec![Action::Wait { ms: 100 }]);
}

#[test]
fn test_embedded_object_in_prose() {
    let raw = r#"I'll click the button now. {"actions":[{"type":"click","x":10,"y":20}],"reasoning":"go"} Hope that works."#;
    let batch = parse_batch(raw);
    assert_eq!(
        batch.actions,
        vec![Action::Click {
            x: 10,
            y: 20,
            button: None,
        }]
    );
}

#[test]
fn test_longest_balanced_object_wins() {
    // A smaller {...} appears first; the envelope is the larger one.
    let raw = r#"{"note":"ignore me"} and then {"actions":[{"type":"wait","ms":1}],"reasoning":"the real one"}"#;
    let batch = parse_batch(raw);
    assert_eq!(batch.reasoning, "the real one");
}

#[test]
fn test_braces_inside_strings_do_not_break_balance() {
    let raw = r#"{"actions":[{"type":"type","text":"curly { brace } soup"}],"reasoning":"x"}"#;
    let batch = parse_batch(raw);
    assert_eq!(
        batch.actions,
        vec![Action::Type {
            text: "curly { brace } soup".to_string(),
        }]
    );
}

#[test]
fn test_empty_input() {
    let batch = parse_batch("   ");
    assert!(batch.is_retryable_failure());
    assert_eq!(
        batch.actions,
        vec![Action::failed_done("No response from model")]
    );
}

#[test]
fn test_unparseable_input() {
    let batch = parse_batch("I cannot help with that.");
    assert!(batch.is_retryable_failure());
    match &batch.actions[0] {
        Action::Done { success, reason } => {
            assert!(!success);
            assert!(reason.starts_with("Failed to parse"));
        }
        other => panic!("expected done, got {:?}", other),
    }
}

#[test]
fn test_empty_actions_coerces_to_done() {
    let batch = parse_batch(r#"{"actions":[],"reasoning":"hmm"}"#);
    assert_eq!(
        batch.actions,
        vec![Action::failed_done("No actions returned")]
    );
    assert_eq!(batch.reasoning, "hmm");
    // "No actions returned" is not a retryable parse failure
    assert!(!batch.is_retryable_failure());
}

#[test]
fn test_unknown_action_coerces_and_truncates() {
    let raw = r#"{"actions":[{"type":"click","x":1,"y":2},{"type":"teleport"},{"type":"wait","ms":5}],"reasoning":"x"}"#;
    let batch = parse_batch(raw);
    assert_eq!(batch.actions.len(), 1);
    match &batch.actions[0] {
        Action::Done { success, reason } => {
            assert!(!success);
            assert!(reason.starts_with("Unknown action"));
            assert!(reason.contains("teleport"));
        }
        other => panic!("expected done, got {:?}", other),
    }
    assert!(batch.is_retryable_failure());
}

#[test]
fn test_missing_reasoning_defaults_empty() {
    let batch = parse_batch(r#"{"actions":[{"type":"wait","ms":1}]}"#);
    assert_eq!(batch.reasoning, "");
}

#[test]
fn test_multi_action_batch_is_not_retryable() {
    let raw = r#"{"actions":[{"type":"wait","ms":1},{"type":"done","success":false,"reason":"No response from model"}]}"#;
    let batch = parse_batch(raw);
    assert!(!batch.is_retryable_failure());
}
