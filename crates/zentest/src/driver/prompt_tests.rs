// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::config::Viewport;
use crate::step::StepMode;
use chrono::Utc;

fn step(action: Action, error: Option<&str>) -> RecordedStep {
    RecordedStep {
        action,
        reasoning: String::new(),
        element_info: None,
        screenshot: None,
        generated_code: None,
        error: error.map(str::to_string),
        timestamp: Utc::now(),
        mode: StepMode::Agentic,
    }
}

#[test]
fn test_system_prompt_pins_viewport_and_schema() {
    let prompt = system_prompt(
        Viewport {
            width: 1280,
            height: 720,
        },
        &[],
    );
    assert!(prompt.contains("1280x720 viewport"));
    assert!(prompt.contains(r#"{"actions": [...], "reasoning": "..."}"#));
    assert!(prompt.contains(r#"{"type":"click_button","name":"..."}"#));
    assert!(prompt.contains(r#"{"type":"done","success":true|false,"reason":"..."}"#));
    assert!(prompt.contains("Prefer click_button over click_text over select_input"));
    assert!(prompt.contains("\"menu\", \"icon\", or \"more\""));
    assert!(prompt.contains("(none yet)"));
}

#[test]
fn test_system_prompt_is_deterministic() {
    let viewport = Viewport {
        width: 800,
        height: 600,
    };
    assert_eq!(system_prompt(viewport, &[]), system_prompt(viewport, &[]));
}

#[test]
fn test_history_lines_number_and_outcome() {
    let history = vec![
        step(
            Action::ClickButton {
                name: "Sign In".to_string(),
                exact: None,
            },
            None,
        ),
        step(
            Action::AssertText {
                text: "Welcome".to_string(),
            },
            Some("assertion-failed: text not found: Welcome"),
        ),
    ];
    let summary = history_summary(&history);
    assert_eq!(
        summary,
        "1. click button \"Sign In\" — ok\n\
         2. assert text \"Welcome\" — failed: assertion-failed: text not found: Welcome"
    );
}

#[test]
fn test_history_truncates_to_last_twenty() {
    let history: Vec<RecordedStep> = (0u64..25)
        .map(|i| step(Action::Wait { ms: i }, None))
        .collect();
    let summary = history_summary(&history);
    assert!(summary.starts_with("(5 earlier actions omitted)"));
    assert!(!summary.contains("1. wait 0 ms"));
    assert!(summary.contains("6. wait 5 ms"));
    assert!(summary.contains("25. wait 24 ms"));
    assert_eq!(summary.lines().count(), 21);
}

#[test]
fn test_build_prompt_without_failure() {
    let prompt = build_prompt("log in with foo@example.com / hunter2", None);
    assert_eq!(
        prompt,
        "Test goal: log in with foo@example.com / hunter2\n\n\
         Look at the screenshot and reply with the next actions as JSON."
    );
}

#[test]
fn test_build_prompt_with_failure_prefix() {
    let prompt = build_prompt(
        "log in",
        Some("element-not-found: no button named \"Sign In\""),
    );
    assert!(prompt.starts_with(
        "Last instruction failed: element-not-found: no button named \"Sign In\"\n\n"
    ));
    assert!(prompt.contains("Test goal: log in"));
}

#[test]
fn test_build_prompt_is_pure() {
    assert_eq!(build_prompt("x", Some("e")), build_prompt("x", Some("e")));
}
