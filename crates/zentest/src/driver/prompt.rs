// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Prompt construction.
//!
//! Both builders are pure functions of their inputs; golden tests pin the
//! text so prompt drift is always a deliberate, reviewed change.

use crate::action::Action;
use crate::config::Viewport;
use crate::step::RecordedStep;

/// History entries included in the prompt, most recent last.
pub const HISTORY_LIMIT: usize = 20;

/// The fixed system template, parameterized by viewport and the action
/// history so far.
pub fn system_prompt(viewport: Viewport, history: &[RecordedStep]) -> String {
    format!(
        r#"You are driving a web browser to complete an end-to-end test. You see the current page as a screenshot of a {width}x{height} viewport.

Reply with ONLY a JSON object: {{"actions": [...], "reasoning": "..."}}.

Allowed actions:
  {{"type":"click","x":N,"y":N}} — click at viewport coordinates (optional "button": "left"|"right"|"middle")
  {{"type":"double_click","x":N,"y":N}}
  {{"type":"mouse_move","x":N,"y":N}}
  {{"type":"drag","sx":N,"sy":N,"ex":N,"ey":N}}
  {{"type":"click_button","name":"..."}} — click a button by its visible name (optional "exact": false)
  {{"type":"click_text","text":"..."}} — click an element by visible text (optional "exact": true)
  {{"type":"select_input","field":"...","value":"..."}} — fill a form field addressed by its label or placeholder
  {{"type":"type","text":"..."}} — type into the focused element
  {{"type":"key","combo":"..."}} — press a key combo, e.g. "Enter" or "ctrl+s"
  {{"type":"scroll","x":N,"y":N,"direction":"up"|"down","amount":N}} — amount at least 200
  {{"type":"wait","ms":N}}
  {{"type":"assert_text","text":"..."}} — assert the page shows this text
  {{"type":"assert_not_text","text":"..."}} — assert the page does not show this text
  {{"type":"assert_visible","x":N,"y":N}} — assert the element at this point is visible
  {{"type":"done","success":true|false,"reason":"..."}} — finish the test

Rules:
- Prefer click_button over click_text over select_input over coordinate clicks. Use coordinates only when nothing semantic addresses the element.
- Never use generic button names like "menu", "icon", or "more"; name the button by its visible label.
- Batch only actions that need no screenshot in between (filling several fields, multiple assertions, an assertion followed by done). After anything that changes the page, stop the batch so you see the result.
- Do not rely on drag to complete the test; recorded drags cannot be replayed.
- Before {{"type":"done","success":true}}, assert something that proves the goal (assert_text or assert_visible) in the same batch.
- If the test goal cannot be achieved, reply with done success:false and say why.

Actions so far:
{history}"#,
        width = viewport.width,
        height = viewport.height,
        history = history_summary(history),
    )
}

/// One line per executed action, truncated to the most recent
/// [`HISTORY_LIMIT`] entries.
pub fn history_summary(history: &[RecordedStep]) -> String {
    if history.is_empty() {
        return "(none yet)".to_string();
    }
    let skipped = history.len().saturating_sub(HISTORY_LIMIT);
    let mut lines = Vec::new();
    if skipped > 0 {
        lines.push(format!("({} earlier actions omitted)", skipped));
    }
    for (i, step) in history.iter().enumerate().skip(skipped) {
        let outcome = match step.error {
            Some(ref error) => format!("failed: {}", error),
            None => "ok".to_string(),
        };
        lines.push(format!("{}. {} — {}", i + 1, describe(&step.action), outcome));
    }
    lines.join("\n")
}

/// The user-message text: failure feedback first, then the goal.
pub fn build_prompt(description: &str, failure: Option<&str>) -> String {
    let mut prompt = String::new();
    if let Some(failure) = failure {
        prompt.push_str(&format!("Last instruction failed: {}\n\n", failure));
    }
    prompt.push_str(&format!(
        "Test goal: {}\n\nLook at the screenshot and reply with the next actions as JSON.",
        description
    ));
    prompt
}

/// Corrective feedback sent when a reply could not be parsed.
pub fn reparse_feedback() -> &'static str {
    "Your last reply could not be used. Reply with ONLY a JSON object of the form \
     {\"actions\": [...], \"reasoning\": \"...\"} using the documented action types."
}

/// Compact human-readable form of an action for the history summary.
pub fn describe(action: &Action) -> String {
    match action {
        Action::Click { x, y, .. } => format!("click ({}, {})", x, y),
        Action::DoubleClick { x, y } => format!("double-click ({}, {})", x, y),
        Action::MouseMove { x, y } => format!("move mouse to ({}, {})", x, y),
        Action::Drag { sx, sy, ex, ey } => {
            format!("drag ({}, {}) to ({}, {})", sx, sy, ex, ey)
        }
        Action::ClickButton { name, .. } => format!("click button \"{}\"", name),
        Action::ClickText { text, .. } => format!("click text \"{}\"", text),
        Action::SelectInput { field, value, .. } => {
            format!("fill \"{}\" with \"{}\"", field, value)
        }
        Action::Type { text } => format!("type \"{}\"", text),
        Action::Key { combo } => format!("press {}", combo),
        Action::Scroll {
            direction, amount, ..
        } => format!("scroll {} by {}", direction, amount),
        Action::Wait { ms } => format!("wait {} ms", ms),
        Action::AssertText { text } => format!("assert text \"{}\"", text),
        Action::AssertNotText { text } => format!("assert no text \"{}\"", text),
        Action::AssertVisible { x, y } => format!("assert visible at ({}, {})", x, y),
        Action::Done { success, .. } => format!("done (success: {})", success),
    }
}

#[cfg(test)]
#[path = "prompt_tests.rs"]
mod tests;
