// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Deterministic replay of recorded steps.
//!
//! Replay fast-forwards browser state without consulting any model: steps
//! that errored in the original run are skipped, assertions are skipped
//! (the static runner owns revalidation), and the first step that cannot be
//! re-executed aborts the whole replay so the caller can fall back.

use std::sync::OnceLock;
use std::time::Duration;

use regex::Regex;

use crate::action::{Action, MouseButton};
use crate::browser::{probe, BrowserExecutor, NETWORK_IDLE_TIMEOUT};
use crate::step::{ExecFailure, RecordedStep};

use super::locator::{build_locator, Locator};

/// Fixed settle after each replayed click.
const CLICK_SETTLE: Duration = Duration::from_millis(250);
/// Extra settle after submit-like buttons.
const SUBMIT_SETTLE: Duration = Duration::from_secs(1);

fn submit_button_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)sign.?in|log.?in|submit|save|confirm|continue|next")
            .expect("static regex")
    })
}

#[derive(Debug, thiserror::Error)]
pub enum ReplayError {
    #[error("replay failed at step {index} ({kind}): {source}")]
    Step {
        index: usize,
        kind: &'static str,
        #[source]
        source: ExecFailure,
    },
}

/// Replays sidecar steps against a live page.
pub struct ScriptReplayer<'a> {
    executor: &'a BrowserExecutor,
}

impl<'a> ScriptReplayer<'a> {
    pub fn new(executor: &'a BrowserExecutor) -> Self {
        Self { executor }
    }

    /// Replay one test's steps in order. Returns on the first step that
    /// cannot be re-executed.
    pub async fn replay(&self, steps: &[RecordedStep]) -> Result<(), ReplayError> {
        for (index, step) in steps.iter().enumerate() {
            // Dead ends from the original run and assertions are not part of
            // the fast-forward.
            if step.error.is_some() || step.action.is_assertion() || step.action.is_done() {
                continue;
            }

            self.replay_step(step)
                .await
                .map_err(|source| ReplayError::Step {
                    index,
                    kind: step.action.kind(),
                    source,
                })?;

            self.settle_after(&step.action).await;
        }
        Ok(())
    }

    async fn replay_step(&self, step: &RecordedStep) -> Result<(), ExecFailure> {
        match &step.action {
            Action::Click { x, y, button } => {
                self.click_recorded(step, *x, *y, button.unwrap_or_default(), false)
                    .await
            }
            Action::DoubleClick { x, y } => {
                self.click_recorded(step, *x, *y, MouseButton::Left, true)
                    .await
            }
            // Semantic actions re-resolve exactly like the original run.
            Action::ClickButton { .. }
            | Action::ClickText { .. }
            | Action::SelectInput { .. }
            | Action::Type { .. }
            | Action::Key { .. }
            | Action::Scroll { .. }
            | Action::Wait { .. }
            | Action::MouseMove { .. }
            | Action::Drag { .. } => {
                let result = self.executor.execute(&step.action).await;
                match result.error {
                    Some(error) => Err(error),
                    None => Ok(()),
                }
            }
            Action::AssertText { .. }
            | Action::AssertNotText { .. }
            | Action::AssertVisible { .. }
            | Action::Done { .. } => Ok(()),
        }
    }

    /// Re-execute a coordinate click through the locator the builder would
    /// emit for its recorded element; raw coordinates only when the builder
    /// would fall back too.
    async fn click_recorded(
        &self,
        step: &RecordedStep,
        x: i64,
        y: i64,
        button: MouseButton,
        double: bool,
    ) -> Result<(), ExecFailure> {
        let locator = step.element_info.as_ref().and_then(build_locator);
        let page = self.executor.page();
        let (cx, cy) = match locator {
            Some(ref locator) => {
                let hit = self.resolve(locator).await?;
                (hit.0.round() as i64, hit.1.round() as i64)
            }
            None => (x, y),
        };
        let result = if double {
            page.double_click_at(cx, cy).await
        } else {
            page.click_at(cx, cy, button).await
        };
        result.map_err(|e| ExecFailure::new(crate::step::FailureKind::ActionThrow, e.to_string()))
    }

    /// Resolve a locator to its current centroid.
    async fn resolve(&self, locator: &Locator) -> Result<(f64, f64), ExecFailure> {
        let js = match locator {
            Locator::TestId(id) => probe::find_selector(&format!("[data-testid=\"{}\"]", id)),
            Locator::Role { role, name } if role == "button" => probe::find_button(name, true),
            Locator::Role { name, .. } => probe::find_labelled_input(name),
            Locator::Label(label) => probe::find_labelled_input(label),
            Locator::Placeholder(p) => probe::find_labelled_input(p),
            Locator::Text { text, exact } => probe::find_text(text, *exact),
            Locator::Id(id) => probe::find_selector(&format!("#{}", id)),
            Locator::Css(selector) => probe::find_selector(selector),
        };
        let value = self
            .executor
            .page()
            .evaluate(&js)
            .await
            .map_err(|e| ExecFailure::new(crate::step::FailureKind::ActionThrow, e.to_string()))?;
        let outcome: probe::LocateOutcome = serde_json::from_value(value).unwrap_or_default();
        match outcome.hit {
            Some(hit) => Ok((hit.x, hit.y)),
            None => Err(ExecFailure::element_not_found(format!(
                "locator matched nothing during replay: {}",
                locator.to_code()
            ))),
        }
    }

    /// Post-click settle: fixed 250 ms, plus network idle and 1 s for
    /// submit-like buttons.
    async fn settle_after(&self, action: &Action) {
        let clicked_name = match action {
            Action::ClickButton { name, .. } => Some(name.as_str()),
            Action::ClickText { text, .. } => Some(text.as_str()),
            Action::Click { .. } | Action::DoubleClick { .. } => Some(""),
            _ => return,
        };
        tokio::time::sleep(CLICK_SETTLE).await;
        if let Some(name) = clicked_name {
            if !name.is_empty() && submit_button_re().is_match(name) {
                let _ = self
                    .executor
                    .page()
                    .wait_for_network_idle(NETWORK_IDLE_TIMEOUT)
                    .await;
                tokio::time::sleep(SUBMIT_SETTLE).await;
            }
        }
    }
}

#[cfg(test)]
#[path = "replayer_tests.rs"]
mod tests;
