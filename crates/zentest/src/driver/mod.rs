// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! The agentic driver: a state machine that walks a browser toward a
//! plain-English goal.
//!
//! Each iteration either consumes one action from the pending batch or asks
//! the model for a new batch (screenshot in, JSON actions out). Executor
//! errors are never fatal: they clear the batch and flow back to the model
//! as failure feedback. The driver terminates on `done`, on the repetition
//! guard, on cancellation, or at the step cap.

pub mod prompt;

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::action::Action;
use crate::browser::{BrowserExecutor, SCREENSHOT_TIMEOUT};
use crate::config::{Viewport, DEFAULT_MAX_STEPS};
use crate::model::parse::{parse_batch, ModelBatch};
use crate::model::{ModelClient, ModelRequest};
use crate::step::{RecordedStep, StepMode};
use crate::suite::Test;

/// Reasoning markers that demote a premature `done{success:true}`.
const INCOMPLETE_MARKERS: &[&str] = &[
    "still need",
    "remaining",
    "more steps",
    "not yet",
    "haven't completed",
    "next step",
    "continue with",
    "haven't done",
    "not complete",
    "incomplete",
];

/// Consecutive empty batches tolerated before giving up. An empty batch
/// (a demoted `done` with nothing before it) costs a model call but records
/// no step, so it needs its own bound.
const MAX_EMPTY_BATCHES: u32 = 3;

/// Cooperative cancellation, observable at every suspension point.
#[derive(Clone, Debug, Default)]
pub struct CancelFlag {
    flag: Arc<AtomicBool>,
}

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Driver options, resolved by the runner from config and CLI flags.
#[derive(Clone, Debug)]
pub struct DriverOptions {
    pub max_steps: u32,
    pub viewport: Viewport,
    pub retry_no_response: u32,
    /// Continue from the page's current state instead of navigating to the
    /// base URL first; used by the healer's partial-replay tier.
    pub skip_navigation: bool,
    pub verbose: bool,
}

impl Default for DriverOptions {
    fn default() -> Self {
        Self {
            max_steps: DEFAULT_MAX_STEPS,
            viewport: Viewport::default(),
            retry_no_response: 2,
            skip_navigation: false,
            verbose: false,
        }
    }
}

/// How a single test ended, with everything it recorded.
#[derive(Clone, Debug)]
pub struct TestOutcome {
    pub success: bool,
    pub reason: String,
    pub steps: Vec<RecordedStep>,
}

struct LastFailure {
    message: String,
    screenshot: Option<Vec<u8>>,
}

/// Drives one test at a time against a shared page.
pub struct AgenticDriver<'a> {
    executor: &'a BrowserExecutor,
    model: Arc<dyn ModelClient>,
    base_url: String,
    options: DriverOptions,
    cancel: CancelFlag,
}

impl<'a> AgenticDriver<'a> {
    pub fn new(
        executor: &'a BrowserExecutor,
        model: Arc<dyn ModelClient>,
        base_url: impl Into<String>,
        options: DriverOptions,
        cancel: CancelFlag,
    ) -> Self {
        Self {
            executor,
            model,
            base_url: base_url.into(),
            options,
            cancel,
        }
    }

    /// Run one test to termination.
    pub async fn run(&self, test: &Test) -> TestOutcome {
        let mut history: Vec<RecordedStep> = Vec::new();

        if let Err(e) = self.executor.page().set_viewport(self.options.viewport).await {
            return failed(format!("Failed to set viewport: {}", e), history);
        }
        if !self.options.skip_navigation {
            if self.cancel.is_cancelled() {
                return failed("Cancelled", history);
            }
            if let Err(e) = self.executor.navigate(&self.base_url).await {
                return failed(format!("Failed to navigate to {}: {}", self.base_url, e), history);
            }
        }

        let mut pending: VecDeque<Action> = VecDeque::new();
        let mut pending_reasoning = String::new();
        let mut last_failure: Option<LastFailure> = None;
        let mut empty_batches = 0u32;

        loop {
            if history.len() as u32 >= self.options.max_steps {
                return failed("Max steps reached", history);
            }
            if self.cancel.is_cancelled() {
                return failed("Cancelled", history);
            }

            if pending.is_empty() {
                let screenshot = match last_failure {
                    Some(LastFailure {
                        screenshot: Some(ref png),
                        ..
                    }) => Some(png.clone()),
                    _ => self.fresh_screenshot().await,
                };
                let batch = match self
                    .request_batch(test, &history, last_failure.as_ref(), screenshot)
                    .await
                {
                    Ok(batch) => batch,
                    Err(reason) => return failed(reason, history),
                };
                let (actions, reasoning) = trim_batch(batch);
                if actions.is_empty() {
                    empty_batches += 1;
                    if empty_batches >= MAX_EMPTY_BATCHES {
                        return failed("Model returned no executable actions", history);
                    }
                    continue;
                }
                empty_batches = 0;
                pending = actions.into();
                pending_reasoning = reasoning;
            }

            let Some(action) = pending.pop_front() else {
                continue;
            };

            if let Action::Done { success, reason } = action {
                return TestOutcome {
                    success,
                    reason,
                    steps: history,
                };
            }

            // Repetition guard: this action plus the last two executed steps
            // with the same signature means the model is spinning.
            let signature = action.signature();
            let repeats = history
                .iter()
                .rev()
                .take(2)
                .filter(|s| s.action.signature() == signature)
                .count();
            if repeats == 2 {
                return failed("Repeated same action without progress", history);
            }

            if self.cancel.is_cancelled() {
                return failed("Cancelled", history);
            }

            let result = self.executor.execute(&action).await;
            let step = RecordedStep::from_result(&result, &pending_reasoning, StepMode::Agentic);
            if self.options.verbose {
                let outcome = step.error.as_deref().unwrap_or("ok");
                eprintln!(
                    "  [{}] {} — {}",
                    history.len() + 1,
                    prompt::describe(&step.action),
                    outcome
                );
            }
            history.push(step);

            match result.error {
                Some(error) => {
                    // Force a fresh model call that sees the failure state.
                    last_failure = Some(LastFailure {
                        message: error.to_string(),
                        screenshot: result.screenshot,
                    });
                    pending.clear();
                }
                None => last_failure = None,
            }
        }
    }

    /// Ask the model for the next batch, retrying unparseable replies with
    /// corrective feedback up to `retry_no_response` times.
    async fn request_batch(
        &self,
        test: &Test,
        history: &[RecordedStep],
        last_failure: Option<&LastFailure>,
        screenshot: Option<Vec<u8>>,
    ) -> Result<ModelBatch, String> {
        let system = prompt::system_prompt(self.options.viewport, history);
        let base_text =
            prompt::build_prompt(&test.description, last_failure.map(|f| f.message.as_str()));
        let mut user_text = base_text.clone();
        let mut attempts = 0u32;

        loop {
            if self.cancel.is_cancelled() {
                return Err("Cancelled".to_string());
            }
            let request = ModelRequest {
                system: system.clone(),
                user_text: user_text.clone(),
                image_png: screenshot.clone(),
            };
            let reply = self
                .model
                .next(&request)
                .await
                .map_err(|e| format!("Provider error: {}", e))?;
            let batch = parse_batch(&reply.raw_text);
            if batch.is_retryable_failure() && attempts < self.options.retry_no_response {
                attempts += 1;
                user_text = format!("{}\n\n{}", prompt::reparse_feedback(), base_text);
                continue;
            }
            return Ok(batch);
        }
    }

    async fn fresh_screenshot(&self) -> Option<Vec<u8>> {
        tokio::time::timeout(SCREENSHOT_TIMEOUT, self.executor.page().screenshot_png())
            .await
            .ok()?
            .ok()
    }
}

fn failed(reason: impl Into<String>, steps: Vec<RecordedStep>) -> TestOutcome {
    TestOutcome {
        success: false,
        reason: reason.into(),
        steps,
    }
}

/// Cut the batch at the first `done`, demoting a premature success whose
/// reasoning admits unfinished work.
fn trim_batch(batch: ModelBatch) -> (Vec<Action>, String) {
    let reasoning = batch.reasoning;
    let mut trimmed = Vec::new();
    for action in batch.actions {
        if let Action::Done { success, .. } = action {
            let premature = success && reasoning_incomplete(&reasoning);
            if !premature {
                trimmed.push(action);
            }
            break;
        }
        trimmed.push(action);
    }
    (trimmed, reasoning)
}

fn reasoning_incomplete(reasoning: &str) -> bool {
    let lower = reasoning.to_lowercase();
    INCOMPLETE_MARKERS.iter().any(|marker| lower.contains(marker))
}

#[cfg(test)]
#[path = "driver_tests.rs"]
mod tests;
