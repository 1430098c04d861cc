// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Action execution against a live page.
//!
//! `execute` is total over expected failures: a missing element, an
//! ambiguous locator, or a failed assertion comes back as
//! `ActionResult.error`, never as `Err`. Retry policy lives with the caller.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use rand::Rng;
use serde::de::DeserializeOwned;

use super::probe;
use super::{PageDriver, PageError, LOCATOR_TIMEOUT, NETWORK_IDLE_TIMEOUT, SCREENSHOT_TIMEOUT};
use crate::action::{Action, MouseButton, MIN_SCROLL_AMOUNT};
use crate::element::ElementInfo;
use crate::step::{ActionResult, ExecFailure, FailureKind};

/// Post-action settle window before the screenshot.
const SETTLE_MIN_MS: u64 = 300;
const SETTLE_MAX_MS: u64 = 1000;

/// Executes one [`Action`] at a time against the page it owns.
pub struct BrowserExecutor {
    page: Arc<dyn PageDriver>,
}

impl BrowserExecutor {
    pub fn new(page: Arc<dyn PageDriver>) -> Self {
        Self { page }
    }

    pub fn page(&self) -> Arc<dyn PageDriver> {
        Arc::clone(&self.page)
    }

    /// Navigate and settle; used for the initial `base_url` load.
    pub async fn navigate(&self, url: &str) -> Result<(), ExecFailure> {
        self.page
            .navigate(url)
            .await
            .map_err(|e| map_page_error(&e))?;
        let _ = self.page.wait_for_network_idle(NETWORK_IDLE_TIMEOUT).await;
        Ok(())
    }

    /// Execute a single action and capture the post-action screenshot.
    pub async fn execute(&self, action: &Action) -> ActionResult {
        let (element_info, mut error) = self.perform(action).await;

        self.settle_jitter().await;
        if action.may_navigate() && error.is_none() {
            // Best-effort: pages with continuous background traffic simply
            // hit the cap.
            let _ = self.page.wait_for_network_idle(NETWORK_IDLE_TIMEOUT).await;
        }

        let screenshot = match tokio::time::timeout(SCREENSHOT_TIMEOUT, self.page.screenshot_png())
            .await
        {
            Ok(Ok(png)) => Some(png),
            Ok(Err(e)) => {
                error.get_or_insert_with(|| map_page_error(&e));
                None
            }
            Err(_) => {
                error.get_or_insert(ExecFailure::new(
                    FailureKind::ActionThrow,
                    format!("screenshot timed out after {:?}", SCREENSHOT_TIMEOUT),
                ));
                None
            }
        };

        ActionResult {
            action: action.clone(),
            screenshot,
            element_info,
            error,
            timestamp: Utc::now(),
        }
    }

    async fn perform(&self, action: &Action) -> (Option<ElementInfo>, Option<ExecFailure>) {
        match action {
            Action::Click { x, y, button } => self.click(*x, *y, button.unwrap_or_default()).await,
            Action::DoubleClick { x, y } => {
                let info = self.probe_at(*x, *y).await;
                match self.page.double_click_at(*x, *y).await {
                    Ok(()) => (info, None),
                    Err(e) => (info, Some(map_page_error(&e))),
                }
            }
            Action::MouseMove { x, y } => {
                (None, self.page.move_mouse(*x, *y).await.err().map(|e| map_page_error(&e)))
            }
            Action::Drag { sx, sy, ex, ey } => (
                None,
                self.page
                    .drag(*sx, *sy, *ex, *ey)
                    .await
                    .err()
                    .map(|e| map_page_error(&e)),
            ),
            Action::ClickButton { name, exact } => {
                self.click_button(name, exact.unwrap_or(true)).await
            }
            Action::ClickText { text, exact } => {
                self.click_text(text, exact.unwrap_or(false)).await
            }
            Action::SelectInput {
                field,
                value,
                exact,
            } => self.fill_input(field, value, exact.unwrap_or(false)).await,
            Action::Type { text } => {
                (None, self.page.type_text(text).await.err().map(|e| map_page_error(&e)))
            }
            Action::Key { combo } => {
                let normalized = crate::action::normalize_key_combo(combo);
                (
                    None,
                    self.page
                        .press_key(&normalized)
                        .await
                        .err()
                        .map(|e| map_page_error(&e)),
                )
            }
            Action::Scroll {
                x,
                y,
                direction,
                amount,
            } => {
                let amount = (*amount).max(MIN_SCROLL_AMOUNT) as f64;
                let delta = match direction {
                    crate::action::ScrollDirection::Up => -amount,
                    crate::action::ScrollDirection::Down => amount,
                };
                (
                    None,
                    self.page
                        .scroll_by(*x, *y, delta)
                        .await
                        .err()
                        .map(|e| map_page_error(&e)),
                )
            }
            Action::Wait { ms } => {
                tokio::time::sleep(Duration::from_millis(*ms)).await;
                (None, None)
            }
            Action::AssertText { text } => self.assert_text(text, true).await,
            Action::AssertNotText { text } => self.assert_text(text, false).await,
            Action::AssertVisible { x, y } => self.assert_visible(*x, *y).await,
            // The driver terminates on `done` before execution; treat as a
            // no-op if it ever arrives.
            Action::Done { .. } => (None, None),
        }
    }

    async fn click(
        &self,
        x: i64,
        y: i64,
        button: MouseButton,
    ) -> (Option<ElementInfo>, Option<ExecFailure>) {
        let snap: Option<probe::LocateOutcome> = self.eval_query(&probe::magnet_snap(x, y)).await;
        let (cx, cy, info) = match snap.and_then(|o| o.hit) {
            Some(hit) => (
                hit.x.round() as i64,
                hit.y.round() as i64,
                Some(hit.element.with_derived_selector()),
            ),
            None => {
                // Nothing interactive in range; click the raw coordinate but
                // still record what the click lands on.
                (x, y, self.probe_at(x, y).await)
            }
        };
        match self.page.click_at(cx, cy, button).await {
            Ok(()) => (info, None),
            Err(e) => (info, Some(map_page_error(&e))),
        }
    }

    async fn click_button(
        &self,
        name: &str,
        exact: bool,
    ) -> (Option<ElementInfo>, Option<ExecFailure>) {
        let outcome: Option<probe::LocateOutcome> =
            self.eval_query(&probe::find_button(name, exact)).await;
        match outcome {
            Some(outcome) if outcome.count == 0 => (
                None,
                Some(ExecFailure::element_not_found(format!(
                    "no button named \"{}\"",
                    name
                ))),
            ),
            Some(outcome) if outcome.count > 1 => (
                None,
                Some(ExecFailure::new(
                    FailureKind::LocatorAmbiguous,
                    format!("{} buttons named \"{}\"", outcome.count, name),
                )),
            ),
            Some(outcome) => self.click_hit(outcome.hit).await,
            None => (
                None,
                Some(ExecFailure::element_not_found(format!(
                    "no button named \"{}\"",
                    name
                ))),
            ),
        }
    }

    async fn click_text(
        &self,
        text: &str,
        exact: bool,
    ) -> (Option<ElementInfo>, Option<ExecFailure>) {
        let outcome: Option<probe::LocateOutcome> =
            self.eval_query(&probe::find_text(text, exact)).await;
        match outcome.and_then(|o| o.hit) {
            Some(hit) => self.click_hit(Some(hit)).await,
            None => (
                None,
                Some(ExecFailure::element_not_found(format!(
                    "no element with text \"{}\"",
                    text
                ))),
            ),
        }
    }

    async fn click_hit(
        &self,
        hit: Option<probe::ProbeHit>,
    ) -> (Option<ElementInfo>, Option<ExecFailure>) {
        let Some(hit) = hit else {
            return (
                None,
                Some(ExecFailure::element_not_found("locator matched nothing")),
            );
        };
        let info = hit.element.with_derived_selector();
        match self
            .page
            .click_at(hit.x.round() as i64, hit.y.round() as i64, MouseButton::Left)
            .await
        {
            Ok(()) => (Some(info), None),
            Err(e) => (Some(info), Some(map_page_error(&e))),
        }
    }

    async fn fill_input(
        &self,
        field: &str,
        value: &str,
        exact: bool,
    ) -> (Option<ElementInfo>, Option<ExecFailure>) {
        let outcome: Option<probe::FillOutcome> = self
            .eval_query(&probe::fill_field(field, value, exact))
            .await;
        match outcome {
            Some(outcome) if outcome.filled => (
                outcome.element.map(ElementInfo::with_derived_selector),
                None,
            ),
            _ => (
                None,
                Some(ExecFailure::element_not_found(format!(
                    "no input matching \"{}\"",
                    field
                ))),
            ),
        }
    }

    async fn assert_text(
        &self,
        text: &str,
        want_present: bool,
    ) -> (Option<ElementInfo>, Option<ExecFailure>) {
        let outcome: Option<probe::PresenceOutcome> =
            self.eval_query(&probe::text_present(text)).await;
        let present = outcome.map(|o| o.present).unwrap_or(false);
        let error = match (present, want_present) {
            (false, true) => Some(ExecFailure::assertion_failed(format!(
                "text not found: {}",
                text
            ))),
            (true, false) => Some(ExecFailure::assertion_failed(format!(
                "text unexpectedly present: {}",
                text
            ))),
            _ => None,
        };
        (None, error)
    }

    async fn assert_visible(&self, x: i64, y: i64) -> (Option<ElementInfo>, Option<ExecFailure>) {
        let outcome: Option<probe::VisibilityOutcome> =
            self.eval_query(&probe::visible_at(x, y)).await;
        match outcome {
            Some(o) if o.visible => (o.element.map(ElementInfo::with_derived_selector), None),
            Some(o) => (
                o.element.map(ElementInfo::with_derived_selector),
                Some(ExecFailure::assertion_failed(format!(
                    "nothing visible at ({}, {})",
                    x, y
                ))),
            ),
            None => (
                None,
                Some(ExecFailure::assertion_failed(format!(
                    "nothing visible at ({}, {})",
                    x, y
                ))),
            ),
        }
    }

    /// Element metadata at a raw coordinate, best-effort.
    async fn probe_at(&self, x: i64, y: i64) -> Option<ElementInfo> {
        let outcome: Option<probe::LocateOutcome> = self.eval_query(&probe::element_at(x, y)).await;
        outcome
            .and_then(|o| o.hit)
            .map(|h| h.element.with_derived_selector())
    }

    /// Run a probe query with the locator timeout; `None` means the query
    /// failed or timed out.
    async fn eval_query<T: DeserializeOwned>(&self, js: &str) -> Option<T> {
        let value = tokio::time::timeout(LOCATOR_TIMEOUT, self.page.evaluate(js))
            .await
            .ok()?
            .ok()?;
        serde_json::from_value(value).ok()
    }

    async fn settle_jitter(&self) {
        let ms = rand::thread_rng().gen_range(SETTLE_MIN_MS..=SETTLE_MAX_MS);
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }
}

fn map_page_error(error: &PageError) -> ExecFailure {
    match error {
        PageError::Timeout(d) => ExecFailure::new(
            FailureKind::NavigationTimeout,
            format!("timed out after {:?}", d),
        ),
        PageError::Browser(msg) | PageError::Eval(msg) => {
            ExecFailure::new(FailureKind::ActionThrow, msg.clone())
        }
    }
}

#[cfg(test)]
#[path = "executor_tests.rs"]
mod tests;
