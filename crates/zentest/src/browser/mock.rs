// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Scripted page driver for tests.
//!
//! Evaluate calls are answered by substring-matched rules; every primitive
//! call is logged so tests can assert on the exact interaction sequence.
//! This is a controllable test double, not a simulation of a real DOM.

use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};

use super::{PageDriver, PageError};
use crate::action::MouseButton;
use crate::config::Viewport;

#[derive(Default)]
struct MockState {
    eval_rules: Vec<(String, Value)>,
    calls: Vec<String>,
    fail_next_click: Option<PageError>,
    fail_navigate: Option<PageError>,
    screenshots: u64,
}

/// A page driver whose answers are scripted by the test.
#[derive(Default)]
pub struct MockPage {
    state: Mutex<MockState>,
}

impl MockPage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer any evaluate whose JS contains `needle` with `value`.
    /// Rules are matched in insertion order and never consumed.
    pub fn on_eval_contains(&self, needle: &str, value: Value) {
        self.state
            .lock()
            .eval_rules
            .push((needle.to_string(), value));
    }

    /// Make the next click fail with the given error.
    pub fn fail_next_click(&self, error: PageError) {
        self.state.lock().fail_next_click = Some(error);
    }

    /// Make every navigation fail with the given error.
    pub fn fail_navigate(&self, error: PageError) {
        self.state.lock().fail_navigate = Some(error);
    }

    /// Every primitive call so far, one summary line each.
    pub fn calls(&self) -> Vec<String> {
        self.state.lock().calls.clone()
    }

    pub fn call_count(&self, prefix: &str) -> usize {
        self.state
            .lock()
            .calls
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }

    fn log(&self, line: String) {
        self.state.lock().calls.push(line);
    }
}

#[async_trait]
impl PageDriver for MockPage {
    async fn navigate(&self, url: &str) -> Result<(), PageError> {
        self.log(format!("navigate {}", url));
        if let Some(e) = self.state.lock().fail_navigate.clone() {
            return Err(e);
        }
        Ok(())
    }

    async fn evaluate(&self, js: &str) -> Result<Value, PageError> {
        let value = {
            let state = self.state.lock();
            state
                .eval_rules
                .iter()
                .find(|(needle, _)| js.contains(needle.as_str()))
                .map(|(_, value)| value.clone())
        };
        self.log(format!("evaluate {}", first_line(js)));
        // Unscripted locator queries find nothing rather than erroring.
        Ok(value.unwrap_or_else(|| json!({ "count": 0, "hit": null })))
    }

    async fn click_at(&self, x: i64, y: i64, button: MouseButton) -> Result<(), PageError> {
        self.log(format!("click {},{} {}", x, y, button));
        if let Some(e) = self.state.lock().fail_next_click.take() {
            return Err(e);
        }
        Ok(())
    }

    async fn double_click_at(&self, x: i64, y: i64) -> Result<(), PageError> {
        self.log(format!("double_click {},{}", x, y));
        Ok(())
    }

    async fn move_mouse(&self, x: i64, y: i64) -> Result<(), PageError> {
        self.log(format!("move_mouse {},{}", x, y));
        Ok(())
    }

    async fn drag(&self, sx: i64, sy: i64, ex: i64, ey: i64) -> Result<(), PageError> {
        self.log(format!("drag {},{} -> {},{}", sx, sy, ex, ey));
        Ok(())
    }

    async fn type_text(&self, text: &str) -> Result<(), PageError> {
        self.log(format!("type {}", text));
        Ok(())
    }

    async fn press_key(&self, combo: &str) -> Result<(), PageError> {
        self.log(format!("key {}", combo));
        Ok(())
    }

    async fn scroll_by(&self, x: i64, y: i64, delta_y: f64) -> Result<(), PageError> {
        self.log(format!("scroll {},{} {}", x, y, delta_y));
        Ok(())
    }

    async fn screenshot_png(&self) -> Result<Vec<u8>, PageError> {
        let n = {
            let mut state = self.state.lock();
            state.screenshots += 1;
            state.screenshots
        };
        self.log(format!("screenshot #{}", n));
        Ok(format!("PNG#{}", n).into_bytes())
    }

    async fn set_viewport(&self, viewport: Viewport) -> Result<(), PageError> {
        self.log(format!("viewport {}x{}", viewport.width, viewport.height));
        Ok(())
    }

    async fn wait_for_network_idle(&self, _timeout: Duration) -> Result<(), PageError> {
        self.log("network_idle".to_string());
        Ok(())
    }
}

fn first_line(js: &str) -> &str {
    js.lines().find(|l| !l.trim().is_empty()).unwrap_or("")
}
