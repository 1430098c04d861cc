// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Browser integration.
//!
//! [`PageDriver`] is the capability the rest of the crate consumes: raw page
//! primitives (navigate, evaluate, mouse, keyboard, screenshot). The
//! production implementation drives Chromium over CDP; tests use a scripted
//! mock. Everything smarter than a primitive (locators, magnet snap,
//! assertions) lives in [`executor`] as JS queries over `evaluate`.

pub mod chromium;
pub mod executor;
pub mod mock;
pub mod probe;

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::action::MouseButton;
use crate::config::Viewport;

pub use chromium::ChromiumBrowser;
pub use executor::BrowserExecutor;

/// Default timeout for locator-level operations.
pub const LOCATOR_TIMEOUT: Duration = Duration::from_secs(5);
/// Default timeout for screenshots.
pub const SCREENSHOT_TIMEOUT: Duration = Duration::from_secs(30);
/// Default timeout for the best-effort network-idle wait.
pub const NETWORK_IDLE_TIMEOUT: Duration = Duration::from_secs(5);

/// Errors from the raw page layer.
#[derive(Clone, Debug, thiserror::Error)]
pub enum PageError {
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("browser error: {0}")]
    Browser(String),

    #[error("evaluate failed: {0}")]
    Eval(String),
}

/// Raw page primitives, Playwright-class but minimal.
///
/// Implementations must be safe to call from a single task at a time; the
/// scheduler guarantees exclusive ownership of the page.
#[async_trait]
pub trait PageDriver: Send + Sync {
    async fn navigate(&self, url: &str) -> Result<(), PageError>;

    /// Evaluate a JS expression and return its JSON value.
    async fn evaluate(&self, js: &str) -> Result<Value, PageError>;

    async fn click_at(&self, x: i64, y: i64, button: MouseButton) -> Result<(), PageError>;

    async fn double_click_at(&self, x: i64, y: i64) -> Result<(), PageError>;

    async fn move_mouse(&self, x: i64, y: i64) -> Result<(), PageError>;

    async fn drag(&self, sx: i64, sy: i64, ex: i64, ey: i64) -> Result<(), PageError>;

    /// Type into whatever currently has focus.
    async fn type_text(&self, text: &str) -> Result<(), PageError>;

    /// Press a normalized key combo (see [`crate::action::normalize_key_combo`]).
    async fn press_key(&self, combo: &str) -> Result<(), PageError>;

    /// Wheel scroll at a position by a signed delta.
    async fn scroll_by(&self, x: i64, y: i64, delta_y: f64) -> Result<(), PageError>;

    async fn screenshot_png(&self) -> Result<Vec<u8>, PageError>;

    async fn set_viewport(&self, viewport: Viewport) -> Result<(), PageError>;

    /// Best-effort wait for network quiescence. Returns `Timeout` when the
    /// page never settles; callers decide whether that matters.
    async fn wait_for_network_idle(&self, timeout: Duration) -> Result<(), PageError>;
}
