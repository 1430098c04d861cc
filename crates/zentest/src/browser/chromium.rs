// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Chromium page driver over CDP.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::emulation::SetDeviceMetricsOverrideParams;
use chromiumoxide::cdp::browser_protocol::input::{
    DispatchKeyEventParams, DispatchKeyEventType, DispatchMouseEventParams,
    DispatchMouseEventType, InsertTextParams, MouseButton as CdpMouseButton,
};
use chromiumoxide::cdp::browser_protocol::page::CaptureScreenshotParams;
use chromiumoxide::Page;
use futures::StreamExt;
use serde_json::Value;
use tokio::task::JoinHandle;

use super::{PageDriver, PageError};
use crate::action::MouseButton;
use crate::config::Viewport;

/// A launched Chromium instance owning one page.
pub struct ChromiumBrowser {
    browser: Browser,
    handler_task: JoinHandle<()>,
    page: Arc<ChromiumPage>,
}

impl ChromiumBrowser {
    /// Launch Chromium and open a blank page at the given viewport.
    pub async fn launch(headless: bool, viewport: Viewport) -> Result<Self, PageError> {
        let mut config = BrowserConfig::builder()
            .arg("--no-sandbox")
            .arg("--no-first-run")
            .arg("--no-default-browser-check")
            .arg("--disable-extensions")
            .arg("--disable-popup-blocking")
            .window_size(viewport.width, viewport.height);
        if headless {
            config = config.arg("--headless=new");
        } else {
            config = config.with_head();
        }
        let config = config.build().map_err(PageError::Browser)?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| PageError::Browser(e.to_string()))?;

        // Drain CDP events for the lifetime of the browser.
        let handler_task = tokio::spawn(async move { while handler.next().await.is_some() {} });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| PageError::Browser(e.to_string()))?;
        let page = Arc::new(ChromiumPage { page });
        page.set_viewport(viewport).await?;

        Ok(Self {
            browser,
            handler_task,
            page,
        })
    }

    pub fn page(&self) -> Arc<dyn PageDriver> {
        Arc::clone(&self.page) as Arc<dyn PageDriver>
    }

    /// Close the browser and stop the event drain.
    pub async fn close(mut self) {
        let _ = self.browser.close().await;
        let _ = self.browser.wait().await;
        self.handler_task.abort();
    }
}

/// [`PageDriver`] over a single chromiumoxide page.
pub struct ChromiumPage {
    page: Page,
}

impl ChromiumPage {
    fn browser_err(e: impl std::fmt::Display) -> PageError {
        PageError::Browser(e.to_string())
    }

    async fn dispatch_mouse(
        &self,
        event: DispatchMouseEventType,
        x: f64,
        y: f64,
        button: Option<CdpMouseButton>,
        click_count: Option<i64>,
    ) -> Result<(), PageError> {
        let mut builder = DispatchMouseEventParams::builder()
            .r#type(event)
            .x(x)
            .y(y);
        if let Some(button) = button {
            builder = builder.button(button);
        }
        if let Some(count) = click_count {
            builder = builder.click_count(count);
        }
        let params = builder.build().map_err(PageError::Browser)?;
        self.page
            .execute(params)
            .await
            .map_err(Self::browser_err)?;
        Ok(())
    }

    async fn click_with_count(
        &self,
        x: i64,
        y: i64,
        button: CdpMouseButton,
        count: i64,
    ) -> Result<(), PageError> {
        let (x, y) = (x as f64, y as f64);
        self.dispatch_mouse(
            DispatchMouseEventType::MouseMoved,
            x,
            y,
            None,
            None,
        )
        .await?;
        for _ in 0..count {
            self.dispatch_mouse(
                DispatchMouseEventType::MousePressed,
                x,
                y,
                Some(button.clone()),
                Some(count),
            )
            .await?;
            self.dispatch_mouse(
                DispatchMouseEventType::MouseReleased,
                x,
                y,
                Some(button.clone()),
                Some(count),
            )
            .await?;
        }
        Ok(())
    }

    async fn dispatch_key(
        &self,
        event: DispatchKeyEventType,
        key: &str,
        modifiers: i64,
    ) -> Result<(), PageError> {
        let is_key_down = matches!(&event, DispatchKeyEventType::KeyDown);
        let mut builder = DispatchKeyEventParams::builder()
            .r#type(event)
            .key(key)
            .modifiers(modifiers);
        // Printable single characters also produce text on keyDown.
        if key.chars().count() == 1 && is_key_down {
            builder = builder.text(key);
        }
        let params = builder.build().map_err(PageError::Browser)?;
        self.page
            .execute(params)
            .await
            .map_err(Self::browser_err)?;
        Ok(())
    }
}

fn cdp_button(button: MouseButton) -> CdpMouseButton {
    match button {
        MouseButton::Left => CdpMouseButton::Left,
        MouseButton::Right => CdpMouseButton::Right,
        MouseButton::Middle => CdpMouseButton::Middle,
    }
}

/// CDP modifier bitmask: Alt=1, Control=2, Meta=4, Shift=8.
fn modifier_bit(token: &str) -> Option<i64> {
    match token {
        "Alt" => Some(1),
        "Control" => Some(2),
        "Meta" => Some(4),
        "Shift" => Some(8),
        _ => None,
    }
}

#[async_trait]
impl PageDriver for ChromiumPage {
    async fn navigate(&self, url: &str) -> Result<(), PageError> {
        self.page.goto(url).await.map_err(Self::browser_err)?;
        Ok(())
    }

    async fn evaluate(&self, js: &str) -> Result<Value, PageError> {
        let result = self
            .page
            .evaluate(js)
            .await
            .map_err(|e| PageError::Eval(e.to_string()))?;
        result
            .into_value()
            .map_err(|e| PageError::Eval(e.to_string()))
    }

    async fn click_at(&self, x: i64, y: i64, button: MouseButton) -> Result<(), PageError> {
        self.click_with_count(x, y, cdp_button(button), 1).await
    }

    async fn double_click_at(&self, x: i64, y: i64) -> Result<(), PageError> {
        self.click_with_count(x, y, CdpMouseButton::Left, 2).await
    }

    async fn move_mouse(&self, x: i64, y: i64) -> Result<(), PageError> {
        self.dispatch_mouse(
            DispatchMouseEventType::MouseMoved,
            x as f64,
            y as f64,
            None,
            None,
        )
        .await
    }

    async fn drag(&self, sx: i64, sy: i64, ex: i64, ey: i64) -> Result<(), PageError> {
        let (sx, sy, ex, ey) = (sx as f64, sy as f64, ex as f64, ey as f64);
        self.dispatch_mouse(DispatchMouseEventType::MouseMoved, sx, sy, None, None)
            .await?;
        self.dispatch_mouse(
            DispatchMouseEventType::MousePressed,
            sx,
            sy,
            Some(CdpMouseButton::Left),
            Some(1),
        )
        .await?;
        // Midpoint hop so drag handlers see movement, not a teleport.
        self.dispatch_mouse(
            DispatchMouseEventType::MouseMoved,
            (sx + ex) / 2.0,
            (sy + ey) / 2.0,
            Some(CdpMouseButton::Left),
            None,
        )
        .await?;
        self.dispatch_mouse(
            DispatchMouseEventType::MouseMoved,
            ex,
            ey,
            Some(CdpMouseButton::Left),
            None,
        )
        .await?;
        self.dispatch_mouse(
            DispatchMouseEventType::MouseReleased,
            ex,
            ey,
            Some(CdpMouseButton::Left),
            Some(1),
        )
        .await?;
        Ok(())
    }

    async fn type_text(&self, text: &str) -> Result<(), PageError> {
        let params = InsertTextParams::builder()
            .text(text)
            .build()
            .map_err(PageError::Browser)?;
        self.page
            .execute(params)
            .await
            .map_err(Self::browser_err)?;
        Ok(())
    }

    async fn press_key(&self, combo: &str) -> Result<(), PageError> {
        let tokens: Vec<&str> = combo.split('+').filter(|t| !t.is_empty()).collect();
        let modifiers: i64 = tokens.iter().filter_map(|t| modifier_bit(t)).sum();
        let key = tokens
            .iter()
            .rev()
            .find(|t| modifier_bit(t).is_none())
            .copied()
            .unwrap_or_default();
        if key.is_empty() {
            return Ok(());
        }
        self.dispatch_key(DispatchKeyEventType::KeyDown, key, modifiers)
            .await?;
        self.dispatch_key(DispatchKeyEventType::KeyUp, key, modifiers)
            .await?;
        Ok(())
    }

    async fn scroll_by(&self, x: i64, y: i64, delta_y: f64) -> Result<(), PageError> {
        let params = DispatchMouseEventParams::builder()
            .r#type(DispatchMouseEventType::MouseWheel)
            .x(x as f64)
            .y(y as f64)
            .delta_x(0.0)
            .delta_y(delta_y)
            .build()
            .map_err(PageError::Browser)?;
        self.page
            .execute(params)
            .await
            .map_err(Self::browser_err)?;
        Ok(())
    }

    async fn screenshot_png(&self) -> Result<Vec<u8>, PageError> {
        self.page
            .screenshot(CaptureScreenshotParams::builder().build())
            .await
            .map_err(Self::browser_err)
    }

    async fn set_viewport(&self, viewport: Viewport) -> Result<(), PageError> {
        let params = SetDeviceMetricsOverrideParams::builder()
            .width(viewport.width as i64)
            .height(viewport.height as i64)
            .device_scale_factor(1.0)
            .mobile(false)
            .build()
            .map_err(PageError::Browser)?;
        self.page
            .execute(params)
            .await
            .map_err(Self::browser_err)?;
        Ok(())
    }

    async fn wait_for_network_idle(&self, timeout: Duration) -> Result<(), PageError> {
        const POLL: Duration = Duration::from_millis(250);
        let deadline = tokio::time::Instant::now() + timeout;
        let mut last_count: Option<u64> = None;

        loop {
            let snapshot = self
                .evaluate(
                    "({ ready: document.readyState === 'complete', \
                       resources: performance.getEntriesByType('resource').length })",
                )
                .await
                .unwrap_or(Value::Null);
            let ready = snapshot
                .get("ready")
                .and_then(Value::as_bool)
                .unwrap_or(false);
            let count = snapshot
                .get("resources")
                .and_then(Value::as_u64)
                .unwrap_or(0);

            // Idle means loaded and no new resource entries since last poll.
            if ready && last_count == Some(count) {
                return Ok(());
            }
            last_count = Some(count);

            if tokio::time::Instant::now() + POLL > deadline {
                return Err(PageError::Timeout(timeout));
            }
            tokio::time::sleep(POLL).await;
        }
    }
}
