// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! The closed set of browser interactions the model may request.
//!
//! Actions arrive as tagged JSON objects inside the model envelope and are
//! executed one at a time by the browser executor. The same type round-trips
//! through the sidecar file, so the serde representation is the wire format.

use serde::{Deserialize, Serialize};

/// Mouse button for coordinate clicks.
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MouseButton {
    #[default]
    Left,
    Right,
    Middle,
}

impl std::fmt::Display for MouseButton {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MouseButton::Left => write!(f, "left"),
            MouseButton::Right => write!(f, "right"),
            MouseButton::Middle => write!(f, "middle"),
        }
    }
}

/// Scroll direction for wheel actions.
#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ScrollDirection {
    Up,
    Down,
}

impl std::fmt::Display for ScrollDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScrollDirection::Up => write!(f, "up"),
            ScrollDirection::Down => write!(f, "down"),
        }
    }
}

/// Minimum wheel delta per scroll action. Smaller requests are clamped up.
pub const MIN_SCROLL_AMOUNT: i64 = 200;

/// A single interaction against the page.
///
/// The `done` variant is terminal: the driver never executes it, it ends the
/// test with the reported outcome.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    /// Coordinate click, optionally with a non-left button.
    Click {
        x: i64,
        y: i64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        button: Option<MouseButton>,
    },
    DoubleClick {
        x: i64,
        y: i64,
    },
    MouseMove {
        x: i64,
        y: i64,
    },
    Drag {
        sx: i64,
        sy: i64,
        ex: i64,
        ey: i64,
    },
    /// Semantic click by accessible button name (role=button).
    ClickButton {
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        exact: Option<bool>,
    },
    /// Semantic click by visible text (substring by default).
    ClickText {
        text: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        exact: Option<bool>,
    },
    /// Label-addressed form fill.
    SelectInput {
        field: String,
        value: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        exact: Option<bool>,
    },
    /// Type into the focused element.
    Type {
        text: String,
    },
    /// Press a key combo, e.g. "ctrl+s" or "Escape".
    Key {
        combo: String,
    },
    Scroll {
        x: i64,
        y: i64,
        direction: ScrollDirection,
        amount: i64,
    },
    Wait {
        ms: u64,
    },
    AssertText {
        text: String,
    },
    AssertNotText {
        text: String,
    },
    /// Assert the element at a previously clicked coordinate is visible.
    AssertVisible {
        x: i64,
        y: i64,
    },
    /// Terminal marker: the model considers the test finished.
    Done {
        success: bool,
        reason: String,
    },
}

impl Action {
    /// The snake_case tag this variant serializes under.
    pub fn kind(&self) -> &'static str {
        match self {
            Action::Click { .. } => "click",
            Action::DoubleClick { .. } => "double_click",
            Action::MouseMove { .. } => "mouse_move",
            Action::Drag { .. } => "drag",
            Action::ClickButton { .. } => "click_button",
            Action::ClickText { .. } => "click_text",
            Action::SelectInput { .. } => "select_input",
            Action::Type { .. } => "type",
            Action::Key { .. } => "key",
            Action::Scroll { .. } => "scroll",
            Action::Wait { .. } => "wait",
            Action::AssertText { .. } => "assert_text",
            Action::AssertNotText { .. } => "assert_not_text",
            Action::AssertVisible { .. } => "assert_visible",
            Action::Done { .. } => "done",
        }
    }

    pub fn is_done(&self) -> bool {
        matches!(self, Action::Done { .. })
    }

    pub fn is_assertion(&self) -> bool {
        matches!(
            self,
            Action::AssertText { .. } | Action::AssertNotText { .. } | Action::AssertVisible { .. }
        )
    }

    /// Clicks that probe the DOM and should carry `ElementInfo` on success.
    pub fn is_click(&self) -> bool {
        matches!(
            self,
            Action::Click { .. }
                | Action::DoubleClick { .. }
                | Action::ClickButton { .. }
                | Action::ClickText { .. }
        )
    }

    /// Whether this action is likely to trigger a navigation, so the executor
    /// should wait for network idle before the next action.
    pub fn may_navigate(&self) -> bool {
        matches!(
            self,
            Action::Click { .. }
                | Action::DoubleClick { .. }
                | Action::ClickButton { .. }
                | Action::ClickText { .. }
                | Action::Key { .. }
        )
    }

    /// Stable string used by the repetition guard.
    ///
    /// Signing the same action twice yields the same string; the salient
    /// fields are those that distinguish "the same request again" from a new
    /// one. Re-signing a signed action's source always agrees.
    pub fn signature(&self) -> String {
        match self {
            Action::Click { x, y, button } => format!(
                "click:{},{}:{}",
                x,
                y,
                button.map(|b| b.to_string()).unwrap_or_default()
            ),
            Action::DoubleClick { x, y } => format!("double_click:{},{}", x, y),
            Action::MouseMove { x, y } => format!("mouse_move:{},{}", x, y),
            Action::Drag { sx, sy, ex, ey } => format!("drag:{},{}:{},{}", sx, sy, ex, ey),
            Action::ClickButton { name, exact } => {
                format!("click_button:{}:{}", name, exact.unwrap_or(true))
            }
            Action::ClickText { text, exact } => {
                format!("click_text:{}:{}", text, exact.unwrap_or(false))
            }
            Action::SelectInput { field, value, .. } => {
                format!("select_input:{}:{}", field, value)
            }
            Action::Type { text } => format!("type:{}", text),
            Action::Key { combo } => format!("key:{}", normalize_key_combo(combo)),
            Action::Scroll {
                direction, amount, ..
            } => format!("scroll:{}:{}", direction, amount),
            Action::Wait { ms } => format!("wait:{}", ms),
            Action::AssertText { text } => format!("assert_text:{}", text),
            Action::AssertNotText { text } => format!("assert_not_text:{}", text),
            Action::AssertVisible { x, y } => format!("assert_visible:{},{}", x, y),
            Action::Done { success, .. } => format!("done:{}", success),
        }
    }

    /// A `done{success:false}` carrying the given reason.
    pub fn failed_done(reason: impl Into<String>) -> Self {
        Action::Done {
            success: false,
            reason: reason.into(),
        }
    }
}

/// Normalize a `+`- or `-`-delimited key combo into canonical form.
///
/// Folds modifier aliases (`cmd`/`command`/`meta` → `Meta`, `ctrl`/`control`
/// → `Control`, `alt`/`option` → `Alt`, `esc` → `Escape`), upper-cases single
/// letters, and joins with `+`. Idempotent: normalizing a normalized combo is
/// a no-op.
pub fn normalize_key_combo(combo: &str) -> String {
    combo
        .split(['+', '-'])
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(normalize_key_token)
        .collect::<Vec<_>>()
        .join("+")
}

fn normalize_key_token(token: &str) -> String {
    match token.to_ascii_lowercase().as_str() {
        "cmd" | "command" | "meta" => "Meta".to_string(),
        "ctrl" | "control" => "Control".to_string(),
        "alt" | "option" => "Alt".to_string(),
        "shift" => "Shift".to_string(),
        "esc" | "escape" => "Escape".to_string(),
        "enter" | "return" => "Enter".to_string(),
        "tab" => "Tab".to_string(),
        "space" => "Space".to_string(),
        "backspace" => "Backspace".to_string(),
        "delete" => "Delete".to_string(),
        _ => {
            if token.chars().count() == 1 {
                token.to_ascii_uppercase()
            } else {
                token.to_string()
            }
        }
    }
}

#[cfg(test)]
#[path = "action_tests.rs"]
mod tests;
