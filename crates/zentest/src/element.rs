// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Element metadata captured at click time.
//!
//! The DOM probe returns the raw attributes of whatever the click landed on;
//! [`ElementInfo::derive_selector`] turns them into the best-effort selector
//! recorded alongside the step.

use serde::{Deserialize, Serialize};

/// Maximum characters of element text kept in a recorded step.
pub const MAX_TEXT_LEN: usize = 80;

/// Text longer than this is too noisy for a `:has-text()` selector.
const MAX_HAS_TEXT_LEN: usize = 30;

/// What the DOM probe found at a click coordinate.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct ElementInfo {
    pub tag: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(default, rename = "ariaLabel", skip_serializing_if = "Option::is_none")]
    pub aria_label: Option<String>,
    #[serde(default, rename = "dataTestid", skip_serializing_if = "Option::is_none")]
    pub data_testid: Option<String>,
    /// Best-effort selector derived from the fields above.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selector: Option<String>,
    /// Text of the `<label>` associated with an input, when present.
    #[serde(default, rename = "labelText", skip_serializing_if = "Option::is_none")]
    pub label_text: Option<String>,
}

impl ElementInfo {
    /// Truncate free text to the recorded maximum.
    pub fn truncate_text(text: &str) -> String {
        text.trim().chars().take(MAX_TEXT_LEN).collect()
    }

    /// Derive the best-effort selector for this element.
    ///
    /// Priority: `data-testid` > `#id` > `[role][aria-label]` >
    /// `tag:has-text(text)` for buttons/anchors with short text >
    /// `tag.class1.class2` > bare tag.
    pub fn derive_selector(&self) -> String {
        if let Some(ref testid) = self.data_testid {
            if !testid.is_empty() {
                return format!("[data-testid=\"{}\"]", testid);
            }
        }
        if let Some(ref id) = self.id {
            if !id.is_empty() {
                return format!("#{}", id);
            }
        }
        if let (Some(role), Some(label)) = (&self.role, &self.aria_label) {
            if !role.is_empty() && !label.is_empty() {
                return format!("[role=\"{}\"][aria-label=\"{}\"]", role, label);
            }
        }
        if matches!(self.tag.as_str(), "button" | "a") {
            if let Some(ref text) = self.text {
                let text = text.trim();
                if !text.is_empty() && text.chars().count() <= MAX_HAS_TEXT_LEN {
                    return format!("{}:has-text(\"{}\")", self.tag, text);
                }
            }
        }
        if let Some(ref class) = self.class {
            let classes: Vec<&str> = class.split_whitespace().take(2).collect();
            if !classes.is_empty() {
                return format!("{}.{}", self.tag, classes.join("."));
            }
        }
        self.tag.clone()
    }

    /// Fill `selector` from the other fields if the probe didn't set one.
    pub fn with_derived_selector(mut self) -> Self {
        if self.selector.is_none() {
            self.selector = Some(self.derive_selector());
        }
        self
    }

    /// Whether this element is a form input of some kind.
    pub fn is_input(&self) -> bool {
        matches!(self.tag.as_str(), "input" | "textarea" | "select")
    }

    /// Whether this element is button-like (button tag or button role).
    pub fn is_button(&self) -> bool {
        self.tag == "button" || self.role.as_deref() == Some("button")
    }

    /// Accessible name used for role-based locators: aria-label, else
    /// associated label text, else the probe's computed name, else
    /// placeholder.
    pub fn accessible_name(&self) -> Option<&str> {
        self.aria_label
            .as_deref()
            .or(self.label_text.as_deref())
            .or(self.name.as_deref())
            .or(self.placeholder.as_deref())
            .filter(|s| !s.is_empty())
    }
}

#[cfg(test)]
#[path = "element_tests.rs"]
mod tests;
