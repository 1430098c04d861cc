// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Locator derivation from recorded element metadata.
//!
//! The builder renders these to script statements and the replayer resolves
//! them against the live page, so both sides agree on what "the same
//! element" means.

use crate::element::ElementInfo;

/// Tags too generic to survive as a raw CSS selector.
const GENERIC_TAGS: &[&str] = &[
    "p", "h1", "h2", "h3", "h4", "h5", "h6", "div", "span", "a", "button", "input", "textarea",
    "label", "form", "section", "article", "header", "footer", "nav", "main", "aside",
];

/// A structured locator shared by the builder and the replayer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Locator {
    TestId(String),
    Role { role: String, name: String },
    Label(String),
    Placeholder(String),
    Text { text: String, exact: bool },
    Id(String),
    Css(String),
}

impl Locator {
    /// Render as a page locator expression.
    pub fn to_code(&self) -> String {
        match self {
            Locator::TestId(id) => format!("page.getByTestId('{}')", escape(id)),
            Locator::Role { role, name } => format!(
                "page.getByRole('{}', {{ name: '{}', exact: true }})",
                escape(role),
                escape(name)
            ),
            Locator::Label(label) => format!("page.getByLabel('{}')", escape(label)),
            Locator::Placeholder(p) => format!("page.getByPlaceholder('{}')", escape(p)),
            Locator::Text { text, exact } => {
                if *exact {
                    format!("page.getByText('{}', {{ exact: true }})", escape(text))
                } else {
                    format!("page.getByText('{}')", escape(text))
                }
            }
            Locator::Id(id) => format!("page.locator('#{}')", escape(id)),
            Locator::Css(selector) => format!("page.locator('{}')", escape(selector)),
        }
    }
}

/// Derive the locator the script will use for a recorded element.
///
/// Priority: test id, role + accessible name, label, placeholder, exact
/// text, element id, then the raw selector only when it is specific enough.
/// Inputs and buttons never fall back to raw CSS; `None` sends the caller to
/// the coordinate fallback.
pub fn build_locator(info: &ElementInfo) -> Option<Locator> {
    if let Some(ref testid) = info.data_testid {
        if !testid.is_empty() {
            return Some(Locator::TestId(testid.clone()));
        }
    }

    let role = inferred_role(info);
    if let (Some(role), Some(name)) = (role, info.accessible_name()) {
        return Some(Locator::Role {
            role: role.to_string(),
            name: name.to_string(),
        });
    }

    if let Some(label) = non_empty(info.label_text.as_deref()) {
        return Some(Locator::Label(label.to_string()));
    }
    if let Some(placeholder) = non_empty(info.placeholder.as_deref()) {
        return Some(Locator::Placeholder(placeholder.to_string()));
    }
    if let Some(text) = non_empty(info.text.as_deref()) {
        return Some(Locator::Text {
            text: text.to_string(),
            exact: true,
        });
    }
    if let Some(id) = non_empty(info.id.as_deref()) {
        return Some(Locator::Id(id.to_string()));
    }

    // Brittle selectors are worse than coordinates for inputs and buttons.
    if info.is_input() || info.is_button() {
        return None;
    }
    if let Some(selector) = non_empty(info.selector.as_deref()) {
        if !GENERIC_TAGS.contains(&selector) {
            return Some(Locator::Css(selector.to_string()));
        }
    }
    None
}

/// Role used for locator purposes: the element's explicit or implicit role,
/// with inputs defaulting to `textbox`.
fn inferred_role(info: &ElementInfo) -> Option<&str> {
    if let Some(role) = non_empty(info.role.as_deref()) {
        return Some(role);
    }
    if info.is_button() {
        return Some("button");
    }
    if info.is_input() {
        return Some("textbox");
    }
    None
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|s| !s.is_empty())
}

/// Escape a string for a single-quoted script literal: backslash, single
/// quote, newline, carriage return, tab.
pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
#[path = "locator_tests.rs"]
mod tests;
