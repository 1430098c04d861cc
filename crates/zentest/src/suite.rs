// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Markdown test-suite files.
//!
//! One file per suite: the `#` heading names the suite (file stem when
//! absent), each `##` heading starts a test, and the lines up to the next
//! `##` form its plain-English description.

use std::path::Path;

use thiserror::Error;

/// A single plain-English test.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Test {
    /// Stable identifier, taken from the `##` heading (kebab-case by
    /// convention).
    pub name: String,
    /// Free-form natural-language description of what to do and verify.
    pub description: String,
}

/// An ordered suite of tests sharing browser state.
///
/// Ordering is significant: tests run serially against the same page, and a
/// failure stops the rest of the suite.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TestSuite {
    pub name: String,
    pub tests: Vec<Test>,
}

#[derive(Debug, Error)]
pub enum SuiteError {
    #[error("Failed to read suite file: {0}")]
    Io(#[from] std::io::Error),
}

impl TestSuite {
    /// Load and parse a suite from a markdown file.
    pub fn load(path: &Path) -> Result<Self, SuiteError> {
        let content = std::fs::read_to_string(path)?;
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "suite".to_string());
        Ok(Self::parse(&content, &stem))
    }

    /// Parse suite markdown. `default_name` is used when there is no `#`
    /// heading.
    pub fn parse(content: &str, default_name: &str) -> Self {
        let mut suite_name: Option<String> = None;
        let mut tests: Vec<Test> = Vec::new();
        let mut current: Option<(String, Vec<String>)> = None;

        for line in content.lines() {
            let trimmed = line.trim_end();
            if let Some(heading) = heading_text(trimmed, "## ") {
                flush_test(&mut tests, current.take());
                current = Some((heading.to_string(), Vec::new()));
            } else if let Some(heading) = heading_text(trimmed, "# ") {
                if suite_name.is_none() && current.is_none() {
                    suite_name = Some(heading.to_string());
                }
            } else if let Some((_, ref mut body)) = current {
                body.push(trimmed.to_string());
            }
        }
        flush_test(&mut tests, current.take());

        TestSuite {
            name: suite_name.unwrap_or_else(|| default_name.to_string()),
            tests,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.tests.is_empty()
    }

    pub fn test_names(&self) -> Vec<&str> {
        self.tests.iter().map(|t| t.name.as_str()).collect()
    }
}

fn heading_text<'a>(line: &'a str, prefix: &str) -> Option<&'a str> {
    let rest = line.strip_prefix(prefix)?;
    let rest = rest.trim();
    (!rest.is_empty()).then_some(rest)
}

fn flush_test(tests: &mut Vec<Test>, current: Option<(String, Vec<String>)>) {
    if let Some((name, body)) = current {
        let description = body.join("\n").trim().to_string();
        // Tests with no description have nothing for the model to do.
        if !description.is_empty() {
            tests.push(Test { name, description });
        }
    }
}

#[cfg(test)]
#[path = "suite_tests.rs"]
mod tests;
