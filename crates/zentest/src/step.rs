// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Recorded steps and executor results.
//!
//! A `RecordedStep` is created once by the agentic driver and never mutated;
//! on test success the step list is flushed to the sidecar file. Screenshots
//! live only in memory and are skipped by serde.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::action::Action;
use crate::element::ElementInfo;

/// Classification of an expected action failure.
#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum FailureKind {
    ElementNotFound,
    LocatorAmbiguous,
    NavigationTimeout,
    AssertionFailed,
    ActionThrow,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            FailureKind::ElementNotFound => "element-not-found",
            FailureKind::LocatorAmbiguous => "locator-ambiguous",
            FailureKind::NavigationTimeout => "navigation-timeout",
            FailureKind::AssertionFailed => "assertion-failed",
            FailureKind::ActionThrow => "action-throw",
        };
        f.write_str(s)
    }
}

/// An expected action failure, carried as data rather than thrown.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct ExecFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl ExecFailure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn element_not_found(message: impl Into<String>) -> Self {
        Self::new(FailureKind::ElementNotFound, message)
    }

    pub fn assertion_failed(message: impl Into<String>) -> Self {
        Self::new(FailureKind::AssertionFailed, message)
    }
}

/// Outcome of executing one action against the page.
#[derive(Clone, Debug)]
pub struct ActionResult {
    pub action: Action,
    /// PNG captured after the action settled.
    pub screenshot: Option<Vec<u8>>,
    /// What the click landed on, when the action probed the DOM.
    pub element_info: Option<ElementInfo>,
    pub error: Option<ExecFailure>,
    pub timestamp: DateTime<Utc>,
}

impl ActionResult {
    pub fn ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Which execution mode produced a step.
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StepMode {
    #[default]
    Agentic,
    Replay,
}

/// One executed action with everything needed to replay or heal it later.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct RecordedStep {
    pub action: Action,
    pub reasoning: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub element_info: Option<ElementInfo>,
    /// In-memory only; dropped on serialization.
    #[serde(skip)]
    pub screenshot: Option<Vec<u8>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub mode: StepMode,
}

impl RecordedStep {
    /// Record the outcome of an executed action.
    pub fn from_result(result: &ActionResult, reasoning: &str, mode: StepMode) -> Self {
        Self {
            action: result.action.clone(),
            reasoning: reasoning.to_string(),
            element_info: result.element_info.clone(),
            screenshot: result.screenshot.clone(),
            generated_code: None,
            error: result.error.as_ref().map(|e| e.to_string()),
            timestamp: result.timestamp,
            mode,
        }
    }

    pub fn ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Per-test entry in the sidecar file.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct SidecarTest {
    pub name: String,
    pub steps: Vec<RecordedStep>,
}

/// Persisted record of everything a suite's agentic run did.
///
/// The single source of truth linking the generated script back to recorded
/// intent; consumed by the replayer and the healer.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct SuiteSidecar {
    pub tests: Vec<SidecarTest>,
}

impl SuiteSidecar {
    pub fn test(&self, name: &str) -> Option<&SidecarTest> {
        self.tests.iter().find(|t| t.name == name)
    }

    pub fn test_names(&self) -> Vec<&str> {
        self.tests.iter().map(|t| t.name.as_str()).collect()
    }
}

#[cfg(test)]
#[path = "step_tests.rs"]
mod tests;
