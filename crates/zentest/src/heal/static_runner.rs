// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Launching the external static runner and parsing its report.
//!
//! The runner (Playwright by default) inherits stdout/stderr so the user
//! sees its output live; the structured JSON report goes to a temp file
//! named by PID and timestamp and is parsed on exit.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use serde::Deserialize;
use thiserror::Error;

use crate::config::RunnerConfig;
use crate::env::names;

/// The first failing test extracted from a runner report.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunnerFailure {
    pub test_name: String,
    pub message: String,
    pub stack: Option<String>,
}

/// Outcome of one static run.
#[derive(Clone, Debug)]
pub struct RunnerReport {
    pub passed: bool,
    /// Set when the report identified which test failed; `None` when the
    /// runner failed without a parseable report.
    pub failure: Option<RunnerFailure>,
}

#[derive(Debug, Error)]
pub enum StaticRunError {
    #[error(
        "Static runner '{0}' not found: install it or set [runner] command in zentest.toml"
    )]
    MissingBinary(String),

    #[error("Failed to launch static runner: {0}")]
    Io(#[from] std::io::Error),

    #[error("Static runner command is empty")]
    EmptyCommand,
}

/// Runs the configured external test runner against a generated script.
pub struct StaticRunner {
    command: Vec<String>,
    base_url: String,
}

impl StaticRunner {
    pub fn new(config: &RunnerConfig, base_url: impl Into<String>) -> Self {
        Self {
            command: config.command.clone(),
            base_url: base_url.into(),
        }
    }

    /// Run the script; `Ok` means the runner ran to completion, pass or
    /// fail. `Err` is infrastructure (missing binary, spawn failure).
    pub async fn run(&self, script_path: &Path) -> Result<RunnerReport, StaticRunError> {
        let (program, args) = self
            .command
            .split_first()
            .ok_or(StaticRunError::EmptyCommand)?;

        let report_path = temp_report_path();
        let mut command = tokio::process::Command::new(program);
        command
            .args(args)
            .arg(script_path)
            .arg("--reporter=json")
            .env(names::ZENTEST_BASE_URL, &self.base_url)
            .env("PLAYWRIGHT_JSON_OUTPUT_NAME", &report_path)
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        let status = command.status().await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StaticRunError::MissingBinary(program.clone())
            } else {
                StaticRunError::Io(e)
            }
        })?;

        let report = std::fs::read_to_string(&report_path).ok();
        let _ = std::fs::remove_file(&report_path);

        if status.success() {
            return Ok(RunnerReport {
                passed: true,
                failure: None,
            });
        }

        let failure = report.as_deref().and_then(first_failure);
        Ok(RunnerReport {
            passed: false,
            failure,
        })
    }
}

fn temp_report_path() -> PathBuf {
    std::env::temp_dir().join(format!(
        "zentest-report-{}-{}.json",
        std::process::id(),
        chrono::Utc::now().timestamp_millis()
    ))
}

// Playwright JSON-reporter shapes, reduced to what the healer needs.

#[derive(Deserialize)]
struct Report {
    #[serde(default)]
    suites: Vec<Suite>,
}

#[derive(Deserialize)]
struct Suite {
    #[serde(default)]
    suites: Vec<Suite>,
    #[serde(default)]
    specs: Vec<Spec>,
}

#[derive(Deserialize)]
struct Spec {
    title: String,
    #[serde(default)]
    tests: Vec<SpecTest>,
}

#[derive(Deserialize)]
struct SpecTest {
    #[serde(default)]
    results: Vec<SpecResult>,
}

#[derive(Deserialize)]
struct SpecResult {
    #[serde(default)]
    status: String,
    #[serde(default)]
    error: Option<SpecError>,
}

#[derive(Deserialize)]
struct SpecError {
    #[serde(default)]
    message: String,
    #[serde(default)]
    stack: Option<String>,
}

/// Extract the first failing test from a Playwright JSON report.
pub fn first_failure(report_json: &str) -> Option<RunnerFailure> {
    let report: Report = serde_json::from_str(report_json).ok()?;
    report.suites.iter().find_map(failure_in_suite)
}

fn failure_in_suite(suite: &Suite) -> Option<RunnerFailure> {
    for spec in &suite.specs {
        for test in &spec.tests {
            for result in &test.results {
                if matches!(result.status.as_str(), "passed" | "skipped") {
                    continue;
                }
                let (message, stack) = match &result.error {
                    Some(error) => (error.message.clone(), error.stack.clone()),
                    None => (format!("test {} failed", spec.title), None),
                };
                return Some(RunnerFailure {
                    test_name: spec.title.clone(),
                    message,
                    stack,
                });
            }
        }
    }
    suite.suites.iter().find_map(failure_in_suite)
}

#[cfg(test)]
#[path = "static_runner_tests.rs"]
mod tests;
