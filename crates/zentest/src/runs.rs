// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Per-run diagnostics under `runs/<suite>-<timestamp>/`.
//!
//! Each run leaves `results.json`, an `error.txt` when something failed, and
//! any failure screenshots. Only the 10 newest runs per suite are kept.

use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::output::RunSummary;

/// Runs retained per suite; older directories are pruned.
pub const KEEP_RUNS: usize = 10;

#[derive(Serialize)]
struct ResultEntry<'a> {
    name: &'a str,
    passed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<&'a str>,
    duration_ms: u128,
    actions: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    healed: Option<String>,
}

#[derive(Serialize)]
struct ResultsFile<'a> {
    suite: &'a str,
    passed: usize,
    failed: usize,
    duration_ms: u128,
    input_tokens: u64,
    output_tokens: u64,
    tests: Vec<ResultEntry<'a>>,
}

/// Writes run diagnostics and prunes old runs.
pub struct RunRecorder {
    root: PathBuf,
}

impl RunRecorder {
    /// `root` is the directory holding all `runs/` subdirectories.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Record one run. Returns the created run directory.
    pub fn record(
        &self,
        summary: &RunSummary,
        failure_screenshots: &[(String, Vec<u8>)],
    ) -> io::Result<PathBuf> {
        let stamp = chrono::Utc::now().format("%Y-%m-%dT%H-%M-%S%.3f");
        let dir = self.root.join(format!("{}-{}", summary.suite, stamp));
        std::fs::create_dir_all(&dir)?;

        let results = ResultsFile {
            suite: &summary.suite,
            passed: summary.passed_count(),
            failed: summary.failed_count(),
            duration_ms: summary.duration.as_millis(),
            input_tokens: summary.usage.input_tokens,
            output_tokens: summary.usage.output_tokens,
            tests: summary
                .reports
                .iter()
                .map(|r| ResultEntry {
                    name: &r.name,
                    passed: r.passed,
                    reason: r.reason.as_deref(),
                    duration_ms: r.duration.as_millis(),
                    actions: r.action_count,
                    healed: r.healed.map(|h| h.to_string()),
                })
                .collect(),
        };
        std::fs::write(
            dir.join("results.json"),
            serde_json::to_string_pretty(&results).unwrap_or_default(),
        )?;

        let failures: Vec<String> = summary
            .reports
            .iter()
            .filter(|r| !r.passed)
            .map(|r| {
                format!(
                    "{}: {}",
                    r.name,
                    r.reason.as_deref().unwrap_or("failed")
                )
            })
            .collect();
        if !failures.is_empty() {
            std::fs::write(dir.join("error.txt"), failures.join("\n") + "\n")?;
        }

        for (test_name, png) in failure_screenshots {
            std::fs::write(dir.join(format!("{}.png", test_name)), png)?;
        }

        self.prune(&summary.suite)?;
        Ok(dir)
    }

    /// Remove the oldest run directories beyond [`KEEP_RUNS`] for a suite.
    fn prune(&self, suite: &str) -> io::Result<()> {
        let prefix = format!("{}-", suite);
        let mut runs: Vec<PathBuf> = match std::fs::read_dir(&self.root) {
            Ok(entries) => entries
                .filter_map(|e| e.ok())
                .map(|e| e.path())
                .filter(|p| {
                    p.is_dir()
                        && p.file_name()
                            .and_then(|n| n.to_str())
                            .is_some_and(|n| n.starts_with(&prefix))
                })
                .collect(),
            Err(_) => return Ok(()),
        };
        // Timestamped names sort chronologically.
        runs.sort();
        while runs.len() > KEEP_RUNS {
            let oldest = runs.remove(0);
            let _ = std::fs::remove_dir_all(oldest);
        }
        Ok(())
    }
}

/// Root runs directory next to the suite artifacts.
pub fn runs_root(artifact_dir: &Path) -> PathBuf {
    artifact_dir.join("runs")
}

#[cfg(test)]
#[path = "runs_tests.rs"]
mod tests;
