// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Tiered recovery after a static run fails.
//!
//! Tiers run in order and the first verified pass wins: (1) replay the
//! sidecar up to the failing test and re-derive the rest agentically,
//! (2) model-rewrite the single failing test in place, (3) re-derive the
//! whole suite. Every tier is verified by re-running the static runner;
//! a tier that cannot verify leaves the on-disk artifacts untouched.

pub mod rewrite;
pub mod static_runner;

use anyhow::Result;

pub use rewrite::{RewriteDecision, RewriteRequest, Rewriter};
pub use static_runner::{RunnerFailure, RunnerReport, StaticRunner};

use crate::browser::SCREENSHOT_TIMEOUT;
use crate::output::{HealMethod, TestReport};
use crate::runner::SuiteRunner;
use crate::script::ScriptReplayer;
use crate::step::SuiteSidecar;

/// Rewrite attempts before escalating to a full agentic rerun.
pub const MAX_REWRITE_ATTEMPTS: u32 = 3;

/// Orchestrates the recovery tiers for one suite.
pub struct Healer<'a> {
    runner: &'a SuiteRunner,
}

impl<'a> Healer<'a> {
    pub fn new(runner: &'a SuiteRunner) -> Self {
        Self { runner }
    }

    /// Recover from a failed static run. Returns the final per-test reports;
    /// unrecovered failures are reported failed.
    pub async fn heal(
        &self,
        failure: Option<RunnerFailure>,
        sidecar: &SuiteSidecar,
    ) -> Result<Vec<TestReport>> {
        // Tier 1 needs to know which test failed; an unparseable report
        // goes straight to full re-derivation.
        if let Some(ref failure) = failure {
            if let Some(index) = self.failing_index(failure) {
                if let Some(reports) = self.replay_and_continue(index, sidecar).await? {
                    return Ok(reports);
                }
                if let Some(reports) = self.rewrite(failure.clone()).await? {
                    return Ok(reports);
                }
            }
        }
        self.runner.full_agentic(Some(HealMethod::Agentic)).await
    }

    /// Recover a suite whose sidecar no longer covers it: replay the covered
    /// prefix, derive the rest. Used before any static run when drift is
    /// detected.
    pub async fn recover_drift(
        &self,
        covered: usize,
        sidecar: &SuiteSidecar,
    ) -> Result<Vec<TestReport>> {
        match self.replay_and_continue(covered, sidecar).await? {
            Some(reports) => Ok(reports),
            None => self.runner.full_agentic(Some(HealMethod::Agentic)).await,
        }
    }

    fn failing_index(&self, failure: &RunnerFailure) -> Option<usize> {
        self.runner
            .suite()
            .tests
            .iter()
            .position(|t| t.name == failure.test_name)
    }

    /// Tier 1: fast-forward the sidecar prefix, then hand the page to the
    /// agentic driver from the failed test onward. `None` means the tier
    /// did not produce a verified pass.
    async fn replay_and_continue(
        &self,
        start: usize,
        sidecar: &SuiteSidecar,
    ) -> Result<Option<Vec<TestReport>>> {
        let runner = self.runner;
        let suite = runner.suite();

        if runner.executor().navigate(runner.base_url()).await.is_err() {
            return Ok(None);
        }

        let replayer = ScriptReplayer::new(runner.executor());
        for test in &suite.tests[..start] {
            let Some(entry) = sidecar.test(&test.name) else {
                return Ok(None);
            };
            if replayer.replay(&entry.steps).await.is_err() {
                // A prefix that no longer replays means the sidecar is stale
                // beyond this tier's reach.
                return Ok(None);
            }
        }

        let leg = runner.run_tests_from(start, true).await;
        if !leg.iter().all(|r| r.outcome.success) {
            return Ok(None);
        }

        // Combined artifacts: untouched prefix steps + freshly recorded
        // continuation steps.
        let mut tests: Vec<(String, Vec<crate::step::RecordedStep>)> = suite.tests[..start]
            .iter()
            .filter_map(|t| sidecar.test(&t.name))
            .map(|entry| (entry.name.clone(), entry.steps.clone()))
            .collect();
        for result in &leg {
            tests.push((result.name.clone(), result.outcome.steps.clone()));
        }

        if !runner.write_and_verify(&tests).await? {
            return Ok(None);
        }

        let mut reports = runner.sidecar_pass_reports(&tests);
        for report in reports.iter_mut().skip(start) {
            report.healed = Some(HealMethod::Replay);
        }
        Ok(Some(reports))
    }

    /// Tier 2: model-repair the failing test block in place, re-running the
    /// static runner after each splice. The sidecar is left untouched.
    async fn rewrite(&self, mut failure: RunnerFailure) -> Result<Option<Vec<TestReport>>> {
        let runner = self.runner;
        let script_path = runner.script_path();
        let original = std::fs::read_to_string(&script_path)?;
        let rewriter = Rewriter::new(runner.healer_model());

        let mut script = original.clone();
        for _ in 0..MAX_REWRITE_ATTEMPTS {
            let Some(block) = rewrite::find_test_block(&script, &failure.test_name) else {
                break;
            };
            let test_code = block.body(&script).to_string();

            let decision = rewriter
                .propose(&RewriteRequest {
                    test_name: &failure.test_name,
                    test_code: &test_code,
                    script: &script,
                    error_message: &failure.message,
                    stack: failure.stack.as_deref(),
                    screenshot: self.post_failure_screenshot().await,
                })
                .await;

            let new_body = match decision {
                RewriteDecision::Rewrite { new_test_body, .. } => new_test_body,
                RewriteDecision::Agentic { .. } => break,
            };
            let Some(spliced) =
                rewrite::splice_test_body(&script, &failure.test_name, &new_body)
            else {
                break;
            };

            std::fs::write(&script_path, &spliced)?;
            let report = runner.static_runner().run(&script_path).await?;
            if report.passed {
                let mut reports = runner.sidecar_pass_reports_current()?;
                for report in reports.iter_mut() {
                    if report.name == failure.test_name {
                        report.healed = Some(HealMethod::Rewrite);
                    }
                }
                return Ok(Some(reports));
            }

            script = spliced;
            match report.failure {
                Some(next) => failure = next,
                None => break,
            }
        }

        // No verified pass: restore the original script.
        std::fs::write(&script_path, original)?;
        Ok(None)
    }

    async fn post_failure_screenshot(&self) -> Option<Vec<u8>> {
        tokio::time::timeout(
            SCREENSHOT_TIMEOUT,
            self.runner.executor().page().screenshot_png(),
        )
        .await
        .ok()?
        .ok()
    }
}

#[cfg(test)]
#[path = "heal_tests.rs"]
mod tests;
