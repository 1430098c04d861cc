// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Suite execution: decide between static replay, healing, and agentic
//! derivation, and assemble the per-test reports.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use parking_lot::Mutex;

use crate::browser::BrowserExecutor;
use crate::config::ResolvedConfig;
use crate::driver::{AgenticDriver, CancelFlag, DriverOptions, TestOutcome};
use crate::heal::{Healer, StaticRunner};
use crate::model::ModelClient;
use crate::output::{self, HealMethod, RunSummary, TestReport};
use crate::script::builder::{write_artifacts, ScriptBuilder};
use crate::script::sidecar;
use crate::step::RecordedStep;
use crate::suite::TestSuite;
use crate::usage::UsageTally;

/// Runner-level options from the CLI.
#[derive(Clone, Debug, Default)]
pub struct RunnerOptions {
    /// Force agentic re-derivation even when artifacts exist.
    pub force_agentic: bool,
    /// Skip the healing pipeline on static failure.
    pub no_heal: bool,
    pub verbose: bool,
}

/// One agentically executed test.
pub struct TestLegResult {
    pub name: String,
    pub outcome: TestOutcome,
    pub duration: Duration,
}

/// Owns everything needed to run one suite end to end.
pub struct SuiteRunner {
    suite: TestSuite,
    executor: BrowserExecutor,
    agentic_model: Arc<dyn ModelClient>,
    healer_model: Arc<dyn ModelClient>,
    config: ResolvedConfig,
    artifact_dir: PathBuf,
    options: RunnerOptions,
    cancel: CancelFlag,
    usage: UsageTally,
    last_static: Mutex<Duration>,
    failure_shots: Mutex<Vec<(String, Vec<u8>)>>,
}

impl SuiteRunner {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        suite: TestSuite,
        executor: BrowserExecutor,
        agentic_model: Arc<dyn ModelClient>,
        healer_model: Arc<dyn ModelClient>,
        config: ResolvedConfig,
        artifact_dir: PathBuf,
        options: RunnerOptions,
        cancel: CancelFlag,
        usage: UsageTally,
    ) -> Self {
        Self {
            suite,
            executor,
            agentic_model,
            healer_model,
            config,
            artifact_dir,
            options,
            cancel,
            usage,
            last_static: Mutex::new(Duration::ZERO),
            failure_shots: Mutex::new(Vec::new()),
        }
    }

    pub fn suite(&self) -> &TestSuite {
        &self.suite
    }

    pub fn executor(&self) -> &BrowserExecutor {
        &self.executor
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    pub fn healer_model(&self) -> Arc<dyn ModelClient> {
        Arc::clone(&self.healer_model)
    }

    pub fn script_path(&self) -> PathBuf {
        sidecar::script_path(&self.artifact_dir, &self.suite.name)
    }

    pub fn sidecar_path(&self) -> PathBuf {
        sidecar::sidecar_path(&self.artifact_dir, &self.suite.name)
    }

    pub fn static_runner(&self) -> StaticRunner {
        StaticRunner::new(&self.config.runner, &self.config.base_url)
    }

    /// Run the suite and emit result lines plus the summary table.
    pub async fn run(&self) -> Result<RunSummary> {
        let start = Instant::now();
        let reports = self.run_inner().await?;

        for report in &reports {
            output::print_result_line(report);
        }
        let summary = RunSummary {
            suite: self.suite.name.clone(),
            reports,
            duration: start.elapsed(),
            usage: self.usage.snapshot(),
        };
        output::print_summary(&summary);

        let shots = std::mem::take(&mut *self.failure_shots.lock());
        let recorder = crate::runs::RunRecorder::new(crate::runs::runs_root(&self.artifact_dir));
        if let Err(e) = recorder.record(&summary, &shots) {
            output::print_warning(format!("Failed to write run diagnostics: {}", e));
        }
        Ok(summary)
    }

    async fn run_inner(&self) -> Result<Vec<TestReport>> {
        if self.suite.is_empty() {
            return Ok(Vec::new());
        }

        let script_path = self.script_path();
        if self.options.force_agentic || !script_path.exists() {
            return self.full_agentic(None).await;
        }
        let Some(saved) = sidecar::load(&self.sidecar_path())? else {
            // Script without sidecar is out of date by definition.
            return self.full_agentic(None).await;
        };

        let covered = sidecar::covered_prefix(&saved, &self.suite);
        if covered < self.suite.tests.len() {
            // Suite drifted past the sidecar: replay what's covered, derive
            // the rest.
            return Healer::new(self).recover_drift(covered, &saved).await;
        }

        let (report, _) = self.timed_static_run(&script_path).await?;
        if report.passed {
            return self.sidecar_pass_reports_current();
        }

        if self.options.no_heal {
            return Ok(self.unhealed_reports(report.failure.as_ref()));
        }
        Healer::new(self).heal(report.failure, &saved).await
    }

    /// Run tests agentically from `start` to the end of the suite, stopping
    /// at the first failure. The first test navigates unless
    /// `skip_first_navigation`; later tests always continue on the shared
    /// page.
    pub(crate) async fn run_tests_from(
        &self,
        start: usize,
        skip_first_navigation: bool,
    ) -> Vec<TestLegResult> {
        let mut results = Vec::new();
        for (offset, test) in self.suite.tests[start..].iter().enumerate() {
            let skip_navigation = skip_first_navigation || offset > 0;
            let options = DriverOptions {
                max_steps: self.config.max_steps,
                viewport: self.config.viewport,
                skip_navigation,
                verbose: self.options.verbose,
                ..Default::default()
            };
            let driver = AgenticDriver::new(
                &self.executor,
                Arc::clone(&self.agentic_model),
                &self.config.base_url,
                options,
                self.cancel.clone(),
            );
            let test_start = Instant::now();
            let outcome = driver.run(test).await;
            let failed = !outcome.success;
            if failed {
                // Keep the last screenshot for the run diagnostics.
                if let Some(png) = outcome.steps.iter().rev().find_map(|s| s.screenshot.clone())
                {
                    self.failure_shots.lock().push((test.name.clone(), png));
                }
            }
            results.push(TestLegResult {
                name: test.name.clone(),
                outcome,
                duration: test_start.elapsed(),
            });
            if failed {
                break;
            }
        }
        results
    }

    /// Full agentic derivation of the whole suite. With `healed` set this is
    /// the last healing tier and the new artifacts must verify; without it
    /// (first run, `--agentic`) artifacts are written unverified.
    pub(crate) async fn full_agentic(
        &self,
        healed: Option<HealMethod>,
    ) -> Result<Vec<TestReport>> {
        let leg = self.run_tests_from(0, false).await;
        let all_ok = leg.iter().all(|r| r.outcome.success);

        let mut reports: Vec<TestReport> = Vec::new();
        if all_ok {
            let tests = leg_tests(&leg);
            let verified = match healed {
                Some(_) => self.write_and_verify(&tests).await?,
                None => {
                    self.write_artifacts(&tests)?;
                    true
                }
            };
            if verified {
                for result in &leg {
                    let mut report = TestReport::passed(
                        result.name.clone(),
                        result.duration,
                        result.outcome.steps.len(),
                    );
                    report.healed = healed;
                    reports.push(report);
                }
                return Ok(reports);
            }
            for result in &leg {
                reports.push(TestReport::failed(
                    result.name.clone(),
                    "verification failed after agentic rerun",
                    result.duration,
                    result.outcome.steps.len(),
                ));
            }
            return Ok(reports);
        }

        for result in &leg {
            if result.outcome.success {
                reports.push(TestReport::passed(
                    result.name.clone(),
                    result.duration,
                    result.outcome.steps.len(),
                ));
            } else {
                reports.push(TestReport::failed(
                    result.name.clone(),
                    result.outcome.reason.clone(),
                    result.duration,
                    result.outcome.steps.len(),
                ));
            }
        }
        for test in self.suite.tests.iter().skip(leg.len()) {
            reports.push(TestReport::failed(
                test.name.clone(),
                "not run: earlier test failed",
                Duration::ZERO,
                0,
            ));
        }
        Ok(reports)
    }

    /// Write artifacts from `(name, steps)` pairs.
    pub(crate) fn write_artifacts(&self, tests: &[(String, Vec<RecordedStep>)]) -> Result<()> {
        let builder = ScriptBuilder::new(&self.suite.name, &self.config.base_url);
        let script = builder.build(tests);
        write_artifacts(&self.artifact_dir, &self.suite.name, &script)?;
        Ok(())
    }

    /// Write artifacts, then verify with a static run. On verification
    /// failure the previous artifacts are restored untouched.
    pub(crate) async fn write_and_verify(
        &self,
        tests: &[(String, Vec<RecordedStep>)],
    ) -> Result<bool> {
        let script_path = self.script_path();
        let sidecar_path = self.sidecar_path();
        let old_script = std::fs::read_to_string(&script_path).ok();
        let old_sidecar = std::fs::read_to_string(&sidecar_path).ok();

        self.write_artifacts(tests)?;
        let verify = self.timed_static_run(&script_path).await;

        let restore = || {
            if let Some(ref old) = old_script {
                let _ = std::fs::write(&script_path, old);
            }
            if let Some(ref old) = old_sidecar {
                let _ = std::fs::write(&sidecar_path, old);
            }
        };

        match verify {
            Ok((report, _)) if report.passed => Ok(true),
            Ok(_) => {
                restore();
                Ok(false)
            }
            Err(e) => {
                restore();
                Err(e.into())
            }
        }
    }

    /// Static run with its duration recorded for report attribution.
    pub(crate) async fn timed_static_run(
        &self,
        script_path: &std::path::Path,
    ) -> Result<(crate::heal::RunnerReport, Duration), crate::heal::static_runner::StaticRunError>
    {
        let start = Instant::now();
        let report = self.static_runner().run(script_path).await?;
        let duration = start.elapsed();
        *self.last_static.lock() = duration;
        Ok((report, duration))
    }

    /// Reports for a fully passing static run, action counts from the
    /// sidecar pairs, duration split evenly across tests.
    pub(crate) fn sidecar_pass_reports(
        &self,
        tests: &[(String, Vec<RecordedStep>)],
    ) -> Vec<TestReport> {
        let total = *self.last_static.lock();
        let per_test = if tests.is_empty() {
            Duration::ZERO
        } else {
            total / tests.len() as u32
        };
        tests
            .iter()
            .map(|(name, steps)| TestReport::passed(name.clone(), per_test, steps.len()))
            .collect()
    }

    /// Same as [`sidecar_pass_reports`], from the sidecar on disk.
    pub(crate) fn sidecar_pass_reports_current(&self) -> Result<Vec<TestReport>> {
        let saved = sidecar::load(&self.sidecar_path())?.unwrap_or_default();
        let tests: Vec<(String, Vec<RecordedStep>)> = saved
            .tests
            .into_iter()
            .map(|t| (t.name, t.steps))
            .collect();
        Ok(self.sidecar_pass_reports(&tests))
    }

    /// Reports when healing is disabled: the failing test carries the
    /// runner's message, everything after it is reported failed as not run.
    fn unhealed_reports(
        &self,
        failure: Option<&crate::heal::RunnerFailure>,
    ) -> Vec<TestReport> {
        let failing_name = failure.map(|f| f.test_name.as_str());
        let failing_index = failing_name
            .and_then(|name| self.suite.tests.iter().position(|t| t.name == name))
            .unwrap_or(0);

        self.suite
            .tests
            .iter()
            .enumerate()
            .map(|(i, test)| {
                if i < failing_index {
                    TestReport::passed(test.name.clone(), Duration::ZERO, 0)
                } else if i == failing_index {
                    let reason = failure
                        .map(|f| f.message.clone())
                        .unwrap_or_else(|| "static run failed".to_string());
                    TestReport::failed(test.name.clone(), reason, Duration::ZERO, 0)
                } else {
                    TestReport::failed(
                        test.name.clone(),
                        "not run: earlier test failed",
                        Duration::ZERO,
                        0,
                    )
                }
            })
            .collect()
    }
}

fn leg_tests(leg: &[TestLegResult]) -> Vec<(String, Vec<RecordedStep>)> {
    leg.iter()
        .map(|r| (r.name.clone(), r.outcome.steps.clone()))
        .collect()
}

#[cfg(test)]
#[path = "runner_tests.rs"]
mod tests;
