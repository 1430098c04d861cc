// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::path::PathBuf;
use std::sync::Arc;

use serde_json::json;

use super::*;
use crate::browser::mock::MockPage;
use crate::browser::BrowserExecutor;
use crate::config::{ConfigOverrides, ResolvedConfig, RunnerConfig, ZentestConfig};
use crate::driver::CancelFlag;
use crate::model::mock::ScriptedModel;
use crate::runner::{RunnerOptions, SuiteRunner};
use crate::step::{RecordedStep, SidecarTest, StepMode, SuiteSidecar};
use crate::suite::{Test, TestSuite};
use crate::usage::UsageTally;
use chrono::Utc;

fn step(action: crate::action::Action) -> RecordedStep {
    RecordedStep {
        action,
        reasoning: String::new(),
        element_info: None,
        screenshot: None,
        generated_code: None,
        error: None,
        timestamp: Utc::now(),
        mode: StepMode::Agentic,
    }
}

fn suite() -> TestSuite {
    TestSuite {
        name: "app".to_string(),
        tests: vec![
            Test {
                name: "user-save".to_string(),
                description: "log in and save the user".to_string(),
            },
            Test {
                name: "dashboard".to_string(),
                description: "verify the dashboard shows revenue".to_string(),
            },
        ],
    }
}

struct Fixture {
    page: Arc<MockPage>,
    agentic: Arc<ScriptedModel>,
    healer: Arc<ScriptedModel>,
    dir: tempfile::TempDir,
}

impl Fixture {
    fn new() -> Self {
        Self {
            page: Arc::new(MockPage::new()),
            agentic: Arc::new(ScriptedModel::new()),
            healer: Arc::new(ScriptedModel::new()),
            dir: tempfile::tempdir().unwrap(),
        }
    }

    fn runner(&self, runner_cmd: &str) -> SuiteRunner {
        let mut config = ZentestConfig {
            base_url: Some("http://localhost:3000".to_string()),
            ..Default::default()
        };
        config.runner = Some(RunnerConfig {
            command: vec![runner_cmd.to_string()],
        });
        let resolved = ResolvedConfig::resolve(&config, &ConfigOverrides::default()).unwrap();
        SuiteRunner::new(
            suite(),
            BrowserExecutor::new(
                Arc::clone(&self.page) as Arc<dyn crate::browser::PageDriver>
            ),
            Arc::clone(&self.agentic) as Arc<dyn crate::model::ModelClient>,
            Arc::clone(&self.healer) as Arc<dyn crate::model::ModelClient>,
            resolved,
            PathBuf::from(self.dir.path()),
            RunnerOptions::default(),
            CancelFlag::new(),
            UsageTally::new(),
        )
    }

    /// Seed on-disk artifacts for the full two-test suite.
    fn seed_artifacts(&self, runner: &SuiteRunner, user_save_steps: Vec<RecordedStep>) {
        let tests = vec![
            ("user-save".to_string(), user_save_steps),
            (
                "dashboard".to_string(),
                vec![step(crate::action::Action::AssertText {
                    text: "Revenue".to_string(),
                })],
            ),
        ];
        runner.write_artifacts(&tests).unwrap();
    }

    fn sidecar(&self, runner: &SuiteRunner) -> SuiteSidecar {
        crate::script::sidecar::load(&runner.sidecar_path())
            .unwrap()
            .unwrap()
    }

    fn script_agentic_success(&self) {
        // one batch per test: assert + done
        for _ in 0..2 {
            self.agentic.reply(
                r#"{"actions":[{"type":"assert_text","text":"ok"},{"type":"done","success":true,"reason":"verified"}],"reasoning":"check"}"#,
            );
        }
        self.page
            .on_eval_contains("const wanted = \"ok\"", json!({ "present": true }));
    }

    fn dashboard_failure(&self) -> RunnerFailure {
        RunnerFailure {
            test_name: "dashboard".to_string(),
            message: "getByText('Revenue') not found".to_string(),
            stack: Some("at app.spec.ts:30".to_string()),
        }
    }
}

#[tokio::test(start_paused = true)]
async fn test_tier1_replays_prefix_and_continues_agentically() {
    let f = Fixture::new();
    let runner = f.runner("true");
    f.seed_artifacts(&runner, vec![step(crate::action::Action::Wait { ms: 5 })]);
    let saved = f.sidecar(&runner);

    // dashboard gets re-derived agentically
    f.agentic.reply(
        r#"{"actions":[{"type":"assert_text","text":"Revenue"},{"type":"done","success":true,"reason":"dashboard ok"}],"reasoning":"verify"}"#,
    );
    f.page
        .on_eval_contains("const wanted = \"Revenue\"", json!({ "present": true }));

    let reports = Healer::new(&runner)
        .heal(Some(f.dashboard_failure()), &saved)
        .await
        .unwrap();

    assert_eq!(reports.len(), 2);
    assert!(reports.iter().all(|r| r.passed));
    assert_eq!(reports[0].healed, None);
    assert_eq!(reports[1].healed, Some(crate::output::HealMethod::Replay));
    // the prefix was replayed: the page saw a navigate plus the user-save wait
    assert!(f.page.call_count("navigate") >= 1);
    // the combined sidecar on disk has both tests
    let combined = f.sidecar(&runner);
    assert_eq!(combined.test_names(), vec!["user-save", "dashboard"]);
    // dashboard steps were re-recorded (assert_text step present)
    assert_eq!(combined.tests[1].steps.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_tier2_rewrite_when_replay_fails() {
    let f = Fixture::new();
    let runner = f.runner("true");
    // user-save's recorded step is a click_button that no longer resolves,
    // so the tier-1 replay throws immediately.
    f.seed_artifacts(
        &runner,
        vec![step(crate::action::Action::ClickButton {
            name: "Save".to_string(),
            exact: None,
        })],
    );
    let saved = f.sidecar(&runner);
    let original_sidecar = std::fs::read_to_string(runner.sidecar_path()).unwrap();

    f.healer.reply(
        r#"{"decision":"REWRITE","reasoning":"label changed","new_test_body":"await expect(page.getByText('Income').first()).toBeVisible();"}"#,
    );

    let reports = Healer::new(&runner)
        .heal(Some(f.dashboard_failure()), &saved)
        .await
        .unwrap();

    assert_eq!(reports.len(), 2);
    assert!(reports.iter().all(|r| r.passed));
    assert_eq!(reports[1].healed, Some(crate::output::HealMethod::Rewrite));
    // the script was spliced in place
    let script = std::fs::read_to_string(runner.script_path()).unwrap();
    assert!(script.contains("Income"));
    assert!(!script.contains("Revenue"));
    // the sidecar is untouched by a rewrite
    assert_eq!(
        std::fs::read_to_string(runner.sidecar_path()).unwrap(),
        original_sidecar
    );
    // the agentic model was never consulted
    assert_eq!(f.agentic.request_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_tier3_when_rewriter_escalates() {
    let f = Fixture::new();
    let runner = f.runner("true");
    f.seed_artifacts(
        &runner,
        vec![step(crate::action::Action::ClickButton {
            name: "Save".to_string(),
            exact: None,
        })],
    );
    let saved = f.sidecar(&runner);

    f.healer
        .reply(r#"{"decision":"AGENTIC","reasoning":"page redesigned"}"#);
    f.script_agentic_success();

    let reports = Healer::new(&runner)
        .heal(Some(f.dashboard_failure()), &saved)
        .await
        .unwrap();

    assert_eq!(reports.len(), 2);
    assert!(reports.iter().all(|r| r.passed));
    assert!(reports
        .iter()
        .all(|r| r.healed == Some(crate::output::HealMethod::Agentic)));
    // both tests were re-derived
    assert_eq!(f.agentic.request_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_unparseable_report_goes_straight_to_agentic() {
    let f = Fixture::new();
    let runner = f.runner("true");
    f.seed_artifacts(&runner, vec![step(crate::action::Action::Wait { ms: 1 })]);
    let saved = f.sidecar(&runner);

    f.script_agentic_success();

    let reports = Healer::new(&runner).heal(None, &saved).await.unwrap();

    assert!(reports.iter().all(|r| r.passed));
    assert_eq!(f.healer.request_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_failed_rewrite_restores_script() {
    let f = Fixture::new();
    // verification always fails: tier 2 cannot verify, tier 3 cannot verify
    let runner = f.runner("false");
    f.seed_artifacts(
        &runner,
        vec![step(crate::action::Action::ClickButton {
            name: "Save".to_string(),
            exact: None,
        })],
    );
    let saved = f.sidecar(&runner);
    let original_script = std::fs::read_to_string(runner.script_path()).unwrap();

    // three rewrite attempts, all verifying false
    for _ in 0..3 {
        f.healer.reply(
            r#"{"decision":"REWRITE","reasoning":"try","new_test_body":"await page.reload();"}"#,
        );
    }
    f.script_agentic_success();

    let reports = Healer::new(&runner)
        .heal(Some(f.dashboard_failure()), &saved)
        .await
        .unwrap();

    // tier 3 ran agentically but could not verify either
    assert!(reports.iter().all(|r| !r.passed));
    assert!(reports
        .iter()
        .all(|r| r.reason.as_deref() == Some("verification failed after agentic rerun")));
    // the script on disk is back to its pre-rewrite content
    assert_eq!(
        std::fs::read_to_string(runner.script_path()).unwrap(),
        original_script
    );
}

#[tokio::test(start_paused = true)]
async fn test_recover_drift_replays_covered_prefix() {
    let f = Fixture::new();
    let runner = f.runner("true");
    // sidecar only covers user-save
    let tests = vec![(
        "user-save".to_string(),
        vec![step(crate::action::Action::Wait { ms: 2 })],
    )];
    runner.write_artifacts(&tests).unwrap();
    let saved = SuiteSidecar {
        tests: vec![SidecarTest {
            name: "user-save".to_string(),
            steps: vec![step(crate::action::Action::Wait { ms: 2 })],
        }],
    };

    f.agentic.reply(
        r#"{"actions":[{"type":"assert_text","text":"Revenue"},{"type":"done","success":true,"reason":"ok"}],"reasoning":"verify"}"#,
    );
    f.page
        .on_eval_contains("const wanted = \"Revenue\"", json!({ "present": true }));

    let reports = Healer::new(&runner)
        .recover_drift(1, &saved)
        .await
        .unwrap();

    assert_eq!(reports.len(), 2);
    assert!(reports.iter().all(|r| r.passed));
    // only the uncovered test consumed the model
    assert_eq!(f.agentic.request_count(), 1);
    let combined = f.sidecar(&runner);
    assert_eq!(combined.test_names(), vec!["user-save", "dashboard"]);
}
