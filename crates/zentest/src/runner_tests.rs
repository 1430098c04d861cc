// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::path::PathBuf;
use std::sync::Arc;

use serde_json::json;

use super::*;
use crate::browser::mock::MockPage;
use crate::config::{ConfigOverrides, RunnerConfig, ZentestConfig};
use crate::model::mock::ScriptedModel;
use crate::suite::Test;

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

    fn runner_with(
        &self,
        tests: Vec<Test>,
        runner_cmd: &str,
        options: RunnerOptions,
    ) -> SuiteRunner {
        let config = ZentestConfig {
            base_url: Some("http://localhost:3000".to_string()),
            runner: Some(RunnerConfig {
                command: vec![runner_cmd.to_string()],
            }),
            ..Default::default()
        };
        let resolved = ResolvedConfig::resolve(&config, &ConfigOverrides::default()).unwrap();
        SuiteRunner::new(
            TestSuite {
                name: "shop".to_string(),
                tests,
            },
            BrowserExecutor::new(
                Arc::clone(&self.page) as Arc<dyn crate::browser::PageDriver>
            ),
            Arc::clone(&self.agentic) as Arc<dyn crate::model::ModelClient>,
            Arc::clone(&self.healer) as Arc<dyn crate::model::ModelClient>,
            resolved,
            PathBuf::from(self.dir.path()),
            options,
            CancelFlag::new(),
            UsageTally::new(),
        )
    }

    fn login_test() -> Test {
        Test {
            name: "login".to_string(),
            description: "log in and verify the greeting".to_string(),
        }
    }

    fn reply_success(&self) {
        self.agentic.reply(
            r#"{"actions":[{"type":"assert_text","text":"Welcome"},{"type":"done","success":true,"reason":"verified"}],"reasoning":"check"}"#,
        );
        self.page
            .on_eval_contains("const wanted = \"Welcome\"", json!({ "present": true }));
    }
}

#[tokio::test(start_paused = true)]
async fn test_empty_suite_passes_with_no_tests() {
    let f = Fixture::new();
    let runner = f.runner_with(vec![], "true", RunnerOptions::default());
    let summary = runner.run().await.unwrap();
    assert!(summary.reports.is_empty());
    assert!(summary.all_passed());
    assert_eq!(f.agentic.request_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_first_run_derives_and_writes_artifacts() {
    let f = Fixture::new();
    let runner = f.runner_with(vec![Fixture::login_test()], "true", RunnerOptions::default());
    f.reply_success();

    let summary = runner.run().await.unwrap();

    assert!(summary.all_passed());
    assert_eq!(summary.reports.len(), 1);
    assert_eq!(summary.reports[0].action_count, 1);
    assert!(runner.script_path().exists());
    assert!(runner.sidecar_path().exists());
    let script = std::fs::read_to_string(runner.script_path()).unwrap();
    assert!(script.contains("test.describe('shop'"));
    assert!(script.contains("getByText('Welcome')"));
}

#[tokio::test(start_paused = true)]
async fn test_second_run_uses_static_runner_without_model() {
    let f = Fixture::new();
    let runner = f.runner_with(vec![Fixture::login_test()], "true", RunnerOptions::default());
    f.reply_success();
    runner.run().await.unwrap();
    let calls_after_first = f.agentic.request_count();

    let summary = runner.run().await.unwrap();

    assert!(summary.all_passed());
    // token usage is zero on a clean replay: the model was never called
    assert_eq!(f.agentic.request_count(), calls_after_first);
    assert_eq!(summary.usage.total(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_agentic_failure_stops_suite_and_reports_tail() {
    let f = Fixture::new();
    let tests = vec![
        Fixture::login_test(),
        Test {
            name: "checkout".to_string(),
            description: "buy a widget".to_string(),
        },
    ];
    let runner = f.runner_with(tests, "true", RunnerOptions::default());
    // login fails: model gives up immediately
    f.agentic.reply(
        r#"{"actions":[{"type":"done","success":false,"reason":"page blank"}],"reasoning":""}"#,
    );

    let summary = runner.run().await.unwrap();

    assert_eq!(summary.passed_count(), 0);
    assert_eq!(summary.failed_count(), 2);
    assert_eq!(summary.reports[0].reason.as_deref(), Some("page blank"));
    assert_eq!(
        summary.reports[1].reason.as_deref(),
        Some("not run: earlier test failed")
    );
    // no artifacts from a failed derivation
    assert!(!runner.script_path().exists());
    // checkout never consumed the model
    assert_eq!(f.agentic.request_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_force_agentic_ignores_existing_artifacts() {
    let f = Fixture::new();
    let runner = f.runner_with(vec![Fixture::login_test()], "true", RunnerOptions::default());
    f.reply_success();
    runner.run().await.unwrap();

    let forced = f.runner_with(
        vec![Fixture::login_test()],
        "true",
        RunnerOptions {
            force_agentic: true,
            ..Default::default()
        },
    );
    f.reply_success();
    let summary = forced.run().await.unwrap();

    assert!(summary.all_passed());
    assert_eq!(f.agentic.request_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_no_heal_reports_static_failure_without_model_calls() {
    let f = Fixture::new();
    let runner = f.runner_with(vec![Fixture::login_test()], "true", RunnerOptions::default());
    f.reply_success();
    runner.run().await.unwrap();

    let broken = f.runner_with(
        vec![Fixture::login_test()],
        "false",
        RunnerOptions {
            no_heal: true,
            ..Default::default()
        },
    );
    let summary = broken.run().await.unwrap();

    assert_eq!(summary.failed_count(), 1);
    assert_eq!(f.healer.request_count(), 0);
    // only the original derivation call, no healing calls
    assert_eq!(f.agentic.request_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_script_without_sidecar_routes_to_agentic() {
    let f = Fixture::new();
    let runner = f.runner_with(vec![Fixture::login_test()], "true", RunnerOptions::default());
    f.reply_success();
    runner.run().await.unwrap();
    std::fs::remove_file(runner.sidecar_path()).unwrap();

    let again = f.runner_with(vec![Fixture::login_test()], "true", RunnerOptions::default());
    f.reply_success();
    let summary = again.run().await.unwrap();

    assert!(summary.all_passed());
    // the model was consulted again: no sidecar means no static path
    assert_eq!(f.agentic.request_count(), 2);
    assert!(again.sidecar_path().exists());
}

#[tokio::test(start_paused = true)]
async fn test_sidecar_covering_two_of_three_replays_prefix() {
    let f = Fixture::new();
    // First: derive a two-test suite.
    let two = vec![
        Fixture::login_test(),
        Test {
            name: "orders".to_string(),
            description: "open the orders page".to_string(),
        },
    ];
    let runner = f.runner_with(two.clone(), "true", RunnerOptions::default());
    f.reply_success();
    f.agentic.reply(
        r#"{"actions":[{"type":"assert_text","text":"Orders"},{"type":"done","success":true,"reason":"ok"}],"reasoning":""}"#,
    );
    f.page
        .on_eval_contains("const wanted = \"Orders\"", json!({ "present": true }));
    runner.run().await.unwrap();
    assert_eq!(f.agentic.request_count(), 2);

    // Then: the suite grows a third test; only it runs agentically.
    let mut three = two;
    three.push(Test {
        name: "reports".to_string(),
        description: "open the reports page".to_string(),
    });
    let grown = f.runner_with(three, "true", RunnerOptions::default());
    f.agentic.reply(
        r#"{"actions":[{"type":"assert_text","text":"Reports"},{"type":"done","success":true,"reason":"ok"}],"reasoning":""}"#,
    );
    f.page
        .on_eval_contains("const wanted = \"Reports\"", json!({ "present": true }));

    let summary = grown.run().await.unwrap();

    assert!(summary.all_passed());
    assert_eq!(summary.reports.len(), 3);
    // exactly one new agentic derivation
    assert_eq!(f.agentic.request_count(), 3);
    let saved = crate::script::sidecar::load(&grown.sidecar_path())
        .unwrap()
        .unwrap();
    assert_eq!(saved.test_names(), vec!["login", "orders", "reports"]);
}
