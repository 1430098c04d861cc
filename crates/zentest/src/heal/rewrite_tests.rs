// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;

use super::*;
use crate::model::mock::ScriptedModel;

const SCRIPT: &str = r#"import { test, expect } from '@playwright/test';

test.describe('auth', () => {
  test.describe.configure({ mode: 'serial' });

  let page;

  test.beforeAll(async ({ browser }) => {
    page = await browser.newPage();
  });

  test.afterAll(async () => {
    await page.close();
  });

  test('login', async () => {
    await page.goto(process.env.ZENTEST_BASE_URL ?? 'http://localhost:3000');
    await page.getByLabel('Email').fill('foo@example.com');
    await page.getByRole('button', { name: 'Sign In', exact: true }).click();
  });

  test('dashboard', async () => {
    await expect(page.getByText('Revenue').first()).toBeVisible();
  });
});
"#;

#[test]
fn test_find_test_block_body() {
    let block = find_test_block(SCRIPT, "dashboard").unwrap();
    let body = block.body(SCRIPT);
    assert!(body.contains("Revenue"));
    assert!(!body.contains("Email"));
}

#[test]
fn test_find_test_block_handles_braces_in_strings() {
    let block = find_test_block(SCRIPT, "login").unwrap();
    // the body contains object literals with braces; balance must survive
    let body = block.body(SCRIPT);
    assert!(body.contains("{ name: 'Sign In', exact: true }"));
    assert!(body.trim_end().ends_with(".click();"));
}

#[test]
fn test_find_test_block_missing_test() {
    assert!(find_test_block(SCRIPT, "missing").is_none());
}

#[test]
fn test_find_test_block_is_indentation_agnostic() {
    let flat = "test('x', async () => {\nawait page.click();\n});";
    let block = find_test_block(flat, "x").unwrap();
    assert_eq!(block.body(flat).trim(), "await page.click();");
}

#[test]
fn test_splice_replaces_only_target_test() {
    let spliced = splice_test_body(
        SCRIPT,
        "login",
        "await page.getByRole('button', { name: 'Log in', exact: true }).click();",
    )
    .unwrap();

    assert!(spliced.contains("Log in"));
    assert!(!spliced.contains("Sign In"));
    // other tests untouched
    assert!(spliced.contains("await expect(page.getByText('Revenue').first()).toBeVisible();"));
    // still structurally sound: the spliced test closes properly
    assert!(spliced.contains("  });\n\n  test('dashboard'"));
}

#[test]
fn test_splice_is_reparseable() {
    let spliced = splice_test_body(SCRIPT, "dashboard", "await page.reload();").unwrap();
    let block = find_test_block(&spliced, "dashboard").unwrap();
    assert_eq!(block.body(&spliced).trim(), "await page.reload();");
}

#[test]
fn test_splice_missing_test_returns_none() {
    assert!(splice_test_body(SCRIPT, "ghost", "x").is_none());
}

mod decisions {
    use super::*;

    #[test]
    fn test_parse_rewrite_decision() {
        let raw = r#"{"decision":"REWRITE","reasoning":"button renamed","new_test_body":"await page.click();"}"#;
        assert_eq!(
            parse_decision(raw),
            Some(RewriteDecision::Rewrite {
                reasoning: "button renamed".to_string(),
                new_test_body: "await page.click();".to_string(),
            })
        );
    }

    #[test]
    fn test_parse_agentic_decision_from_fenced_reply() {
        let raw = "The layout is different now.\n```json\n{\"decision\":\"AGENTIC\",\"reasoning\":\"page redesigned\"}\n```";
        assert_eq!(
            parse_decision(raw),
            Some(RewriteDecision::Agentic {
                reasoning: "page redesigned".to_string(),
            })
        );
    }

    #[test]
    fn test_parse_garbage_is_none() {
        assert_eq!(parse_decision("cannot fix this"), None);
    }

    #[tokio::test]
    async fn test_propose_escalates_on_unparseable_reply() {
        let model = Arc::new(ScriptedModel::new());
        model.reply("no json here");
        let rewriter = Rewriter::new(model as Arc<dyn crate::model::ModelClient>);

        let decision = rewriter
            .propose(&RewriteRequest {
                test_name: "login",
                test_code: "await page.click();",
                script: SCRIPT,
                error_message: "locator not found",
                stack: None,
                screenshot: None,
            })
            .await;

        assert!(matches!(decision, RewriteDecision::Agentic { .. }));
    }

    #[tokio::test]
    async fn test_propose_passes_context_to_model() {
        let model = Arc::new(ScriptedModel::new());
        model.reply(r#"{"decision":"AGENTIC","reasoning":"x"}"#);
        let rewriter = Rewriter::new(Arc::clone(&model) as Arc<dyn crate::model::ModelClient>);

        rewriter
            .propose(&RewriteRequest {
                test_name: "login",
                test_code: "await page.old();",
                script: SCRIPT,
                error_message: "boom",
                stack: Some("at line 3"),
                screenshot: Some(vec![1, 2, 3]),
            })
            .await;

        let request = &model.requests()[0];
        assert!(request.user_text.contains("Failing test: login"));
        assert!(request.user_text.contains("boom"));
        assert!(request.user_text.contains("at line 3"));
        assert!(request.user_text.contains("await page.old();"));
        assert!(request.user_text.contains("test.describe('auth'"));
        assert_eq!(request.image_png.as_deref(), Some(&[1u8, 2, 3][..]));
    }
}
