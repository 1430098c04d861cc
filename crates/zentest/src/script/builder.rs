// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Deterministic script emission.
//!
//! Translates recorded steps into a Playwright spec file. The translation is
//! a pure function of `(Action, ElementInfo)`: running it twice over the
//! same steps yields byte-identical output, which is what makes rewrite
//! splicing and verification tractable.

use std::io;
use std::path::{Path, PathBuf};

use crate::action::{Action, ScrollDirection, MIN_SCROLL_AMOUNT};
use crate::step::{RecordedStep, SidecarTest, SuiteSidecar};

use super::locator::{build_locator, escape, Locator};
use super::sidecar;

/// A rendered script plus the sidecar tests annotated with the code each
/// step produced.
#[derive(Clone, Debug)]
pub struct GeneratedScript {
    pub code: String,
    pub tests: Vec<SidecarTest>,
}

impl GeneratedScript {
    pub fn sidecar(&self) -> SuiteSidecar {
        SuiteSidecar {
            tests: self.tests.clone(),
        }
    }
}

/// Builds the spec file for one suite.
pub struct ScriptBuilder {
    suite_name: String,
    base_url: String,
}

impl ScriptBuilder {
    pub fn new(suite_name: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            suite_name: suite_name.into(),
            base_url: base_url.into(),
        }
    }

    /// Render the full spec file from `(test name, steps)` pairs in suite
    /// order.
    pub fn build(&self, tests: &[(String, Vec<RecordedStep>)]) -> GeneratedScript {
        let mut code = String::new();
        code.push_str("import { test, expect } from '@playwright/test';\n\n");
        code.push_str(&format!(
            "test.describe('{}', () => {{\n",
            escape(&self.suite_name)
        ));
        code.push_str("  test.describe.configure({ mode: 'serial' });\n\n");
        code.push_str("  let page;\n\n");
        code.push_str("  test.beforeAll(async ({ browser }) => {\n");
        code.push_str("    page = await browser.newPage();\n");
        code.push_str("  });\n\n");
        code.push_str("  test.afterAll(async () => {\n");
        code.push_str("    await page.close();\n");
        code.push_str("  });\n");

        let mut annotated = Vec::with_capacity(tests.len());
        for (index, (name, steps)) in tests.iter().enumerate() {
            let (body, steps) = self.render_test(steps, index == 0);
            code.push('\n');
            code.push_str(&format!("  test('{}', async () => {{\n", escape(name)));
            code.push_str(&body);
            code.push_str("  });\n");
            annotated.push(SidecarTest {
                name: name.clone(),
                steps,
            });
        }

        code.push_str("});\n");
        GeneratedScript {
            code,
            tests: annotated,
        }
    }

    /// Render one test body and annotate its steps with the generated code.
    fn render_test(
        &self,
        steps: &[RecordedStep],
        navigates: bool,
    ) -> (String, Vec<RecordedStep>) {
        let mut body = String::new();
        if navigates {
            body.push_str(&format!(
                "    await page.goto(process.env.ZENTEST_BASE_URL ?? '{}');\n",
                escape(&self.base_url)
            ));
        }

        let mut annotated = Vec::with_capacity(steps.len());
        let mut last_reasoning = String::new();
        let mut last_assertion: Option<Action> = None;
        let mut previous_input_locator: Option<Locator> = None;

        for step in steps {
            let mut step = step.clone();
            // Failed steps were dead ends in the agentic run; the happy path
            // continues without them.
            if step.error.is_some() {
                step.generated_code = None;
                annotated.push(step);
                continue;
            }
            // Consecutive identical assertions collapse to one.
            if step.action.is_assertion() && last_assertion.as_ref() == Some(&step.action) {
                step.generated_code = None;
                annotated.push(step);
                continue;
            }

            let input_locator_for_type = previous_input_locator.take();
            let statement = self.translate(&step, input_locator_for_type.as_ref());

            if let Some(ref statement) = statement {
                if !step.reasoning.is_empty() && step.reasoning != last_reasoning {
                    body.push_str(&format!("    // {}\n", sanitize_comment(&step.reasoning)));
                    last_reasoning = step.reasoning.clone();
                }
                body.push_str(&format!("    {}\n", statement));
            }

            last_assertion = step.action.is_assertion().then(|| step.action.clone());
            previous_input_locator = step
                .element_info
                .as_ref()
                .filter(|info| info.is_input())
                .and_then(build_locator);

            step.generated_code = statement;
            annotated.push(step);
        }

        (body, annotated)
    }

    /// The fixed translation table. `None` means the variant emits nothing.
    fn translate(&self, step: &RecordedStep, previous_input: Option<&Locator>) -> Option<String> {
        match &step.action {
            Action::Click { x, y, .. } => Some(match locator_for(step) {
                Some(loc) => format!("await {}.click();", loc.to_code()),
                None => format!("await page.mouse.click({}, {});", x, y),
            }),
            Action::DoubleClick { x, y } => Some(match locator_for(step) {
                Some(loc) => format!("await {}.dblclick();", loc.to_code()),
                None => format!("await page.mouse.dblclick({}, {});", x, y),
            }),
            Action::ClickButton { name, .. } => Some(format!(
                "await page.getByRole('button', {{ name: '{}', exact: true }}).click();",
                escape(name)
            )),
            Action::ClickText { text, exact } => {
                let loc = Locator::Text {
                    text: text.clone(),
                    exact: exact.unwrap_or(false),
                };
                Some(format!("await {}.click();", loc.to_code()))
            }
            Action::SelectInput { field, value, .. } => {
                let loc = fill_locator(step, field);
                Some(format!(
                    "await {}.fill('{}');",
                    loc.to_code(),
                    escape(value)
                ))
            }
            Action::Type { text } => Some(match previous_input {
                Some(loc) => format!("await {}.fill('{}');", loc.to_code(), escape(text)),
                None => format!("await page.keyboard.type('{}');", escape(text)),
            }),
            Action::Key { combo } => Some(format!(
                "await page.keyboard.press('{}');",
                escape(&crate::action::normalize_key_combo(combo))
            )),
            Action::Scroll {
                direction, amount, ..
            } => {
                let amount = (*amount).max(MIN_SCROLL_AMOUNT);
                let delta = match direction {
                    ScrollDirection::Up => -amount,
                    ScrollDirection::Down => amount,
                };
                Some(format!("await page.mouse.wheel(0, {});", delta))
            }
            Action::Wait { ms } => Some(format!("await page.waitForTimeout({});", ms)),
            Action::AssertText { text } => Some(format!(
                "await expect(page.getByText('{}').first()).toBeVisible();",
                escape(text)
            )),
            Action::AssertNotText { text } => Some(format!(
                "await expect(page.getByText('{}')).toHaveCount(0);",
                escape(text)
            )),
            Action::AssertVisible { .. } => {
                locator_for(step).map(|loc| format!("await expect({}).toBeVisible();", loc.to_code()))
            }
            // Not round-tripped: replay-only motions and the terminal marker.
            Action::Drag { .. } | Action::MouseMove { .. } | Action::Done { .. } => None,
        }
    }
}

/// Write `<suite>.spec.ts` and `<suite>.steps.json` into `dir`.
pub fn write_artifacts(
    dir: &Path,
    suite_name: &str,
    script: &GeneratedScript,
) -> io::Result<(PathBuf, PathBuf)> {
    let script_path = dir.join(format!("{}.spec.ts", suite_name));
    let sidecar_path = sidecar::sidecar_path(dir, suite_name);
    std::fs::write(&script_path, &script.code)?;
    sidecar::save(&sidecar_path, &script.sidecar())
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
    Ok((script_path, sidecar_path))
}

fn locator_for(step: &RecordedStep) -> Option<Locator> {
    step.element_info.as_ref().and_then(build_locator)
}

/// Fill locator for `select_input`: pick the strategy the executor actually
/// matched (label, then placeholder), falling back to role=textbox.
fn fill_locator(step: &RecordedStep, field: &str) -> Locator {
    if let Some(ref info) = step.element_info {
        if info.label_text.as_deref().is_some_and(|l| !l.is_empty()) {
            return Locator::Label(field.to_string());
        }
        if info.placeholder.as_deref().is_some_and(|p| !p.is_empty()) {
            return Locator::Placeholder(field.to_string());
        }
    }
    Locator::Role {
        role: "textbox".to_string(),
        name: field.to_string(),
    }
}

fn sanitize_comment(reasoning: &str) -> String {
    reasoning.replace('\n', " ").trim().to_string()
}

#[cfg(test)]
#[path = "builder_tests.rs"]
mod tests;
