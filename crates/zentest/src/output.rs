// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! User-facing output: per-test result lines and the final summary table.
//!
//! Provides ANSI color support with automatic terminal detection.

use std::io::{self, IsTerminal, Write};
use std::time::Duration;

use crate::usage::TokenCounts;

/// Which healing tier recovered a test, when any did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HealMethod {
    Replay,
    Rewrite,
    Agentic,
}

impl std::fmt::Display for HealMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HealMethod::Replay => write!(f, "healed by replay"),
            HealMethod::Rewrite => write!(f, "healed by rewrite"),
            HealMethod::Agentic => write!(f, "healed by agentic rerun"),
        }
    }
}

/// Outcome of one test, exactly one line per test.
#[derive(Clone, Debug)]
pub struct TestReport {
    pub name: String,
    pub passed: bool,
    pub reason: Option<String>,
    pub duration: Duration,
    pub action_count: usize,
    pub healed: Option<HealMethod>,
}

impl TestReport {
    pub fn passed(name: impl Into<String>, duration: Duration, action_count: usize) -> Self {
        Self {
            name: name.into(),
            passed: true,
            reason: None,
            duration,
            action_count,
            healed: None,
        }
    }

    pub fn failed(
        name: impl Into<String>,
        reason: impl Into<String>,
        duration: Duration,
        action_count: usize,
    ) -> Self {
        Self {
            name: name.into(),
            passed: false,
            reason: Some(reason.into()),
            duration,
            action_count,
            healed: None,
        }
    }

    pub fn with_heal(mut self, method: HealMethod) -> Self {
        self.healed = Some(method);
        self
    }
}

/// Everything the final summary shows.
#[derive(Clone, Debug)]
pub struct RunSummary {
    pub suite: String,
    pub reports: Vec<TestReport>,
    pub duration: Duration,
    pub usage: TokenCounts,
}

impl RunSummary {
    pub fn passed_count(&self) -> usize {
        self.reports.iter().filter(|r| r.passed).count()
    }

    pub fn failed_count(&self) -> usize {
        self.reports.len() - self.passed_count()
    }

    pub fn all_passed(&self) -> bool {
        self.failed_count() == 0
    }
}

/// Print an error message to stderr.
///
/// Displays in red when stderr is a terminal, plain text otherwise.
pub fn print_error(msg: impl std::fmt::Display) {
    let is_tty = io::stderr().is_terminal();
    write_error(&mut io::stderr(), msg, is_tty);
}

fn write_error<W: Write>(writer: &mut W, msg: impl std::fmt::Display, is_terminal: bool) {
    if is_terminal {
        let _ = writeln!(writer, "\x1b[31mError: {}\x1b[0m", msg);
    } else {
        let _ = writeln!(writer, "Error: {}", msg);
    }
}

/// Print a warning message to stderr.
///
/// Displays in yellow when stderr is a terminal, plain text otherwise.
pub fn print_warning(msg: impl std::fmt::Display) {
    let is_tty = io::stderr().is_terminal();
    write_warning(&mut io::stderr(), msg, is_tty);
}

fn write_warning<W: Write>(writer: &mut W, msg: impl std::fmt::Display, is_terminal: bool) {
    if is_terminal {
        let _ = writeln!(writer, "\x1b[33mWarning: {}\x1b[0m", msg);
    } else {
        let _ = writeln!(writer, "Warning: {}", msg);
    }
}

/// Print the single result line for a finished test.
pub fn print_result_line(report: &TestReport) {
    let is_tty = io::stdout().is_terminal();
    write_result_line(&mut io::stdout(), report, is_tty);
}

/// Write a result line with explicit terminal flag.
pub fn write_result_line<W: Write>(writer: &mut W, report: &TestReport, is_terminal: bool) {
    let (mark, color) = if report.passed {
        ("✓", "\x1b[32m")
    } else {
        ("✗", "\x1b[31m")
    };
    let mut line = format!(
        "{} {} ({}, {} action{})",
        mark,
        report.name,
        format_duration(report.duration),
        report.action_count,
        if report.action_count == 1 { "" } else { "s" },
    );
    if let Some(method) = report.healed {
        line.push_str(&format!(" ({})", method));
    }
    if let Some(ref reason) = report.reason {
        line.push_str(": ");
        line.push_str(reason);
    }
    if is_terminal {
        let _ = writeln!(writer, "{}{}\x1b[0m", color, line);
    } else {
        let _ = writeln!(writer, "{}", line);
    }
}

/// Print the final summary table.
pub fn print_summary(summary: &RunSummary) {
    write_summary(&mut io::stdout(), summary);
}

/// Write the summary table: one row per test, then aggregates.
pub fn write_summary<W: Write>(writer: &mut W, summary: &RunSummary) {
    let name_width = summary
        .reports
        .iter()
        .map(|r| r.name.len())
        .max()
        .unwrap_or(4)
        .max(4);

    let _ = writeln!(writer);
    let _ = writeln!(writer, "Suite: {}", summary.suite);
    let _ = writeln!(
        writer,
        "  {:<width$}  {:<6}  {:>8}  {:>7}  {}",
        "test",
        "result",
        "time",
        "actions",
        "note",
        width = name_width
    );
    for report in &summary.reports {
        let result = if report.passed { "pass" } else { "fail" };
        let note = match (report.healed, &report.reason) {
            (Some(method), _) => method.to_string(),
            (None, Some(reason)) => reason.clone(),
            (None, None) => String::new(),
        };
        let _ = writeln!(
            writer,
            "  {:<width$}  {:<6}  {:>8}  {:>7}  {}",
            report.name,
            result,
            format_duration(report.duration),
            report.action_count,
            note,
            width = name_width
        );
    }
    let _ = writeln!(
        writer,
        "{} passed, {} failed in {}",
        summary.passed_count(),
        summary.failed_count(),
        format_duration(summary.duration)
    );
    if summary.usage.total() > 0 {
        let _ = writeln!(
            writer,
            "tokens: {} in / {} out",
            summary.usage.input_tokens, summary.usage.output_tokens
        );
    }
}

fn format_duration(d: Duration) -> String {
    let secs = d.as_secs_f64();
    if secs >= 60.0 {
        format!("{}m{:02}s", (secs as u64) / 60, (secs as u64) % 60)
    } else {
        format!("{:.1}s", secs)
    }
}

#[cfg(test)]
#[path = "output_tests.rs"]
mod tests;
