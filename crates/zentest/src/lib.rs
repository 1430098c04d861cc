// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Zentest
//!
//! Agentic end-to-end browser testing: tests are plain-English
//! descriptions, a vision-capable model drives the browser on the first
//! run, the interactions are recorded into a deterministic script, and a
//! tiered healing pipeline repairs the script when the application drifts.

pub mod action;
pub mod browser;
pub mod cli;
pub mod config;
pub mod driver;
pub mod element;
pub mod env;
pub mod heal;
pub mod model;
pub mod output;
pub mod runner;
pub mod runs;
pub mod script;
pub mod step;
pub mod suite;
pub mod usage;

pub use action::{normalize_key_combo, Action, MouseButton, ScrollDirection};
pub use browser::{BrowserExecutor, ChromiumBrowser, PageDriver};
pub use cli::{Cli, Command, RunArgs};
pub use config::{HeadlessMode, Provider, ResolvedConfig, Viewport, ZentestConfig};
pub use driver::{AgenticDriver, CancelFlag, DriverOptions, TestOutcome};
pub use element::ElementInfo;
pub use heal::{Healer, RunnerFailure, StaticRunner};
pub use model::{create_client, ModelClient, ModelReply, ModelRequest, ModelRole};
pub use output::{HealMethod, RunSummary, TestReport};
pub use runner::{RunnerOptions, SuiteRunner};
pub use script::{ScriptBuilder, ScriptReplayer};
pub use step::{ActionResult, ExecFailure, FailureKind, RecordedStep, SuiteSidecar};
pub use suite::{Test, TestSuite};
pub use usage::{TokenCounts, UsageTally};
