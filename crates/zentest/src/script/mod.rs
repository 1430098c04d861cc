// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Script generation, persistence, and deterministic replay.
//!
//! A successful agentic run becomes two artifacts: a human-readable
//! Playwright spec file for the external static runner, and a sidecar JSON
//! file holding the raw recorded steps the replayer and healer consume.

pub mod builder;
pub mod locator;
pub mod replayer;
pub mod sidecar;

pub use builder::{GeneratedScript, ScriptBuilder};
pub use locator::{build_locator, Locator};
pub use replayer::{ReplayError, ScriptReplayer};
