// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Sidecar file IO and suite/sidecar drift detection.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::step::SuiteSidecar;
use crate::suite::TestSuite;

#[derive(Debug, Error)]
pub enum SidecarError {
    #[error("Failed to read sidecar: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse sidecar JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Path of the sidecar for a suite inside `dir`.
pub fn sidecar_path(dir: &Path, suite_name: &str) -> PathBuf {
    dir.join(format!("{}.steps.json", suite_name))
}

/// Path of the generated spec file for a suite inside `dir`.
pub fn script_path(dir: &Path, suite_name: &str) -> PathBuf {
    dir.join(format!("{}.spec.ts", suite_name))
}

pub fn save(path: &Path, sidecar: &SuiteSidecar) -> Result<(), SidecarError> {
    let json = serde_json::to_string_pretty(sidecar)?;
    std::fs::write(path, json)?;
    Ok(())
}

/// Load a sidecar; `Ok(None)` when the file does not exist.
pub fn load(path: &Path) -> Result<Option<SuiteSidecar>, SidecarError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(path)?;
    Ok(Some(serde_json::from_str(&content)?))
}

/// Length of the leading run of suite tests the sidecar covers in order.
///
/// The sidecar is valid for replay only as an order-preserving prefix of the
/// suite; anything past the first mismatch needs a fresh agentic run.
pub fn covered_prefix(sidecar: &SuiteSidecar, suite: &TestSuite) -> usize {
    suite
        .tests
        .iter()
        .zip(&sidecar.tests)
        .take_while(|(test, entry)| test.name == entry.name)
        .count()
}

/// Whether the sidecar covers every test in the suite.
pub fn covers_suite(sidecar: &SuiteSidecar, suite: &TestSuite) -> bool {
    covered_prefix(sidecar, suite) == suite.tests.len()
}

#[cfg(test)]
#[path = "sidecar_tests.rs"]
mod tests;
