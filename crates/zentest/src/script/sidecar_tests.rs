// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::step::SidecarTest;
use crate::suite::Test;

fn sidecar_with(names: &[&str]) -> SuiteSidecar {
    SuiteSidecar {
        tests: names
            .iter()
            .map(|n| SidecarTest {
                name: n.to_string(),
                steps: vec![],
            })
            .collect(),
    }
}

fn suite_with(names: &[&str]) -> TestSuite {
    TestSuite {
        name: "s".to_string(),
        tests: names
            .iter()
            .map(|n| Test {
                name: n.to_string(),
                description: "do things".to_string(),
            })
            .collect(),
    }
}

#[test]
fn test_full_coverage() {
    let sidecar = sidecar_with(&["a", "b"]);
    let suite = suite_with(&["a", "b"]);
    assert_eq!(covered_prefix(&sidecar, &suite), 2);
    assert!(covers_suite(&sidecar, &suite));
}

#[test]
fn test_partial_prefix() {
    let sidecar = sidecar_with(&["a", "b"]);
    let suite = suite_with(&["a", "b", "c"]);
    assert_eq!(covered_prefix(&sidecar, &suite), 2);
    assert!(!covers_suite(&sidecar, &suite));
}

#[test]
fn test_mismatch_stops_prefix() {
    let sidecar = sidecar_with(&["a", "x", "c"]);
    let suite = suite_with(&["a", "b", "c"]);
    assert_eq!(covered_prefix(&sidecar, &suite), 1);
}

#[test]
fn test_empty_sidecar_covers_nothing() {
    let sidecar = sidecar_with(&[]);
    let suite = suite_with(&["a"]);
    assert_eq!(covered_prefix(&sidecar, &suite), 0);
}

#[test]
fn test_save_and_load_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = sidecar_path(dir.path(), "auth");
    assert!(path.ends_with("auth.steps.json"));

    let sidecar = sidecar_with(&["login"]);
    save(&path, &sidecar).unwrap();
    let loaded = load(&path).unwrap().unwrap();
    assert_eq!(loaded.test_names(), vec!["login"]);
}

#[test]
fn test_load_missing_is_none() {
    let dir = tempfile::tempdir().unwrap();
    assert!(load(&sidecar_path(dir.path(), "nope")).unwrap().is_none());
}
