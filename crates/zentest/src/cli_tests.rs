// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use clap::Parser;

fn parse(args: &[&str]) -> Cli {
    Cli::try_parse_from(std::iter::once("zentest").chain(args.iter().copied())).unwrap()
}

#[test]
fn test_run_defaults() {
    let cli = parse(&["run"]);
    let Command::Run(args) = cli.command else {
        panic!("expected run");
    };
    assert_eq!(args.suite, None);
    assert!(!args.agentic);
    assert!(!args.no_heal);
    assert_eq!(args.config, "zentest.toml");
    assert_eq!(args.headless_override(), None);
}

#[test]
fn test_run_with_flags() {
    let cli = parse(&[
        "run", "auth", "--agentic", "--no-heal", "--env", "staging", "--verbose",
    ]);
    let Command::Run(args) = cli.command else {
        panic!("expected run");
    };
    assert_eq!(args.suite.as_deref(), Some("auth"));
    assert!(args.agentic);
    assert!(args.no_heal);
    assert_eq!(args.env_name.as_deref(), Some("staging"));
    assert!(args.verbose);
}

#[test]
fn test_headless_and_headed_conflict() {
    let result =
        Cli::try_parse_from(["zentest", "run", "--headless", "--headed"]);
    assert!(result.is_err());
}

#[test]
fn test_headless_override_mapping() {
    let Command::Run(args) = parse(&["run", "--headless"]).command else {
        panic!("expected run");
    };
    assert_eq!(
        args.headless_override(),
        Some(crate::config::HeadlessMode::True)
    );

    let Command::Run(args) = parse(&["run", "--headed"]).command else {
        panic!("expected run");
    };
    assert_eq!(
        args.headless_override(),
        Some(crate::config::HeadlessMode::False)
    );
}

#[test]
fn test_init_defaults_to_current_dir() {
    let Command::Init(args) = parse(&["init"]).command else {
        panic!("expected init");
    };
    assert_eq!(args.dir, ".");
}
