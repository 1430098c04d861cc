// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Zentest binary entry point.

use std::io::IsTerminal;
use std::path::{Path, PathBuf};

use clap::Parser;

use zentest::browser::{BrowserExecutor, ChromiumBrowser};
use zentest::cli::{Cli, Command, InitArgs, RunArgs};
use zentest::config::{ConfigOverrides, ResolvedConfig, ZentestConfig};
use zentest::driver::CancelFlag;
use zentest::model::{create_client, ModelRole};
use zentest::output::{print_error, print_warning};
use zentest::runner::{RunnerOptions, SuiteRunner};
use zentest::suite::TestSuite;
use zentest::usage::UsageTally;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let code = match cli.command {
        Command::Init(args) => init(&args),
        Command::Run(args) => run(&args).await,
    };
    std::process::exit(code);
}

const CONFIG_TEMPLATE: &str = r#"# Zentest configuration
base_url = "http://localhost:3000"

# provider = "anthropic"
# headless = "auto"
# max_steps = 50

# [models]
# agentic = "claude-sonnet-4-5"

# [viewport]
# width = 1280
# height = 720

# [environments.staging]
# url = "https://staging.example.com"

# [runner]
# command = ["npx", "playwright", "test"]
"#;

const EXAMPLE_SUITE: &str = r#"# example

## home-loads
Open the home page and verify the main heading is visible.
"#;

fn init(args: &InitArgs) -> i32 {
    let root = Path::new(&args.dir);
    let tests_dir = root.join("tests");
    if let Err(e) = std::fs::create_dir_all(&tests_dir) {
        print_error(format!("Failed to create {}: {}", tests_dir.display(), e));
        return 1;
    }

    for (path, content) in [
        (root.join("zentest.toml"), CONFIG_TEMPLATE),
        (tests_dir.join("example.md"), EXAMPLE_SUITE),
    ] {
        if path.exists() {
            println!("exists   {}", path.display());
            continue;
        }
        if let Err(e) = std::fs::write(&path, content) {
            print_error(format!("Failed to write {}: {}", path.display(), e));
            return 1;
        }
        println!("created  {}", path.display());
    }
    println!("\nEdit zentest.toml, describe tests in tests/, then `zentest run`.");
    0
}

async fn run(args: &RunArgs) -> i32 {
    let config = match ZentestConfig::load(Path::new(&args.config)) {
        Ok(config) => config,
        Err(e) => {
            print_error(e);
            return 1;
        }
    };
    let overrides = ConfigOverrides {
        env_name: args.env_name.clone(),
        headless: args.headless_override(),
    };
    let resolved = match ResolvedConfig::resolve(&config, &overrides) {
        Ok(resolved) => resolved,
        Err(e) => {
            print_error(e);
            return 1;
        }
    };
    if resolved.api_key.is_none() {
        print_error(format!(
            "Missing API key for provider '{}': set ZENTEST_{}_API_KEY or api_key in zentest.toml",
            resolved.provider,
            resolved.provider.to_string().to_uppercase()
        ));
        return 1;
    }

    let suite_paths = match discover_suites(args.suite.as_deref()) {
        Ok(paths) => paths,
        Err(message) => {
            print_error(message);
            return 1;
        }
    };

    let usage = UsageTally::new();
    let agentic_model = match create_client(&resolved, ModelRole::Agentic, usage.clone()) {
        Ok(client) => client,
        Err(e) => {
            print_error(e);
            return 1;
        }
    };
    let healer_model = match create_client(&resolved, ModelRole::Healer, usage.clone()) {
        Ok(client) => client,
        Err(e) => {
            print_error(e);
            return 1;
        }
    };

    let cancel = CancelFlag::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                print_warning("Cancelling after the current step...");
                cancel.cancel();
            }
        });
    }

    let headless = resolved.headless.resolve(std::io::stdout().is_terminal());
    let mut all_passed = true;

    for suite_path in suite_paths {
        let suite = match TestSuite::load(&suite_path) {
            Ok(suite) => suite,
            Err(e) => {
                print_error(e);
                return 1;
            }
        };

        let browser = match ChromiumBrowser::launch(headless, resolved.viewport).await {
            Ok(browser) => browser,
            Err(e) => {
                print_error(format!("Failed to launch browser: {}", e));
                return 1;
            }
        };
        let executor = BrowserExecutor::new(browser.page());
        let artifact_dir = suite_path
            .parent()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));

        let runner = SuiteRunner::new(
            suite,
            executor,
            agentic_model.clone(),
            healer_model.clone(),
            resolved.clone(),
            artifact_dir,
            RunnerOptions {
                force_agentic: args.agentic,
                no_heal: args.no_heal,
                verbose: args.verbose,
            },
            cancel.clone(),
            usage.clone(),
        );

        let result = runner.run().await;
        browser.close().await;

        match result {
            Ok(summary) => {
                if !summary.all_passed() {
                    all_passed = false;
                }
            }
            Err(e) => {
                print_error(e);
                return 1;
            }
        }
        if cancel.is_cancelled() {
            all_passed = false;
            break;
        }
    }

    if all_passed {
        0
    } else {
        1
    }
}

/// Resolve which suite files to run: an explicit name or path, or every
/// `tests/*.md` sorted by name.
fn discover_suites(selector: Option<&str>) -> Result<Vec<PathBuf>, String> {
    if let Some(selector) = selector {
        let direct = Path::new(selector);
        if direct.is_file() {
            return Ok(vec![direct.to_path_buf()]);
        }
        let named = Path::new("tests").join(format!("{}.md", selector));
        if named.is_file() {
            return Ok(vec![named]);
        }
        return Err(format!(
            "Suite '{}' not found: no such file and no tests/{}.md",
            selector, selector
        ));
    }

    let tests_dir = Path::new("tests");
    let mut paths: Vec<PathBuf> = std::fs::read_dir(tests_dir)
        .map_err(|e| format!("Cannot read {}: {} (run `zentest init`?)", tests_dir.display(), e))?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "md"))
        .collect();
    paths.sort();
    if paths.is_empty() {
        return Err("No suites found under tests/ (run `zentest init`?)".to_string());
    }
    Ok(paths)
}
