// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! CLI argument parsing.

use clap::{Args, Parser, Subcommand};

/// Agentic end-to-end browser testing
#[derive(Parser, Debug)]
#[command(name = "zentest", version, about = "Agentic end-to-end browser testing")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Scaffold a zentest project in the current directory
    Init(InitArgs),
    /// Run one suite, or every suite under tests/
    Run(RunArgs),
}

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Directory to scaffold into
    #[arg(default_value = ".")]
    pub dir: String,
}

#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// Suite name (tests/<suite>.md) or a path to a suite file
    pub suite: Option<String>,

    /// Force agentic re-derivation even when a recorded script exists
    #[arg(long)]
    pub agentic: bool,

    /// Do not heal on static-run failure
    #[arg(long = "no-heal")]
    pub no_heal: bool,

    /// Named environment from [environments] in zentest.toml
    #[arg(long = "env", value_name = "NAME")]
    pub env_name: Option<String>,

    /// Run the browser headless
    #[arg(long, conflicts_with = "headed")]
    pub headless: bool,

    /// Run the browser with a visible window
    #[arg(long)]
    pub headed: bool,

    /// Print each executed action
    #[arg(long, short = 'v')]
    pub verbose: bool,

    /// Config file path
    #[arg(long, default_value = "zentest.toml")]
    pub config: String,
}

impl RunArgs {
    /// The headless override implied by `--headless` / `--headed`, if any.
    pub fn headless_override(&self) -> Option<crate::config::HeadlessMode> {
        if self.headless {
            Some(crate::config::HeadlessMode::True)
        } else if self.headed {
            Some(crate::config::HeadlessMode::False)
        } else {
            None
        }
    }
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
