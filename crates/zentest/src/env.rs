// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access.
//!
//! All runtime environment variables used by zentest are defined here. Use
//! these accessors instead of calling `std::env::var()` directly.

/// Raw variable names, exported for the static-runner child environment and
/// for tests.
pub mod names {
    pub const ZENTEST_ANTHROPIC_API_KEY: &str = "ZENTEST_ANTHROPIC_API_KEY";
    pub const ZENTEST_OPENAI_API_KEY: &str = "ZENTEST_OPENAI_API_KEY";
    pub const ZENTEST_OPENROUTER_API_KEY: &str = "ZENTEST_OPENROUTER_API_KEY";
    pub const ZENTEST_PROVIDER: &str = "ZENTEST_PROVIDER";
    pub const ZENTEST_AGENTIC_MODEL: &str = "ZENTEST_AGENTIC_MODEL";
    pub const ZENTEST_BUILDER_MODEL: &str = "ZENTEST_BUILDER_MODEL";
    pub const ZENTEST_HEALER_MODEL: &str = "ZENTEST_HEALER_MODEL";
    pub const ZENTEST_VIEWPORT_WIDTH: &str = "ZENTEST_VIEWPORT_WIDTH";
    pub const ZENTEST_VIEWPORT_HEIGHT: &str = "ZENTEST_VIEWPORT_HEIGHT";
    pub const ZENTEST_HEADLESS: &str = "ZENTEST_HEADLESS";
    pub const ZENTEST_MAX_STEPS: &str = "ZENTEST_MAX_STEPS";
    pub const ZENTEST_BASE_URL: &str = "ZENTEST_BASE_URL";
    pub const CI: &str = "CI";
}

/// `ZENTEST_ANTHROPIC_API_KEY` — Anthropic provider key.
pub fn anthropic_api_key() -> Option<String> {
    var(names::ZENTEST_ANTHROPIC_API_KEY)
}

/// `ZENTEST_OPENAI_API_KEY` — OpenAI provider key.
pub fn openai_api_key() -> Option<String> {
    var(names::ZENTEST_OPENAI_API_KEY)
}

/// `ZENTEST_OPENROUTER_API_KEY` — OpenRouter provider key.
pub fn openrouter_api_key() -> Option<String> {
    var(names::ZENTEST_OPENROUTER_API_KEY)
}

/// `ZENTEST_PROVIDER` — which model backend to instantiate.
pub fn provider() -> Option<String> {
    var(names::ZENTEST_PROVIDER)
}

/// `ZENTEST_AGENTIC_MODEL` — model id for the agentic driver.
pub fn agentic_model() -> Option<String> {
    var(names::ZENTEST_AGENTIC_MODEL)
}

/// `ZENTEST_BUILDER_MODEL` — model id for script building roles.
pub fn builder_model() -> Option<String> {
    var(names::ZENTEST_BUILDER_MODEL)
}

/// `ZENTEST_HEALER_MODEL` — model id for the rewrite tier.
pub fn healer_model() -> Option<String> {
    var(names::ZENTEST_HEALER_MODEL)
}

/// `ZENTEST_VIEWPORT_WIDTH` — viewport width override.
pub fn viewport_width() -> Option<u32> {
    var_parse(names::ZENTEST_VIEWPORT_WIDTH)
}

/// `ZENTEST_VIEWPORT_HEIGHT` — viewport height override.
pub fn viewport_height() -> Option<u32> {
    var_parse(names::ZENTEST_VIEWPORT_HEIGHT)
}

/// `ZENTEST_HEADLESS` — `auto`, `true`, or `false`.
pub fn headless() -> Option<String> {
    var(names::ZENTEST_HEADLESS)
}

/// `ZENTEST_MAX_STEPS` — agentic iteration cap override.
pub fn max_steps() -> Option<u32> {
    var_parse(names::ZENTEST_MAX_STEPS)
}

/// `ZENTEST_BASE_URL` — base URL, also inherited by the static-runner child.
pub fn base_url() -> Option<String> {
    var(names::ZENTEST_BASE_URL)
}

/// `CI` — set by CI environments; forces headless in `auto` mode.
pub fn ci() -> bool {
    var(names::CI).is_some()
}

fn var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn var_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    var(name).and_then(|v| v.parse().ok())
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
