// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Project configuration (`zentest.toml`) and its resolution against
//! environment variables and CLI flags.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::env;

/// Default agentic iteration cap.
pub const DEFAULT_MAX_STEPS: u32 = 50;
/// Default browser viewport.
pub const DEFAULT_VIEWPORT: Viewport = Viewport {
    width: 1280,
    height: 720,
};

/// Default model per provider, used when neither config nor env names one.
pub const DEFAULT_ANTHROPIC_MODEL: &str = "claude-sonnet-4-5";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o";
pub const DEFAULT_OPENROUTER_MODEL: &str = "anthropic/claude-sonnet-4-5";

/// Browser viewport dimensions.
#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        DEFAULT_VIEWPORT
    }
}

/// Which model backend to instantiate.
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Provider {
    #[default]
    Anthropic,
    Openai,
    Openrouter,
}

impl Provider {
    pub fn default_model(&self) -> &'static str {
        match self {
            Provider::Anthropic => DEFAULT_ANTHROPIC_MODEL,
            Provider::Openai => DEFAULT_OPENAI_MODEL,
            Provider::Openrouter => DEFAULT_OPENROUTER_MODEL,
        }
    }
}

impl std::str::FromStr for Provider {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "anthropic" => Ok(Provider::Anthropic),
            "openai" => Ok(Provider::Openai),
            "openrouter" => Ok(Provider::Openrouter),
            other => Err(ConfigError::Validation(format!(
                "Invalid provider '{}': must be one of anthropic, openai, openrouter",
                other
            ))),
        }
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Provider::Anthropic => write!(f, "anthropic"),
            Provider::Openai => write!(f, "openai"),
            Provider::Openrouter => write!(f, "openrouter"),
        }
    }
}

/// Headless selection: `auto` decides from TTY/CI at launch.
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum HeadlessMode {
    #[default]
    Auto,
    True,
    False,
}

impl HeadlessMode {
    /// Resolve to a concrete choice. `auto` is headless iff stdout is not a
    /// terminal or CI is set.
    pub fn resolve(&self, stdout_is_tty: bool) -> bool {
        match self {
            HeadlessMode::True => true,
            HeadlessMode::False => false,
            HeadlessMode::Auto => !stdout_is_tty || env::ci(),
        }
    }
}

impl std::str::FromStr for HeadlessMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "auto" => Ok(HeadlessMode::Auto),
            "true" => Ok(HeadlessMode::True),
            "false" => Ok(HeadlessMode::False),
            other => Err(ConfigError::Validation(format!(
                "Invalid headless value '{}': must be auto, true, or false",
                other
            ))),
        }
    }
}

/// Named environment target.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EnvironmentTarget {
    pub url: String,
}

/// Per-role model identifiers.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ModelsConfig {
    #[serde(default)]
    pub agentic: Option<String>,
    #[serde(default)]
    pub builder: Option<String>,
    #[serde(default)]
    pub healer: Option<String>,
}

/// Static-runner invocation.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RunnerConfig {
    /// Argv of the external static runner; the script path is appended.
    #[serde(default = "RunnerConfig::default_command")]
    pub command: Vec<String>,
}

impl RunnerConfig {
    fn default_command() -> Vec<String> {
        vec!["npx".to_string(), "playwright".to_string(), "test".to_string()]
    }
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            command: Self::default_command(),
        }
    }
}

/// The `zentest.toml` file as written by the user.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ZentestConfig {
    /// Default URL tests start from.
    #[serde(default)]
    pub base_url: Option<String>,

    /// Named environments overriding `base_url` when selected via `--env`.
    #[serde(default)]
    pub environments: HashMap<String, EnvironmentTarget>,

    #[serde(default)]
    pub provider: Option<Provider>,

    #[serde(default)]
    pub models: ModelsConfig,

    #[serde(default)]
    pub max_steps: Option<u32>,

    #[serde(default)]
    pub viewport: Option<Viewport>,

    #[serde(default)]
    pub headless: Option<HeadlessMode>,

    /// Optional inline API key; the environment is preferred.
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default)]
    pub runner: Option<RunnerConfig>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Config validation failed: {0}")]
    Validation(String),

    #[error("Unknown environment '{0}': not present in [environments]")]
    UnknownEnvironment(String),
}

impl ZentestConfig {
    /// Load the config file, tolerating a missing file (all-default config).
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(ref url) = self.base_url {
            validate_url("base_url", url)?;
        }
        for (name, target) in &self.environments {
            validate_url(&format!("environments.{}.url", name), &target.url)?;
        }
        if let Some(v) = self.viewport {
            if v.width == 0 || v.height == 0 {
                return Err(ConfigError::Validation(format!(
                    "Invalid viewport {}x{}: dimensions must be non-zero",
                    v.width, v.height
                )));
            }
        }
        Ok(())
    }
}

fn validate_url(key: &str, url: &str) -> Result<(), ConfigError> {
    if url.starts_with("http://") || url.starts_with("https://") || url.starts_with("file://") {
        Ok(())
    } else {
        Err(ConfigError::Validation(format!(
            "Invalid {} '{}': must start with http://, https://, or file://",
            key, url
        )))
    }
}

/// Fully resolved settings with precedence applied: CLI flag > environment
/// variable > config file > default.
#[derive(Clone, Debug)]
pub struct ResolvedConfig {
    pub base_url: String,
    pub provider: Provider,
    pub agentic_model: String,
    pub builder_model: String,
    pub healer_model: String,
    pub max_steps: u32,
    pub viewport: Viewport,
    pub headless: HeadlessMode,
    pub api_key: Option<String>,
    pub runner: RunnerConfig,
}

/// CLI-level overrides fed into resolution.
#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub env_name: Option<String>,
    pub headless: Option<HeadlessMode>,
}

impl ResolvedConfig {
    /// Resolve the final configuration.
    pub fn resolve(
        config: &ZentestConfig,
        overrides: &ConfigOverrides,
    ) -> Result<Self, ConfigError> {
        let base_url = match &overrides.env_name {
            Some(name) => config
                .environments
                .get(name)
                .map(|t| t.url.clone())
                .ok_or_else(|| ConfigError::UnknownEnvironment(name.clone()))?,
            None => env::base_url()
                .or_else(|| config.base_url.clone())
                .ok_or_else(|| {
                    ConfigError::Validation(
                        "No base_url configured: set base_url in zentest.toml or ZENTEST_BASE_URL"
                            .to_string(),
                    )
                })?,
        };

        let provider = match env::provider() {
            Some(p) => p.parse()?,
            None => config.provider.unwrap_or_default(),
        };

        let agentic_model = env::agentic_model()
            .or_else(|| config.models.agentic.clone())
            .unwrap_or_else(|| provider.default_model().to_string());
        let builder_model = env::builder_model()
            .or_else(|| config.models.builder.clone())
            .unwrap_or_else(|| agentic_model.clone());
        let healer_model = env::healer_model()
            .or_else(|| config.models.healer.clone())
            .unwrap_or_else(|| agentic_model.clone());

        let viewport = Viewport {
            width: env::viewport_width()
                .unwrap_or_else(|| config.viewport.unwrap_or_default().width),
            height: env::viewport_height()
                .unwrap_or_else(|| config.viewport.unwrap_or_default().height),
        };

        let headless = match overrides.headless {
            Some(mode) => mode,
            None => match env::headless() {
                Some(s) => s.parse()?,
                None => config.headless.unwrap_or_default(),
            },
        };

        let max_steps = env::max_steps()
            .or(config.max_steps)
            .unwrap_or(DEFAULT_MAX_STEPS);

        let api_key = provider_api_key(provider).or_else(|| config.api_key.clone());

        Ok(Self {
            base_url,
            provider,
            agentic_model,
            builder_model,
            healer_model,
            max_steps,
            viewport,
            headless,
            api_key,
            runner: config.runner.clone().unwrap_or_default(),
        })
    }
}

fn provider_api_key(provider: Provider) -> Option<String> {
    match provider {
        Provider::Anthropic => env::anthropic_api_key(),
        Provider::Openai => env::openai_api_key(),
        Provider::Openrouter => env::openrouter_api_key(),
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
