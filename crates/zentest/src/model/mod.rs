// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Model provider clients.
//!
//! The driver depends only on the [`ModelClient`] capability: one call that
//! takes a system prompt, user text, and a screenshot, and returns raw text.
//! Each provider owns its own bounded retry; the driver never retries
//! transport errors itself.

mod anthropic;
pub mod mock;
mod openai;
pub mod parse;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

pub use anthropic::AnthropicClient;
pub use openai::OpenAiClient;

use crate::config::{Provider, ResolvedConfig};
use crate::usage::{TokenCounts, UsageTally};

/// One model invocation.
#[derive(Clone, Debug)]
pub struct ModelRequest {
    pub system: String,
    pub user_text: String,
    /// PNG screenshot, base64-encoded by the provider.
    pub image_png: Option<Vec<u8>>,
}

/// Raw reply plus token counts when the provider reports them.
#[derive(Clone, Debug)]
pub struct ModelReply {
    pub raw_text: String,
    pub usage: Option<TokenCounts>,
}

#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Missing API key for provider '{0}': set the corresponding ZENTEST_*_API_KEY")]
    MissingApiKey(Provider),

    #[error("Provider returned no content")]
    EmptyResponse,
}

impl ModelError {
    /// Whether a bounded retry is worth attempting.
    fn retryable(&self) -> bool {
        match self {
            ModelError::Api { status, .. } => *status == 429 || *status >= 500,
            ModelError::Http(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }
}

/// Capability the driver consumes. Implementations are provider-specific and
/// retry transient failures internally.
#[async_trait]
pub trait ModelClient: Send + Sync {
    async fn next(&self, request: &ModelRequest) -> Result<ModelReply, ModelError>;

    /// Model identifier, for diagnostics.
    fn model(&self) -> &str;
}

/// Which role a client is built for; selects the model id.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModelRole {
    Agentic,
    Builder,
    Healer,
}

/// Instantiate the configured provider for a role.
pub fn create_client(
    config: &ResolvedConfig,
    role: ModelRole,
    tally: UsageTally,
) -> Result<Arc<dyn ModelClient>, ModelError> {
    let api_key = config
        .api_key
        .clone()
        .ok_or(ModelError::MissingApiKey(config.provider))?;
    let model = match role {
        ModelRole::Agentic => config.agentic_model.clone(),
        ModelRole::Builder => config.builder_model.clone(),
        ModelRole::Healer => config.healer_model.clone(),
    };
    Ok(match config.provider {
        Provider::Anthropic => Arc::new(AnthropicClient::new(api_key, model, tally)),
        Provider::Openai => Arc::new(OpenAiClient::openai(api_key, model, tally)),
        Provider::Openrouter => Arc::new(OpenAiClient::openrouter(api_key, model, tally)),
    })
}

const RETRY_ATTEMPTS: u32 = 3;
const RETRY_BASE_DELAY: Duration = Duration::from_millis(500);
const RETRY_MAX_DELAY: Duration = Duration::from_secs(10);

/// Bounded exponential retry shared by the providers: up to 3 attempts,
/// doubling delay capped at 10 s, only for 429/5xx/transport errors.
pub(crate) async fn with_retry<T, F, Fut>(mut op: F) -> Result<T, ModelError>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, ModelError>>,
{
    let mut delay = RETRY_BASE_DELAY;
    let mut attempt = 1;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if e.retryable() && attempt < RETRY_ATTEMPTS => {
                tokio::time::sleep(delay).await;
                delay = (delay * 2).min(RETRY_MAX_DELAY);
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
