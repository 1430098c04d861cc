// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! OpenAI-compatible chat-completions client.
//!
//! Also backs OpenRouter, which speaks the same wire format from a different
//! endpoint.

use async_trait::async_trait;
use base64::Engine;
use serde::Deserialize;
use serde_json::json;

use super::{with_retry, ModelClient, ModelError, ModelReply, ModelRequest};
use crate::usage::{TokenCounts, UsageTally};

const OPENAI_URL: &str = "https://api.openai.com/v1/chat/completions";
const OPENROUTER_URL: &str = "https://openrouter.ai/api/v1/chat/completions";

pub struct OpenAiClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
    tally: UsageTally,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<ApiUsage>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct ApiUsage {
    #[serde(default)]
    prompt_tokens: u64,
    #[serde(default)]
    completion_tokens: u64,
}

impl OpenAiClient {
    pub fn openai(api_key: String, model: String, tally: UsageTally) -> Self {
        Self::with_endpoint(OPENAI_URL, api_key, model, tally)
    }

    pub fn openrouter(api_key: String, model: String, tally: UsageTally) -> Self {
        Self::with_endpoint(OPENROUTER_URL, api_key, model, tally)
    }

    fn with_endpoint(
        endpoint: impl Into<String>,
        api_key: String,
        model: String,
        tally: UsageTally,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: endpoint.into(),
            api_key,
            model,
            tally,
        }
    }

    fn build_body(&self, request: &ModelRequest) -> serde_json::Value {
        let mut user_content = vec![json!({ "type": "text", "text": request.user_text })];
        if let Some(ref png) = request.image_png {
            let data_url = format!(
                "data:image/png;base64,{}",
                base64::engine::general_purpose::STANDARD.encode(png)
            );
            user_content.push(json!({
                "type": "image_url",
                "image_url": { "url": data_url },
            }));
        }

        json!({
            "model": self.model,
            "response_format": { "type": "json_object" },
            "messages": [
                { "role": "system", "content": request.system },
                { "role": "user", "content": user_content },
            ],
        })
    }

    async fn send_once(&self, body: &serde_json::Value) -> Result<ModelReply, ModelError> {
        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ModelError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: ChatResponse = response.json().await?;
        let raw_text = parsed
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .unwrap_or_default();
        if raw_text.is_empty() {
            return Err(ModelError::EmptyResponse);
        }

        let usage = parsed
            .usage
            .map(|u| TokenCounts::new(u.prompt_tokens, u.completion_tokens));
        if let Some(u) = usage {
            self.tally.add(u);
        }

        Ok(ModelReply { raw_text, usage })
    }
}

#[async_trait]
impl ModelClient for OpenAiClient {
    async fn next(&self, request: &ModelRequest) -> Result<ModelReply, ModelError> {
        let body = self.build_body(request);
        with_retry(|| self.send_once(&body)).await
    }

    fn model(&self) -> &str {
        &self.model
    }
}
