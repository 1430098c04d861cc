// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Anthropic Messages API client.

use async_trait::async_trait;
use base64::Engine;
use serde::Deserialize;
use serde_json::json;

use super::{with_retry, ModelClient, ModelError, ModelReply, ModelRequest};
use crate::usage::{TokenCounts, UsageTally};

const API_URL: &str = "https://api.anthropic.com/v1/messages";
const API_VERSION: &str = "2023-06-01";
const MAX_TOKENS: u32 = 4096;

pub struct AnthropicClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
    tally: UsageTally,
}

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
    #[serde(default)]
    usage: Option<ApiUsage>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Deserialize)]
struct ApiUsage {
    #[serde(default)]
    input_tokens: u64,
    #[serde(default)]
    output_tokens: u64,
}

impl AnthropicClient {
    pub fn new(api_key: String, model: String, tally: UsageTally) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key,
            model,
            tally,
        }
    }

    fn build_body(&self, request: &ModelRequest) -> serde_json::Value {
        let mut content = Vec::new();
        if let Some(ref png) = request.image_png {
            content.push(json!({
                "type": "image",
                "source": {
                    "type": "base64",
                    "media_type": "image/png",
                    "data": base64::engine::general_purpose::STANDARD.encode(png),
                },
            }));
        }
        content.push(json!({ "type": "text", "text": request.user_text }));

        json!({
            "model": self.model,
            "max_tokens": MAX_TOKENS,
            "system": request.system,
            "messages": [{ "role": "user", "content": content }],
        })
    }

    async fn send_once(&self, body: &serde_json::Value) -> Result<ModelReply, ModelError> {
        let response = self
            .http
            .post(API_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
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

        let parsed: MessagesResponse = response.json().await?;
        let raw_text = parsed
            .content
            .iter()
            .filter(|b| b.block_type == "text")
            .filter_map(|b| b.text.as_deref())
            .collect::<Vec<_>>()
            .join("");
        if raw_text.is_empty() {
            return Err(ModelError::EmptyResponse);
        }

        let usage = parsed
            .usage
            .map(|u| TokenCounts::new(u.input_tokens, u.output_tokens));
        if let Some(u) = usage {
            self.tally.add(u);
        }

        Ok(ModelReply { raw_text, usage })
    }
}

#[async_trait]
impl ModelClient for AnthropicClient {
    async fn next(&self, request: &ModelRequest) -> Result<ModelReply, ModelError> {
        let body = self.build_body(request);
        with_retry(|| self.send_once(&body)).await
    }

    fn model(&self) -> &str {
        &self.model
    }
}
