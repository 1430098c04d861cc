// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Scripted model client for tests.

use std::collections::VecDeque;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::{ModelClient, ModelError, ModelReply, ModelRequest};

/// Replays canned replies in order and records every request it received.
#[derive(Default)]
pub struct ScriptedModel {
    replies: Mutex<VecDeque<Result<String, ModelError>>>,
    requests: Mutex<Vec<ModelRequest>>,
}

impl ScriptedModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a raw text reply.
    pub fn reply(&self, raw: impl Into<String>) {
        self.replies.lock().push_back(Ok(raw.into()));
    }

    /// Queue a provider error.
    pub fn reply_error(&self, error: ModelError) {
        self.replies.lock().push_back(Err(error));
    }

    /// All requests received so far.
    pub fn requests(&self) -> Vec<ModelRequest> {
        self.requests.lock().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }
}

#[async_trait]
impl ModelClient for ScriptedModel {
    async fn next(&self, request: &ModelRequest) -> Result<ModelReply, ModelError> {
        self.requests.lock().push(request.clone());
        match self.replies.lock().pop_front() {
            Some(Ok(raw_text)) => Ok(ModelReply {
                raw_text,
                usage: None,
            }),
            Some(Err(error)) => Err(error),
            // An exhausted script fails the test rather than hanging it.
            None => Ok(ModelReply {
                raw_text: r#"{"actions":[{"type":"done","success":false,"reason":"scripted model exhausted"}],"reasoning":""}"#.to_string(),
                usage: None,
            }),
        }
    }

    fn model(&self) -> &str {
        "scripted"
    }
}
