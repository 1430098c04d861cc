// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Token usage accounting across model calls.

use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

/// Token counts for a single model call.
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct TokenCounts {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

impl TokenCounts {
    pub fn new(input: u64, output: u64) -> Self {
        Self {
            input_tokens: input,
            output_tokens: output,
        }
    }

    pub fn total(&self) -> u64 {
        self.input_tokens + self.output_tokens
    }
}

/// Shared tally of token usage for the whole run.
///
/// Providers add to it when the API reports counts; the summary reads it at
/// the end. Reporting is best-effort: nothing depends on the numbers.
#[derive(Clone, Debug, Default)]
pub struct UsageTally {
    counts: Arc<Mutex<TokenCounts>>,
}

impl UsageTally {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, usage: TokenCounts) {
        let mut counts = self.counts.lock();
        counts.input_tokens += usage.input_tokens;
        counts.output_tokens += usage.output_tokens;
    }

    pub fn snapshot(&self) -> TokenCounts {
        *self.counts.lock()
    }
}
