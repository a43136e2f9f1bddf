// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! A chat-completions-style HTTP code generator. Grounded on
//! `original_source/necrocode/agent_runner/llm_client.py`'s `LLMClient`:
//! same system/user message shape, same `temperature=0.2`, same
//! retry-on-{rate-limit,timeout,connection} / terminal-on-other-API-error
//! split, same "malformed JSON response is categorical, not transient".

use crate::generator::CodeGenerator;
use crate::model::{GenerationResult, LlmResponseBody};
use async_trait::async_trait;
use rn_core::{RetryPolicy, RunnerError};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, warn};

/// HTTP call timeout for one LLM request attempt, per spec.md §5's
/// "HTTP default 30 s; LLM default 120 s".
pub const LLM_DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

const SYSTEM_PROMPT: &str = "You are a code generation assistant. Generate code changes in JSON format.";

#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub timeout: Duration,
    pub retry_policy: RetryPolicy,
    pub default_max_tokens: u32,
}

impl OpenAiConfig {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            base_url: "https://api.openai.com/v1".to_string(),
            timeout: LLM_DEFAULT_TIMEOUT,
            retry_policy: RetryPolicy::network_default(),
            default_max_tokens: 4096,
        }
    }
}

pub struct OpenAiCodeGenerator {
    config: OpenAiConfig,
    http: reqwest::Client,
}

impl OpenAiCodeGenerator {
    pub fn new(config: OpenAiConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }
}

#[derive(Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f64,
}

#[derive(Deserialize)]
struct ChatResponse {
    model: String,
    choices: Vec<ChatChoice>,
    usage: ChatUsage,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: String,
}

#[derive(Deserialize)]
struct ChatUsage {
    total_tokens: u64,
}

#[derive(Deserialize)]
struct ChatErrorBody {
    #[serde(default)]
    error: Value,
}

enum Attempt {
    Success(GenerationResult),
    Retryable(String),
    Terminal(RunnerError),
}

#[async_trait]
impl CodeGenerator for OpenAiCodeGenerator {
    async fn generate_code(
        &self,
        prompt: &str,
        workspace_path: &Path,
        max_tokens: Option<u32>,
    ) -> Result<GenerationResult, RunnerError> {
        let max_tokens = max_tokens.unwrap_or(self.config.default_max_tokens);
        info!(
            model = %self.config.model,
            max_tokens,
            prompt_length = prompt.len(),
            workspace_path = %workspace_path.display(),
            "LLM code generation request"
        );

        let mut last_error = String::new();
        for attempt in 0..=self.config.retry_policy.max_retries {
            debug!(attempt, max_retries = self.config.retry_policy.max_retries, "LLM request attempt");

            match self.try_once(prompt, max_tokens).await {
                Attempt::Success(result) => return Ok(result),
                Attempt::Terminal(err) => return Err(err),
                Attempt::Retryable(reason) => {
                    last_error = reason;
                    if attempt < self.config.retry_policy.max_retries {
                        let delay = self.config.retry_policy.delay(attempt);
                        warn!(attempt, delay_ms = delay.as_millis() as u64, reason = %last_error, "retrying LLM request");
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }

        Err(RunnerError::ImplementationFailed {
            message: format!(
                "LLM request failed after {} retries: {}",
                self.config.retry_policy.max_retries, last_error
            ),
        })
    }
}

impl OpenAiCodeGenerator {
    async fn try_once(&self, prompt: &str, max_tokens: u32) -> Attempt {
        let request = ChatRequest {
            model: self.config.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: prompt.to_string(),
                },
            ],
            max_tokens,
            temperature: 0.2,
        };

        let response = match self
            .http
            .post(format!("{}/chat/completions", self.config.base_url))
            .bearer_auth(&self.config.api_key)
            .timeout(self.config.timeout)
            .json(&request)
            .send()
            .await
        {
            Ok(response) => response,
            Err(err) if err.is_timeout() || err.is_connect() => {
                return Attempt::Retryable(format!("transport error: {err}"));
            }
            Err(err) => {
                return Attempt::Terminal(RunnerError::ImplementationFailed {
                    message: format!("LLM request failed: {err}"),
                });
            }
        };

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Attempt::Retryable("rate limited".to_string());
        }
        if status.is_server_error() {
            return Attempt::Retryable(format!("server error: {status}"));
        }
        if !status.is_success() {
            let body = response
                .json::<ChatErrorBody>()
                .await
                .map(|b| b.error.to_string())
                .unwrap_or_else(|_| "<unreadable error body>".to_string());
            return Attempt::Terminal(RunnerError::ImplementationFailed {
                message: format!("LLM API error ({status}): {body}"),
            });
        }

        let body: ChatResponse = match response.json().await {
            Ok(body) => body,
            Err(err) => {
                return Attempt::Terminal(RunnerError::ImplementationFailed {
                    message: format!("failed to parse LLM response envelope: {err}"),
                });
            }
        };

        let Some(choice) = body.choices.into_iter().next() else {
            return Attempt::Terminal(RunnerError::ImplementationFailed {
                message: "LLM response contained no choices".to_string(),
            });
        };

        let parsed: LlmResponseBody = match serde_json::from_str(&choice.message.content) {
            Ok(parsed) => parsed,
            Err(err) => {
                return Attempt::Terminal(RunnerError::ImplementationFailed {
                    message: format!("failed to parse LLM response as JSON: {err}"),
                });
            }
        };

        info!(
            model = %body.model,
            tokens_used = body.usage.total_tokens,
            code_changes = parsed.code_changes.len(),
            "LLM code generation response received"
        );

        Attempt::Success(GenerationResult {
            code_changes: parsed.code_changes,
            explanation: parsed.explanation,
            model: body.model,
            tokens_used: body.usage.total_tokens,
        })
    }
}

#[cfg(test)]
#[path = "openai_tests.rs"]
mod tests;
