//! OpenAI-compatible chat-completion client for release selection.
//!
//! One decision means exactly one request: no retries, no conversation
//! state. A conservative timeout keeps a slow model from amplifying the
//! webhook caller's own timeout.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

const PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// Failure modes of one model invocation. All variants fold into the
/// policy's "model failed, use the manager default" branch; none are fatal.
#[derive(Debug, Error)]
pub enum SelectionError {
    /// Network, timeout or HTTP-status failure reaching the endpoint.
    #[error("Network error: {0}")]
    Transport(String),

    /// Content was not parseable JSON, lacked `choice`, or `choice` was
    /// not an integer.
    #[error("Invalid response: {0}")]
    ResponseFormat(String),

    /// Integer choice outside `[1, releaseCount]`; constructed by the
    /// decision policy after range-checking.
    #[error("Choice {choice} out of range (1-{count})")]
    OutOfRangeChoice { choice: i64, count: usize },
}

/// Parsed, validated result of one model invocation. `choice` is 1-based
/// and only meaningful once range-checked against the release count.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelAnswer {
    pub choice: i64,
    pub reason: String,
}

/// Seam between the decision engine and the model endpoint.
#[async_trait]
pub trait ReleasePicker: Send + Sync {
    /// Ask the model to pick a release. Single attempt, bounded wait.
    async fn pick(
        &self,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<ModelAnswer, SelectionError>;

    /// Connectivity probe for the `/test` endpoint.
    async fn probe(&self) -> Result<(), SelectionError> {
        Ok(())
    }
}

/// Connection settings for the chat-completion endpoint.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// Base URL without the `/chat/completions` suffix.
    pub api_url: String,
    pub model: String,
    /// Optional bearer token; local endpoints often need none.
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f64,
    max_tokens: u32,
}

pub struct LlmClient {
    http: reqwest::Client,
    config: LlmConfig,
}

impl LlmClient {
    pub fn new(config: LlmConfig) -> Result<Self, SelectionError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| SelectionError::Transport(e.to_string()))?;
        Ok(LlmClient { http, config })
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }
}

#[async_trait]
impl ReleasePicker for LlmClient {
    async fn pick(
        &self,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<ModelAnswer, SelectionError> {
        let body = ChatRequest {
            model: &self.config.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: user_prompt,
                },
            ],
            // Low temperature biases toward reproducible choices.
            temperature: 0.1,
            max_tokens: 300,
        };

        let mut request = self
            .http
            .post(format!("{}/chat/completions", self.config.api_url))
            .json(&body);
        if let Some(key) = &self.config.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| SelectionError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(SelectionError::Transport(format!(
                "HTTP {}: {}",
                status.as_u16(),
                text
            )));
        }

        let value: Value = response
            .json()
            .await
            .map_err(|e| SelectionError::ResponseFormat(format!("unparseable body ({})", e)))?;

        let content = value
            .pointer("/choices/0/message/content")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                SelectionError::ResponseFormat("missing message content".to_string())
            })?;

        let answer = parse_answer(content)?;
        info!(
            choice = answer.choice,
            model = %self.config.model,
            "Model selected release #{}: {}",
            answer.choice,
            answer.reason
        );
        Ok(answer)
    }

    async fn probe(&self) -> Result<(), SelectionError> {
        let mut request = self
            .http
            .get(format!("{}/models", self.config.api_url))
            .timeout(PROBE_TIMEOUT);
        if let Some(key) = &self.config.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| SelectionError::Transport(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            warn!("LLM probe returned HTTP {}", status.as_u16());
            return Err(SelectionError::Transport(format!(
                "HTTP {}",
                status.as_u16()
            )));
        }
        Ok(())
    }
}

/// Strip a fenced code block if the model wrapped its JSON in one.
fn strip_code_fence(content: &str) -> String {
    let trimmed = content.trim();
    if !trimmed.starts_with("```") {
        return trimmed.to_string();
    }

    let mut inner = Vec::new();
    let mut in_block = false;
    for line in trimmed.lines() {
        if line.starts_with("```") {
            if in_block {
                break;
            }
            in_block = true;
            continue;
        }
        if in_block {
            inner.push(line);
        }
    }
    inner.join("\n")
}

/// Parse and validate the model's content into a `ModelAnswer`.
///
/// Requires a JSON object with an integer `choice`; any other type
/// (string, float, missing) is a validation failure, not a crash.
/// `reason` is optional and defaults to a fixed placeholder.
pub fn parse_answer(content: &str) -> Result<ModelAnswer, SelectionError> {
    let body = strip_code_fence(content);
    let parsed: Value = serde_json::from_str(body.trim())
        .map_err(|e| SelectionError::ResponseFormat(format!("unparseable JSON ({})", e)))?;

    let choice_field = parsed
        .get("choice")
        .ok_or_else(|| SelectionError::ResponseFormat("missing 'choice' field".to_string()))?;
    let choice = choice_field.as_i64().ok_or_else(|| {
        SelectionError::ResponseFormat(format!("'choice' is not an integer (got {})", choice_field))
    })?;

    let reason = parsed
        .get("reason")
        .and_then(Value::as_str)
        .unwrap_or("No reason provided")
        .to_string();

    Ok(ModelAnswer { choice, reason })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_json() {
        let answer = parse_answer(r#"{"choice": 2, "reason": "better seeders"}"#).unwrap();
        assert_eq!(answer.choice, 2);
        assert_eq!(answer.reason, "better seeders");
    }

    #[test]
    fn test_parse_fenced_json() {
        let content = "```json\n{\"choice\": 3, \"reason\": \"newer encode\"}\n```";
        let answer = parse_answer(content).unwrap();
        assert_eq!(answer.choice, 3);
        assert_eq!(answer.reason, "newer encode");
    }

    #[test]
    fn test_parse_bare_fence() {
        let content = "```\n{\"choice\": 1}\n```";
        let answer = parse_answer(content).unwrap();
        assert_eq!(answer.choice, 1);
        assert_eq!(answer.reason, "No reason provided");
    }

    #[test]
    fn test_missing_choice_is_format_failure() {
        let err = parse_answer(r#"{"reason": "no pick"}"#).unwrap_err();
        assert!(matches!(err, SelectionError::ResponseFormat(_)));
        assert!(err.to_string().contains("'choice'"));
    }

    #[test]
    fn test_string_choice_is_format_failure() {
        let err = parse_answer(r#"{"choice": "2", "reason": "x"}"#).unwrap_err();
        assert!(matches!(err, SelectionError::ResponseFormat(_)));
    }

    #[test]
    fn test_float_choice_is_format_failure() {
        let err = parse_answer(r#"{"choice": 2.5, "reason": "x"}"#).unwrap_err();
        assert!(matches!(err, SelectionError::ResponseFormat(_)));
    }

    #[test]
    fn test_non_json_content_is_format_failure() {
        let err = parse_answer("I pick release number 2 because it is larger.").unwrap_err();
        assert!(matches!(err, SelectionError::ResponseFormat(_)));
    }

    #[test]
    fn test_negative_choice_parses_and_is_left_to_range_check() {
        // Range validation belongs to the decision policy, not the parser.
        let answer = parse_answer(r#"{"choice": -1, "reason": "x"}"#).unwrap();
        assert_eq!(answer.choice, -1);
    }

    #[test]
    fn test_strip_fence_ignores_trailing_prose() {
        let content = "```json\n{\"choice\": 4, \"reason\": \"ok\"}\n```\nHope that helps!";
        let answer = parse_answer(content).unwrap();
        assert_eq!(answer.choice, 4);
    }

    #[test]
    fn test_client_builds_with_config() {
        let client = LlmClient::new(LlmConfig {
            api_url: "http://localhost:1234/v1".to_string(),
            model: "gpt-4o".to_string(),
            api_key: None,
            timeout_secs: 90,
        });
        assert!(client.is_ok());
        assert_eq!(client.unwrap().model(), "gpt-4o");
    }
}
