use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::{json, Value};
use tracing::warn;

use super::model::ChatModel;
use crate::error::{CrewError, Result};

pub const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";
/// Per-attempt HTTP timeout unless configured otherwise
pub const DEFAULT_ATTEMPT_TIMEOUT: Duration = Duration::from_secs(120);
const MAX_RETRIES: usize = 3;
/// Longest sleep between attempts, including server-sent Retry-After
const MAX_RETRY_WAIT: Duration = Duration::from_secs(30);

/// Outer deadline for one `chat_completion` call whose attempts each get
/// `per_attempt`. Covers every retry and the sleeps between them.
pub fn call_deadline(per_attempt: Duration) -> Duration {
    let retries = MAX_RETRIES as u32;
    per_attempt * (retries + 1) + MAX_RETRY_WAIT * retries
}

/// OpenAI-compatible chat-completions client
#[derive(Clone, Debug)]
pub struct OpenAIClient {
    api_key: String,
    base_url: String,
    timeout: Duration,
    initial_backoff: Duration,
    client: reqwest::Client,
}

impl OpenAIClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_ATTEMPT_TIMEOUT,
            initial_backoff: Duration::from_millis(250),
            client: reqwest::Client::new(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Timeout for each HTTP attempt; see [`call_deadline`] for the whole call.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_initial_backoff(mut self, backoff: Duration) -> Self {
        self.initial_backoff = backoff;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl ChatModel for OpenAIClient {
    async fn chat_completion(&self, body: &Value) -> Result<Value> {
        let mut attempt = 0;
        let mut backoff = self.initial_backoff;
        let request_url = build_chat_url(&self.base_url);

        loop {
            let response = self
                .client
                .post(&request_url)
                .timeout(self.timeout)
                .bearer_auth(&self.api_key)
                .header("Content-Type", "application/json")
                .header("X-Title", "tiny-crew-rs")
                .json(body)
                .send()
                .await
                .map_err(|err| {
                    if err.is_timeout() {
                        CrewError::Timeout(format!("Model request timed out: {err}"))
                    } else {
                        CrewError::Http(format!("HTTP request failed: {err}"))
                    }
                })?;

            let status = response.status();
            let headers = response.headers().clone();
            let response_text = response
                .text()
                .await
                .map_err(|err| CrewError::Http(format!("Failed to read response: {err}")))?;

            if status == StatusCode::TOO_MANY_REQUESTS {
                let retry_after_duration = headers
                    .get(reqwest::header::RETRY_AFTER)
                    .and_then(|value| value.to_str().ok())
                    .and_then(|value| value.parse::<u64>().ok())
                    .map(Duration::from_secs)
                    .unwrap_or(backoff)
                    .min(MAX_RETRY_WAIT);

                if attempt < MAX_RETRIES {
                    warn!(target: "tinycrew::model", attempt, "rate limited, backing off");
                    tokio::time::sleep(retry_after_duration).await;
                    attempt += 1;
                    backoff *= 2;
                    continue;
                }

                return Err(CrewError::RateLimit {
                    retry_after: retry_after_duration.as_secs().max(1),
                });
            }

            if status.is_server_error() && attempt < MAX_RETRIES {
                warn!(target: "tinycrew::model", attempt, %status, "server error, retrying");
                tokio::time::sleep(backoff.min(MAX_RETRY_WAIT)).await;
                attempt += 1;
                backoff *= 2;
                continue;
            }

            let response_json: Value = serde_json::from_str(&response_text)
                .map_err(|err| CrewError::Http(format!("Failed to parse JSON: {err}")))?;

            if !status.is_success() {
                let api_message = response_json
                    .get("error")
                    .and_then(|error| error.get("message"))
                    .and_then(|value| value.as_str())
                    .map(|s| s.to_string())
                    .unwrap_or(response_text.clone());

                return Err(CrewError::Http(format!(
                    "HTTP {} error: {}",
                    status, api_message
                )));
            }

            if let Some(error) = response_json.get("error") {
                let error_message = error
                    .get("message")
                    .and_then(|value| value.as_str())
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| error.to_string());
                return Err(CrewError::Http(format!("API error: {}", error_message)));
            }

            return Ok(response_json);
        }
    }
}

fn build_chat_url(base_url: &str) -> String {
    let trimmed = base_url.trim_end_matches('/');
    if trimmed.ends_with("/chat/completions") {
        trimmed.to_string()
    } else {
        format!("{}/chat/completions", trimmed)
    }
}

#[derive(Clone, Debug)]
pub struct ChatCompletionRequest {
    model: String,
    messages: Vec<Value>,
    tools: Vec<Value>,
    tool_choice: Option<Value>,
    max_tokens: Option<u32>,
}

impl ChatCompletionRequest {
    pub fn new(model: impl Into<String>, messages: Vec<Value>) -> Self {
        Self {
            model: model.into(),
            messages,
            tools: Vec::new(),
            tool_choice: None,
            max_tokens: None,
        }
    }

    pub fn with_tools(mut self, tools: Vec<Value>) -> Self {
        self.tools = tools;
        self
    }

    pub fn with_tool_choice(mut self, tool_choice: Value) -> Self {
        self.tool_choice = Some(tool_choice);
        self
    }

    /// Force the model to answer through the named function.
    pub fn with_forced_function(self, name: &str) -> Self {
        self.with_tool_choice(json!({
            "type": "function",
            "function": {"name": name}
        }))
    }

    pub fn with_max_tokens(mut self, max_tokens: Option<u32>) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn into_value(self) -> Value {
        let mut body = json!({
            "model": self.model,
            "messages": self.messages,
        });

        if !self.tools.is_empty() {
            body["tools"] = Value::Array(self.tools);
        }

        if let Some(tool_choice) = self.tool_choice {
            body["tool_choice"] = tool_choice;
        }

        if let Some(max_tokens) = self.max_tokens {
            body["max_tokens"] = json!(max_tokens);
        }

        body
    }
}
