use crate::error::{CrewError, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use tokio::time::timeout;

/// Chat-completion backend used by the router and the workers.
///
/// Requests and responses use the OpenAI chat-completions JSON shape. The
/// router depends on the backend honouring a forced `tool_choice`.
#[async_trait]
pub trait ChatModel: Send + Sync + std::fmt::Debug {
    async fn chat_completion(&self, body: &Value) -> Result<Value>;
}

/// Run one completion with a hard deadline; an in-flight call cannot be
/// cancelled any other way.
pub(crate) async fn complete_with_timeout(
    model: &dyn ChatModel,
    body: &Value,
    limit: Duration,
) -> Result<Value> {
    timeout(limit, model.chat_completion(body))
        .await
        .map_err(|_| {
            CrewError::Timeout(format!(
                "Model call did not finish within {}s",
                limit.as_secs()
            ))
        })?
}

/// Pull the first choice's assistant message out of a completion response.
pub(crate) fn assistant_message(response: &Value) -> Result<Value> {
    let choices = response
        .get("choices")
        .and_then(|value| value.as_array())
        .ok_or_else(|| {
            CrewError::Http("Missing 'choices' array in completion response".to_string())
        })?;

    let first_choice = choices.first().ok_or_else(|| {
        CrewError::Http("Completion response contained no choices".to_string())
    })?;

    first_choice.get("message").cloned().ok_or_else(|| {
        CrewError::Http("Completion response missing assistant message".to_string())
    })
}
