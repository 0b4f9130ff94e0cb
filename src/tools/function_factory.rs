use super::{tool::ToolRegistry, Tool};
use crate::{CrewError, Result};
use serde_json::Value;
use std::time::Duration;
use tokio::time::timeout;
use tracing::warn;

/// Result of a tool invocation after retries
#[derive(Debug)]
pub struct ToolAttempt {
    pub result: Result<Value>,
    pub attempts: usize,
}

/// Dispatches tool calls by name, with a per-call timeout and bounded
/// retries for transient failures
#[derive(Debug)]
pub struct FunctionFactory {
    registry: ToolRegistry,
    max_retries: usize,
    call_timeout: Duration,
    retry_backoff: Duration,
}

impl FunctionFactory {
    pub fn new() -> Self {
        Self {
            registry: ToolRegistry::new(),
            max_retries: 2,
            call_timeout: Duration::from_secs(30),
            retry_backoff: Duration::from_millis(200),
        }
    }

    pub fn with_max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_call_timeout(mut self, call_timeout: Duration) -> Self {
        self.call_timeout = call_timeout;
        self
    }

    pub fn with_retry_backoff(mut self, retry_backoff: Duration) -> Self {
        self.retry_backoff = retry_backoff;
        self
    }

    pub fn register_tool<T: Tool + 'static>(&mut self, tool: T) {
        self.registry.register(tool);
    }

    /// Execute a function call by name, once
    pub async fn execute_function(&self, function_name: &str, parameters: Value) -> Result<Value> {
        let tool = self
            .registry
            .get(function_name)
            .ok_or_else(|| CrewError::ToolNotFound(function_name.to_string()))?;

        timeout(self.call_timeout, tool.execute(parameters))
            .await
            .map_err(|_| {
                CrewError::Timeout(format!(
                    "Tool `{}` did not finish within {}s",
                    function_name,
                    self.call_timeout.as_secs()
                ))
            })?
    }

    /// Execute a function call, retrying retryable failures up to
    /// `max_retries` extra times.
    pub async fn execute_with_retry(&self, function_name: &str, parameters: Value) -> ToolAttempt {
        let mut attempts = 0;
        let mut backoff = self.retry_backoff;

        loop {
            attempts += 1;
            let result = self
                .execute_function(function_name, parameters.clone())
                .await;

            match result {
                Err(err) if err.is_retryable() && attempts <= self.max_retries => {
                    warn!(
                        target: "tinycrew::tools",
                        tool = function_name,
                        attempt = attempts,
                        error = %err,
                        "tool call failed, retrying"
                    );
                    tokio::time::sleep(backoff).await;
                    backoff *= 2;
                }
                result => return ToolAttempt { result, attempts },
            }
        }
    }

    pub fn get_openai_tools(&self) -> Vec<Value> {
        self.registry.to_openai_tools()
    }

    pub fn has_function(&self, name: &str) -> bool {
        self.registry.get(name).is_some()
    }

    pub fn tool_names(&self) -> Vec<&'static str> {
        self.registry.list().iter().map(|tool| tool.name()).collect()
    }
}

impl Default for FunctionFactory {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::pin::Pin;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Fails with a transport error until `succeed_on` attempts have been made.
    #[derive(Debug)]
    struct FlakyTool {
        calls: AtomicUsize,
        succeed_on: usize,
    }

    impl Tool for FlakyTool {
        fn name(&self) -> &'static str {
            "flaky"
        }

        fn description(&self) -> &'static str {
            "fails a few times"
        }

        fn parameters_schema(&self) -> Value {
            json!({"type": "object", "properties": {}})
        }

        fn execute(
            &self,
            _parameters: Value,
        ) -> Pin<Box<dyn std::future::Future<Output = Result<Value>> + Send + '_>> {
            Box::pin(async move {
                let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
                if call >= self.succeed_on {
                    Ok(json!({"ok": call}))
                } else {
                    Err(CrewError::ToolTransport("connection reset".to_string()))
                }
            })
        }
    }

    fn factory(succeed_on: usize, retries: usize) -> FunctionFactory {
        let mut factory = FunctionFactory::new()
            .with_max_retries(retries)
            .with_retry_backoff(Duration::from_millis(1));
        factory.register_tool(FlakyTool {
            calls: AtomicUsize::new(0),
            succeed_on,
        });
        factory
    }

    #[tokio::test]
    async fn test_transient_failure_is_retried() {
        let attempt = factory(3, 2).execute_with_retry("flaky", json!({})).await;
        assert_eq!(attempt.attempts, 3);
        assert_eq!(attempt.result.unwrap()["ok"], 3);
    }

    #[tokio::test]
    async fn test_retries_are_bounded() {
        let attempt = factory(10, 2).execute_with_retry("flaky", json!({})).await;
        assert_eq!(attempt.attempts, 3);
        assert!(matches!(attempt.result, Err(CrewError::ToolTransport(_))));
    }

    #[tokio::test]
    async fn test_unknown_tool_is_not_retried() {
        let attempt = factory(1, 2).execute_with_retry("missing", json!({})).await;
        assert_eq!(attempt.attempts, 1);
        assert!(matches!(attempt.result, Err(CrewError::ToolNotFound(_))));
    }
}
