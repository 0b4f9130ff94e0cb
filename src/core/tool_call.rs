use crate::error::CrewError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::{Duration, Instant};

/// A tool call requested by the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Provider-assigned call id
    pub id: String,
    /// Name of the tool to execute
    pub name: String,
    /// Parsed arguments
    pub arguments: Value,
}

impl ToolCall {
    pub fn new(id: String, name: String, arguments: Value) -> Self {
        Self {
            id,
            name,
            arguments,
        }
    }

    /// Convert to OpenAI tool call format
    pub fn to_openai_format(&self) -> Value {
        serde_json::json!({
            "id": self.id,
            "type": "function",
            "function": {
                "name": self.name,
                "arguments": serde_json::to_string(&self.arguments).unwrap_or_default()
            }
        })
    }

    pub fn describe(&self) -> String {
        format!("{}({})", self.name, self.arguments)
    }
}

/// Output of one tool invocation, as fed back to the model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolOutput {
    pub tool_call_id: String,
    pub tool_name: String,
    pub output: Value,
    pub is_error: bool,
    /// Number of attempts it took, retries included
    pub attempts: usize,
    pub duration_ms: Option<u128>,
}

impl ToolOutput {
    pub fn success(tool_call_id: String, tool_name: String, output: Value) -> Self {
        Self {
            tool_call_id,
            tool_name,
            output,
            is_error: false,
            attempts: 1,
            duration_ms: None,
        }
    }

    /// Fold an error into an observation the model can read.
    pub fn error(tool_call_id: String, tool_name: String, error: &CrewError) -> Self {
        Self {
            tool_call_id,
            tool_name,
            output: error.to_error_payload(),
            is_error: true,
            attempts: 1,
            duration_ms: None,
        }
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration_ms = Some(duration.as_millis());
        self
    }

    pub fn with_attempts(mut self, attempts: usize) -> Self {
        self.attempts = attempts;
        self
    }

    pub fn as_string(&self) -> String {
        match &self.output {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }

    /// Convert to OpenAI tool message format
    pub fn to_openai_message(&self) -> Value {
        serde_json::json!({
            "role": "tool",
            "tool_call_id": self.tool_call_id,
            "content": self.as_string()
        })
    }
}

/// Tracks the execution of a tool call with timing information
#[derive(Debug)]
pub struct ToolExecution {
    pub tool_call: ToolCall,
    start_time: Instant,
}

impl ToolExecution {
    pub fn start(tool_call: ToolCall) -> Self {
        Self {
            tool_call,
            start_time: Instant::now(),
        }
    }

    pub fn complete(self, output: Value, attempts: usize) -> ToolOutput {
        let duration = self.start_time.elapsed();
        ToolOutput::success(self.tool_call.id, self.tool_call.name, output)
            .with_attempts(attempts)
            .with_duration(duration)
    }

    pub fn complete_with_error(self, error: &CrewError, attempts: usize) -> ToolOutput {
        let duration = self.start_time.elapsed();
        ToolOutput::error(self.tool_call.id, self.tool_call.name, error)
            .with_attempts(attempts)
            .with_duration(duration)
    }
}
