use super::{
    prompts,
    tool_call::{ToolCall, ToolExecution, ToolOutput},
};
use crate::{
    error::{CrewError, Result},
    services::{
        model::{assistant_message, complete_with_timeout, ChatModel},
        openai_client::{call_deadline, ChatCompletionRequest, DEFAULT_ATTEMPT_TIMEOUT},
        tool_call_utils::{
            extract_arguments_str, extract_function_info, extract_tool_call_id,
            parse_function_arguments, tool_calls_of,
        },
    },
    tools::FunctionFactory,
};
use serde_json::{json, Value};
use std::{sync::Arc, time::Duration};
use tracing::{debug, info, warn};

pub const DEFAULT_MODEL: &str = "openai/gpt-4.1-mini";

/// What a tool-using agent produced for one worker turn
#[derive(Debug, Clone)]
pub struct AgentAnswer {
    pub answer: String,
    /// Model round trips used
    pub iterations: usize,
    /// Every tool invocation, in call order
    pub tool_outputs: Vec<ToolOutput>,
}

/// Tool-using agent loop behind each worker.
///
/// Requests completions with the registered tools, executes whatever the
/// model calls, feeds the observations back and stops on the first plain
/// text answer. Both model round trips and tool invocations are capped.
#[derive(Debug, Clone)]
pub struct ToolAgent {
    model_client: Arc<dyn ChatModel>,
    function_factory: Arc<FunctionFactory>,
    model: String,
    max_iterations: usize,
    max_tool_calls: usize,
    max_tokens: Option<u32>,
    timeout: Duration,
}

impl ToolAgent {
    pub fn new(model_client: Arc<dyn ChatModel>, function_factory: Arc<FunctionFactory>) -> Self {
        Self {
            model_client,
            function_factory,
            model: DEFAULT_MODEL.to_string(),
            max_iterations: 10,
            max_tool_calls: 8,
            max_tokens: None,
            timeout: call_deadline(DEFAULT_ATTEMPT_TIMEOUT),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_max_tool_calls(mut self, max_tool_calls: usize) -> Self {
        self.max_tool_calls = max_tool_calls;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: Option<u32>) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Deadline for a whole model call, retries included.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub async fn run_with_messages(&self, mut messages: Vec<Value>) -> Result<AgentAnswer> {
        let tools = self.function_factory.get_openai_tools();
        let mut tool_outputs: Vec<ToolOutput> = Vec::new();

        for iteration in 1..=self.max_iterations {
            let mut chat_request = ChatCompletionRequest::new(self.model.clone(), messages.clone())
                .with_max_tokens(self.max_tokens);

            if !tools.is_empty() {
                chat_request = chat_request
                    .with_tools(tools.clone())
                    .with_tool_choice(json!("auto"));
            }

            let request_body = chat_request.into_value();
            let response =
                complete_with_timeout(self.model_client.as_ref(), &request_body, self.timeout)
                    .await?;
            let assistant = assistant_message(&response)?;

            let Some(tool_calls) = tool_calls_of(&assistant) else {
                let answer = assistant
                    .get("content")
                    .and_then(|value| value.as_str())
                    .unwrap_or("")
                    .trim()
                    .to_string();

                if answer.is_empty() {
                    debug!(target: "tinycrew::agent", iteration, "empty answer, reminding model");
                    messages.push(json!({
                        "role": "system",
                        "content": prompts::empty_answer_reminder()
                    }));
                    continue;
                }

                return Ok(AgentAnswer {
                    answer,
                    iterations: iteration,
                    tool_outputs,
                });
            };

            if tool_outputs.len() + tool_calls.len() > self.max_tool_calls {
                return Err(CrewError::Agent(format!(
                    "agent requested {} more tool calls after {}, exceeding the cap of {}",
                    tool_calls.len(),
                    tool_outputs.len(),
                    self.max_tool_calls
                )));
            }

            messages.push(json!({
                "role": "assistant",
                "content": assistant.get("content").cloned().unwrap_or(Value::Null),
                "tool_calls": tool_calls
            }));

            for tool_call in tool_calls {
                let output = self.invoke_tool(tool_call).await;
                messages.push(output.to_openai_message());
                tool_outputs.push(output);
            }
        }

        Err(CrewError::Agent(format!(
            "no final answer within {} iterations",
            self.max_iterations
        )))
    }

    /// Execute one requested call. Failures never escape: they come back as
    /// an error observation so the model can work around them.
    async fn invoke_tool(&self, tool_call: &Value) -> ToolOutput {
        let tool_call_id = extract_tool_call_id(tool_call).to_string();

        let (function, function_name) = match extract_function_info(tool_call) {
            Some((function, Some(name))) if !name.is_empty() => (function, name.to_string()),
            _ => {
                let err = CrewError::InvalidFunctionCall("Tool call missing function name".into());
                return ToolOutput::error(tool_call_id, "unknown".to_string(), &err);
            }
        };

        let arguments = match parse_function_arguments(extract_arguments_str(function), &function_name)
        {
            Ok(arguments) => arguments,
            Err(err) => return ToolOutput::error(tool_call_id, function_name, &err),
        };

        let call = ToolCall::new(tool_call_id, function_name, arguments.clone());
        info!(target: "tinycrew::agent", "🔧 Action: {}", call.describe());

        let tool_name = call.name.clone();
        let execution = ToolExecution::start(call);
        let attempt = self
            .function_factory
            .execute_with_retry(&tool_name, arguments)
            .await;

        match attempt.result {
            Ok(output) => execution.complete(output, attempt.attempts),
            Err(err) => {
                warn!(
                    target: "tinycrew::agent",
                    tool = %tool_name,
                    attempts = attempt.attempts,
                    error = %err,
                    "tool failed, folding error into observation"
                );
                execution.complete_with_error(&err, attempt.attempts)
            }
        }
    }
}
