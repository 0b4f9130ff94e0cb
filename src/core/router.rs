use super::{
    agent::DEFAULT_MODEL,
    decision::RoutingDecision,
    log::MessageLog,
    prompts,
    tool_call::ToolCall,
    turn::Turn,
};
use crate::{
    error::{CrewError, Result},
    schemas::{
        validation::{route_parameters_schema, route_tool_definition, RouteArguments, ROUTE_TOOL_NAME},
        validator::Validator,
    },
    services::{
        model::{assistant_message, complete_with_timeout, ChatModel},
        openai_client::{call_deadline, ChatCompletionRequest, DEFAULT_ATTEMPT_TIMEOUT},
        tool_call_utils::{
            extract_arguments_str, extract_function_info, extract_tool_call_id,
            parse_function_arguments, tool_calls_of,
        },
    },
};
use serde_json::{json, Value};
use std::{sync::Arc, time::Duration};
use tracing::{debug, info};

/// Picks the next actor through a forced `route` function call
#[derive(Debug, Clone)]
pub struct Router {
    model_client: Arc<dyn ChatModel>,
    model: String,
    max_tokens: Option<u32>,
    timeout: Duration,
}

impl Router {
    pub fn new(model_client: Arc<dyn ChatModel>) -> Self {
        Self {
            model_client,
            model: DEFAULT_MODEL.to_string(),
            max_tokens: None,
            timeout: call_deadline(DEFAULT_ATTEMPT_TIMEOUT),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
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

    /// Prompt messages for a routing call. Pure function of the log.
    pub fn format_prompt(&self, log: &MessageLog) -> Vec<Value> {
        let mut messages = Vec::with_capacity(log.len() + 2);
        messages.push(json!({
            "role": "system",
            "content": prompts::router_system_prompt()
        }));
        messages.extend(log.as_messages());
        messages.push(json!({
            "role": "system",
            "content": prompts::router_decision_prompt()
        }));
        messages
    }

    pub fn build_request(&self, log: &MessageLog) -> Value {
        ChatCompletionRequest::new(self.model.clone(), self.format_prompt(log))
            .with_tools(vec![route_tool_definition()])
            .with_forced_function(ROUTE_TOOL_NAME)
            .with_max_tokens(self.max_tokens)
            .into_value()
    }

    /// Ask the model for the next actor and append the routing turn.
    ///
    /// The log is only touched when a valid decision came back.
    pub async fn route(&self, log: &mut MessageLog) -> Result<RoutingDecision> {
        if log.is_empty() {
            return Err(CrewError::Routing(
                "cannot route an empty conversation".to_string(),
            ));
        }

        let request_body = self.build_request(log);
        let response =
            complete_with_timeout(self.model_client.as_ref(), &request_body, self.timeout).await?;
        let assistant = assistant_message(&response)?;

        let (decision, turn) = parse_route_message(&assistant).map_err(|err| {
            debug!(target: "tinycrew::router", response = %assistant, "unusable routing response");
            err
        })?;

        info!(target: "tinycrew::router", next = %decision, "routing decision");
        log.push(turn);
        Ok(decision)
    }
}

/// Read the decision out of an assistant message.
///
/// The first tool call must be `route` with `{"next": <option>}`; anything
/// else is a routing error rather than a fallback.
pub fn parse_route_message(assistant: &Value) -> Result<(RoutingDecision, Turn)> {
    let tool_calls = tool_calls_of(assistant).ok_or_else(|| {
        CrewError::Routing("model answered without calling `route`".to_string())
    })?;

    let tool_call = &tool_calls[0];
    let (function, name) = extract_function_info(tool_call)
        .ok_or_else(|| CrewError::Routing("tool call is missing its function".to_string()))?;

    if name != Some(ROUTE_TOOL_NAME) {
        return Err(CrewError::Routing(format!(
            "expected a `{}` call, got `{}`",
            ROUTE_TOOL_NAME,
            name.unwrap_or_default()
        )));
    }

    let raw_arguments = extract_arguments_str(function);
    let arguments = parse_function_arguments(raw_arguments, ROUTE_TOOL_NAME)
        .map_err(|err| CrewError::Routing(err.to_string()))?;

    let parsed: RouteArguments = Validator::strict(ROUTE_TOOL_NAME, route_parameters_schema())
        .validate(arguments.clone())
        .map_err(|err| CrewError::Routing(err.to_string()))?;
    let decision: RoutingDecision = parsed.next.parse()?;

    let mut call_id = extract_tool_call_id(tool_call).to_string();
    if call_id.is_empty() {
        call_id = "route".to_string();
    }
    let call = ToolCall::new(call_id, ROUTE_TOOL_NAME.to_string(), arguments);

    Ok((decision, Turn::routing(decision, call, raw_arguments)))
}
