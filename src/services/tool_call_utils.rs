use crate::error::CrewError;
use serde_json::Value;

/// Extract tool_call_id from a tool call JSON object
pub(crate) fn extract_tool_call_id(tool_call: &Value) -> &str {
    tool_call
        .get("id")
        .and_then(|value| value.as_str())
        .unwrap_or_default()
}

/// Extract the function object and its name from a tool call JSON object
pub(crate) fn extract_function_info(tool_call: &Value) -> Option<(&Value, Option<&str>)> {
    let function = tool_call.get("function")?;
    let function_name = function.get("name").and_then(|value| value.as_str());
    Some((function, function_name))
}

/// Extract arguments string from function object
pub(crate) fn extract_arguments_str(function: &Value) -> &str {
    function
        .get("arguments")
        .and_then(|value| value.as_str())
        .unwrap_or("")
}

/// Parse function arguments from JSON string
pub(crate) fn parse_function_arguments(
    arguments_str: &str,
    function_name: &str,
) -> Result<Value, CrewError> {
    serde_json::from_str(arguments_str).map_err(|err| {
        CrewError::InvalidFunctionCall(format!(
            "Failed to parse arguments for tool '{}': {}",
            function_name, err
        ))
    })
}

/// Tool calls attached to an assistant message, if any.
pub(crate) fn tool_calls_of(message: &Value) -> Option<&Vec<Value>> {
    message
        .get("tool_calls")
        .and_then(|value| value.as_array())
        .filter(|calls| !calls.is_empty())
}
