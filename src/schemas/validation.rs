use crate::{core::decision::RoutingDecision, error::CrewError};
use jsonschema::{Draft, JSONSchema};
use serde::Deserialize;
use serde_json::{json, Value};

const MAX_SCHEMA_ERRORS: usize = 3;
pub(crate) const ROUTE_TOOL_NAME: &str = "route";

/// Arguments of the `route` function
#[derive(Debug, Deserialize)]
pub(crate) struct RouteArguments {
    pub next: String,
}

/// Validate a payload against a JSON schema
pub(crate) fn validate_against_schema(
    schema_name: &str,
    schema: &Value,
    payload: &Value,
) -> std::result::Result<(), CrewError> {
    let validator = JSONSchema::options()
        .with_draft(Draft::Draft7)
        .compile(schema)
        .map_err(|err| {
            CrewError::Validation(format!(
                "Failed to prepare `{}` schema for validation: {}",
                schema_name, err
            ))
        })?;

    if let Err(errors) = validator.validate(payload) {
        let mut details = Vec::new();
        let mut truncated = false;

        for (idx, error) in errors.enumerate() {
            if idx < MAX_SCHEMA_ERRORS {
                let mut path = error.instance_path.to_string();
                if path.is_empty() {
                    path = "<root>".to_string();
                }
                details.push(format!("{}: {}", path, error));
            } else {
                truncated = true;
                break;
            }
        }

        let mut detail_str = if details.is_empty() {
            "payload failed schema validation".to_string()
        } else {
            details.join("; ")
        };

        if truncated {
            detail_str.push_str("; additional errors truncated");
        }

        return Err(CrewError::Validation(format!(
            "Payload does not match `{}` schema: {}",
            schema_name, detail_str
        )));
    }

    Ok(())
}

/// Parameters of the `route` function: a single `next` field constrained
/// to the routing enumeration.
pub(crate) fn route_parameters_schema() -> Value {
    json!({
        "title": "routeSchema",
        "type": "object",
        "properties": {
            "next": {
                "type": "string",
                "enum": RoutingDecision::option_names()
            }
        },
        "required": ["next"],
        "additionalProperties": false
    })
}

/// The function the router is forced to call
pub(crate) fn route_tool_definition() -> Value {
    json!({
        "type": "function",
        "function": {
            "name": ROUTE_TOOL_NAME,
            "description": "Select the next role.",
            "parameters": route_parameters_schema()
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_schema_accepts_every_option() {
        let schema = route_parameters_schema();
        for option in RoutingDecision::option_names() {
            assert!(validate_against_schema("route", &schema, &json!({ "next": option })).is_ok());
        }
    }

    #[test]
    fn test_route_schema_rejects_unknown_worker() {
        let schema = route_parameters_schema();
        let err = validate_against_schema("route", &schema, &json!({"next": "unknown_worker"}))
            .unwrap_err();
        assert!(matches!(err, CrewError::Validation(_)));
        assert!(err.to_string().contains("/next"));
    }

    #[test]
    fn test_route_schema_requires_next() {
        let schema = route_parameters_schema();
        assert!(validate_against_schema("route", &schema, &json!({})).is_err());
    }

    #[test]
    fn test_route_tool_definition_shape() {
        let tool = route_tool_definition();
        assert_eq!(tool["function"]["name"], "route");
        assert_eq!(
            tool["function"]["parameters"]["properties"]["next"]["enum"]
                .as_array()
                .unwrap()
                .len(),
            4
        );
    }
}
