use super::validation::validate_against_schema;
use crate::{CrewError, Result};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Validation strategies for model-supplied arguments
#[derive(Debug, Clone)]
pub enum Validator {
    /// Fast validation using serde
    SerdeFirst,
    /// JSON Schema first, then serde
    Strict(StrictValidator),
}

impl Validator {
    pub fn strict(name: impl Into<String>, schema: Value) -> Self {
        Validator::Strict(StrictValidator::new(name, schema))
    }

    /// Validate and deserialize parameters into type T
    pub fn validate<T: DeserializeOwned>(&self, params: Value) -> Result<T> {
        match self {
            Validator::SerdeFirst => serde_first_validate(params),
            Validator::Strict(validator) => validator.validate(params),
        }
    }
}

/// Fast serde-first validator
fn serde_first_validate<T: DeserializeOwned>(params: Value) -> Result<T> {
    serde_path_to_error::deserialize(params).map_err(|e| {
        CrewError::Validation(format!(
            "Parameter validation failed at {}: {}",
            e.path(),
            e
        ))
    })
}

/// Strict JSON Schema validator
#[derive(Debug, Clone)]
pub struct StrictValidator {
    name: String,
    schema: Value,
}

impl StrictValidator {
    pub fn new(name: impl Into<String>, schema: Value) -> Self {
        Self {
            name: name.into(),
            schema,
        }
    }

    pub fn validate<T: DeserializeOwned>(&self, params: Value) -> Result<T> {
        validate_against_schema(&self.name, &self.schema, &params)?;
        serde_first_validate(params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize)]
    struct Query {
        query: String,
        #[serde(default)]
        limit: Option<u32>,
    }

    #[test]
    fn test_serde_first_reports_path() {
        let err = Validator::SerdeFirst
            .validate::<Query>(json!({"query": "x", "limit": "many"}))
            .unwrap_err();
        assert!(err.to_string().contains("limit"));
    }

    #[test]
    fn test_strict_checks_schema_before_serde() {
        let validator = Validator::strict(
            "query",
            json!({
                "type": "object",
                "properties": {"query": {"type": "string", "minLength": 3}},
                "required": ["query"]
            }),
        );

        assert!(validator.validate::<Query>(json!({"query": "ab"})).is_err());
        let parsed: Query = validator.validate(json!({"query": "abc"})).unwrap();
        assert_eq!(parsed.query, "abc");
        assert!(parsed.limit.is_none());
    }
}
