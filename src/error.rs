use thiserror::Error;

/// Main error type for the crew
#[derive(Error, Debug)]
pub enum CrewError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Model API error: {0}")]
    Http(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    /// The router produced no usable decision.
    #[error("Routing error: {0}")]
    Routing(String),

    /// A worker's agent loop did not converge on an answer.
    #[error("Agent error: {0}")]
    Agent(String),

    #[error("Tool execution error: {0}")]
    ToolExecution(String),

    /// Network-level tool failure, worth retrying.
    #[error("Tool transport error: {0}")]
    ToolTransport(String),

    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    #[error("Invalid function call: {0}")]
    InvalidFunctionCall(String),

    #[error("Timeout error: {0}")]
    Timeout(String),

    #[error("Step limit exceeded: {0} router invocations")]
    StepLimitExceeded(usize),

    #[error("Rate limit exceeded: retry after {retry_after}s")]
    RateLimit { retry_after: u64 },

    #[error("Unknown error: {0}")]
    Unknown(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, CrewError>;

impl CrewError {
    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            CrewError::ToolTransport(_) | CrewError::RateLimit { .. } | CrewError::Timeout(_)
        )
    }

    /// Get the error code for structured responses
    pub fn error_code(&self) -> &'static str {
        match self {
            CrewError::Config(_) => "CONFIG_ERROR",
            CrewError::Http(_) => "MODEL_API_ERROR",
            CrewError::Serialization(_) => "SERIALIZATION_ERROR",
            CrewError::Validation(_) => "VALIDATION_ERROR",
            CrewError::Routing(_) => "ROUTING_ERROR",
            CrewError::Agent(_) => "AGENT_ERROR",
            CrewError::ToolExecution(_) => "TOOL_EXECUTION_ERROR",
            CrewError::ToolTransport(_) => "TOOL_TRANSPORT_ERROR",
            CrewError::ToolNotFound(_) => "TOOL_NOT_FOUND",
            CrewError::InvalidFunctionCall(_) => "INVALID_FUNCTION_CALL",
            CrewError::Timeout(_) => "TIMEOUT_ERROR",
            CrewError::StepLimitExceeded(_) => "STEP_LIMIT_EXCEEDED",
            CrewError::RateLimit { .. } => "RATE_LIMIT_ERROR",
            CrewError::Unknown(_) => "UNKNOWN_ERROR",
        }
    }

    /// Convert to a structured error payload
    pub fn to_error_payload(&self) -> serde_json::Value {
        serde_json::json!({
            "error": {
                "code": self.error_code(),
                "message": self.to_string(),
                "retryable": self.is_retryable()
            }
        })
    }
}
