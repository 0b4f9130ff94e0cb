use crate::{
    core::{agent::DEFAULT_MODEL, orchestrator::DEFAULT_MAX_STEPS},
    error::{CrewError, Result},
    services::openai_client::DEFAULT_BASE_URL,
};
use std::{env, time::Duration};

/// Settings for one crew run, usually read from the environment
#[derive(Debug, Clone)]
pub struct CrewConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    /// Without it the `web_search` tool is left out
    pub search_api_key: Option<String>,
    pub max_steps: usize,
    pub max_iterations: usize,
    pub max_tool_calls: usize,
    pub model_timeout: Duration,
    pub tool_timeout: Duration,
    pub reroute_on_worker_failure: bool,
}

impl CrewConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            search_api_key: None,
            max_steps: DEFAULT_MAX_STEPS,
            max_iterations: 10,
            max_tool_calls: 8,
            model_timeout: Duration::from_secs(120),
            tool_timeout: Duration::from_secs(30),
            reroute_on_worker_failure: false,
        }
    }

    /// Load from the process environment, reading a `.env` file first if
    /// one exists.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(None, |name| env::var(name).ok())
    }

    /// Build from any variable source. Blank values count as unset.
    pub fn from_lookup<F>(api_key: Option<String>, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let first_of = |names: &[&str]| names.iter().find_map(|name| var(*name));

        let api_key = api_key.or_else(|| var("OPENAI_API_KEY")).ok_or_else(|| {
            CrewError::Config(
                "OPENAI_API_KEY is required for the model completion service".to_string(),
            )
        })?;

        let mut config = Self::new(api_key);

        // ORCHESTATOR_* is the spelling older .env files use
        if let Some(base_url) = first_of(&[
            "ORCHESTRATOR_BASE_URL",
            "ORCHESTATOR_BASE_URL",
            "OPENAI_BASE_URL",
        ]) {
            config.base_url = base_url;
        }

        if let Some(model) = first_of(&["ORCHESTRATOR_MODEL", "ORCHESTATOR_MODEL"]) {
            config.model = model;
        }

        config.search_api_key = var("TAVILY_API_KEY");

        if let Some(raw) = var("CREW_MAX_STEPS") {
            config.max_steps = raw.parse().map_err(|_| {
                CrewError::Config(format!("CREW_MAX_STEPS must be a positive integer, got '{}'", raw))
            })?;
        }

        Ok(config)
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_search_api_key(mut self, search_api_key: Option<String>) -> Self {
        self.search_api_key = search_api_key;
        self
    }

    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
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

    pub fn with_model_timeout(mut self, timeout: Duration) -> Self {
        self.model_timeout = timeout;
        self
    }

    pub fn with_tool_timeout(mut self, timeout: Duration) -> Self {
        self.tool_timeout = timeout;
        self
    }

    pub fn with_reroute_on_worker_failure(mut self, reroute: bool) -> Self {
        self.reroute_on_worker_failure = reroute;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.api_key.trim().is_empty() {
            return Err(CrewError::Config("API key must not be empty".to_string()));
        }
        if self.max_steps == 0 {
            return Err(CrewError::Config("max_steps must be at least 1".to_string()));
        }
        if self.max_iterations == 0 {
            return Err(CrewError::Config(
                "max_iterations must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = CrewConfig::new("key");
        assert_eq!(config.base_url, "https://openrouter.ai/api/v1");
        assert_eq!(config.model, "openai/gpt-4.1-mini");
        assert_eq!(config.max_steps, 150);
        assert!(config.search_api_key.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_ceiling() {
        let config = CrewConfig::new("key").with_max_steps(0);
        assert!(matches!(config.validate(), Err(CrewError::Config(_))));
        assert!(CrewConfig::new("  ").validate().is_err());
    }

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect();
        move |name: &str| vars.get(name).cloned()
    }

    #[test]
    fn test_environment_without_api_key_still_applies() {
        let config = CrewConfig::from_lookup(
            Some("cli-key".to_string()),
            lookup(&[
                ("TAVILY_API_KEY", "tvly-1"),
                ("ORCHESTRATOR_MODEL", "org/model"),
                ("OPENAI_BASE_URL", "http://localhost:9000/v1"),
                ("CREW_MAX_STEPS", "12"),
            ]),
        )
        .unwrap();
        assert_eq!(config.api_key, "cli-key");
        assert_eq!(config.search_api_key.as_deref(), Some("tvly-1"));
        assert_eq!(config.model, "org/model");
        assert_eq!(config.base_url, "http://localhost:9000/v1");
        assert_eq!(config.max_steps, 12);
    }

    #[test]
    fn test_missing_api_key_is_a_config_error() {
        let err = CrewConfig::from_lookup(None, lookup(&[("TAVILY_API_KEY", "t")])).unwrap_err();
        assert!(matches!(err, CrewError::Config(_)));
    }

    #[test]
    fn test_invalid_step_ceiling_is_reported() {
        let err = CrewConfig::from_lookup(
            Some("key".to_string()),
            lookup(&[("CREW_MAX_STEPS", "lots")]),
        )
        .unwrap_err();
        assert!(err.to_string().contains("CREW_MAX_STEPS"));
    }

    #[test]
    fn test_legacy_orchestator_spelling_is_accepted() {
        let config = CrewConfig::from_lookup(
            None,
            lookup(&[
                ("OPENAI_API_KEY", "key"),
                ("ORCHESTATOR_BASE_URL", "http://legacy/v1"),
                ("ORCHESTATOR_MODEL", "legacy/model"),
                ("ORCHESTRATOR_MODEL", " "),
            ]),
        )
        .unwrap();
        assert_eq!(config.base_url, "http://legacy/v1");
        assert_eq!(config.model, "legacy/model");
    }

    #[test]
    fn test_builder_overrides() {
        let config = CrewConfig::new("key")
            .with_model("anthropic/claude-sonnet")
            .with_base_url("http://localhost:8080/v1")
            .with_search_api_key(Some("tvly".to_string()))
            .with_reroute_on_worker_failure(true);
        assert_eq!(config.model, "anthropic/claude-sonnet");
        assert_eq!(config.base_url, "http://localhost:8080/v1");
        assert_eq!(config.search_api_key.as_deref(), Some("tvly"));
        assert!(config.reroute_on_worker_failure);
    }
}
