use super::Tool;
use crate::{schemas::validator::Validator, CrewError};
use reqwest::Client;
use schemars::gen::SchemaSettings;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::pin::Pin;

pub const DEFAULT_SEARCH_URL: &str = "https://api.tavily.com";
const DEFAULT_MAX_RESULTS: u32 = 3;
const MAX_RESULTS_CAP: u32 = 10;

/// How hard the search provider should dig
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum SearchDepth {
    #[default]
    Basic,
    Advanced,
}

/// Parameters accepted by the web search tool
#[derive(Debug, Serialize, Deserialize, schemars::JsonSchema)]
pub struct WebSearchParams {
    /// Search query
    pub query: String,
    /// Number of results to return (1-10, default 3)
    #[serde(default)]
    #[schemars(range(min = 1, max = 10))]
    pub max_results: Option<u32>,
    /// `basic` or `advanced`
    #[serde(default)]
    pub search_depth: Option<SearchDepth>,
}

/// One search hit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub title: String,
    pub url: String,
    pub snippet: String,
}

/// Web search backed by the Tavily search API
#[derive(Debug, Clone)]
pub struct WebSearchTool {
    api_key: String,
    base_url: String,
    client: Client,
}

impl WebSearchTool {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_SEARCH_URL.to_string(),
            client: Client::new(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

impl Tool for WebSearchTool {
    fn name(&self) -> &'static str {
        "web_search"
    }

    fn description(&self) -> &'static str {
        "Search the web for recent, relevant pages. Returns title, url and snippet for each hit."
    }

    fn parameters_schema(&self) -> Value {
        // Inline `SearchDepth` so the function schema carries no dangling $ref
        let schema = SchemaSettings::draft07()
            .with(|settings| {
                settings.inline_subschemas = true;
                settings.option_add_null_type = false;
            })
            .into_generator()
            .into_root_schema_for::<WebSearchParams>();
        serde_json::to_value(&schema.schema).unwrap_or_else(|_| {
            serde_json::json!({
                "type": "object",
                "properties": {"query": {"type": "string"}},
                "required": ["query"]
            })
        })
    }

    fn execute(
        &self,
        parameters: Value,
    ) -> Pin<Box<dyn std::future::Future<Output = Result<Value, CrewError>> + Send + '_>> {
        Box::pin(async move {
            let params: WebSearchParams = Validator::SerdeFirst
                .validate(parameters)
                .map_err(|err| CrewError::ToolExecution(err.to_string()))?;

            if params.query.trim().is_empty() {
                return Err(CrewError::ToolExecution(
                    "Search query must not be empty".to_string(),
                ));
            }

            let max_results = params
                .max_results
                .unwrap_or(DEFAULT_MAX_RESULTS)
                .clamp(1, MAX_RESULTS_CAP);
            let depth = params.search_depth.unwrap_or_default();

            let body = serde_json::json!({
                "query": params.query,
                "max_results": max_results,
                "search_depth": depth,
                "include_answer": false,
                "include_raw_content": false
            });

            let url = format!("{}/search", self.base_url.trim_end_matches('/'));
            let response = self
                .client
                .post(&url)
                .bearer_auth(&self.api_key)
                .json(&body)
                .send()
                .await
                .map_err(|err| CrewError::ToolTransport(format!("Search request failed: {}", err)))?;

            let status = response.status();
            if !status.is_success() {
                let detail = response.text().await.unwrap_or_default();
                let message = format!("Search provider returned status {}: {}", status, detail);
                return Err(if status.is_server_error() {
                    CrewError::ToolTransport(message)
                } else {
                    CrewError::ToolExecution(message)
                });
            }

            let payload: Value = response.json().await.map_err(|err| {
                CrewError::ToolExecution(format!("Failed to parse search response: {}", err))
            })?;

            let results = parse_search_results(&payload)?;
            Ok(serde_json::json!({ "results": results }))
        })
    }
}

/// Map the provider payload to ordered `{title, url, snippet}` hits,
/// skipping rows without a url.
pub fn parse_search_results(payload: &Value) -> Result<Vec<SearchResult>, CrewError> {
    let rows = payload
        .get("results")
        .and_then(|value| value.as_array())
        .ok_or_else(|| {
            CrewError::ToolExecution("Search response is missing a results array".to_string())
        })?;

    let text = |row: &Value, key: &str| {
        row.get(key)
            .and_then(|value| value.as_str())
            .unwrap_or_default()
            .trim()
            .to_string()
    };

    Ok(rows
        .iter()
        .filter_map(|row| {
            let url = text(row, "url");
            if url.is_empty() {
                return None;
            }
            let title = text(row, "title");
            Some(SearchResult {
                title: if title.is_empty() {
                    "Untitled".to_string()
                } else {
                    title
                },
                url,
                snippet: text(row, "content"),
            })
        })
        .collect())
}
