use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::json;
use tiny_crew_rs::{tools::Tool, CrewError, FunctionFactory};

#[derive(Debug, Deserialize, JsonSchema)]
struct CitationParams {
    /// Title of the source to cite
    title: String,
    /// Publication year, when known
    #[serde(default)]
    year: Option<u16>,
}

tiny_crew_rs::tool!(
    name = "format_citation",
    description = "Format a short citation for a source",
    params = CitationParams,
    |params: CitationParams| async move {
        if params.title.trim().is_empty() {
            return Err(CrewError::ToolExecution("title must not be empty".to_string()));
        }
        let citation = match params.year {
            Some(year) => format!("{} ({})", params.title, year),
            None => params.title,
        };
        Ok(json!({ "citation": citation }))
    },
);

#[tokio::test]
async fn test_macro_generated_tool() {
    let tool = FormatCitation;

    assert_eq!(tool.name(), "format_citation");
    assert_eq!(tool.description(), "Format a short citation for a source");

    let schema = tool.parameters_schema();
    assert_eq!(schema["type"], "object");
    assert!(schema["properties"]["title"].is_object());
    assert_eq!(schema["required"], json!(["title"]));

    let result = tool
        .execute(json!({"title": "Nano Health", "year": 2024}))
        .await
        .unwrap();
    assert_eq!(result["citation"], "Nano Health (2024)");
}

#[tokio::test]
async fn test_macro_tool_optional_params() {
    let result = FormatCitation
        .execute(json!({"title": "Nano Health"}))
        .await
        .unwrap();
    assert_eq!(result["citation"], "Nano Health");
}

#[tokio::test]
async fn test_macro_tool_errors_pass_through() {
    let err = FormatCitation
        .execute(json!({"title": " "}))
        .await
        .unwrap_err();
    assert!(matches!(err, CrewError::ToolExecution(_)));

    let err = FormatCitation
        .execute(json!({"wrong_field": "oops"}))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("format_citation"));
}

#[tokio::test]
async fn test_macro_tool_registers_with_factory() {
    let mut factory = FunctionFactory::new();
    factory.register_tool(FormatCitation);

    assert!(factory.has_function("format_citation"));
    let tools = factory.get_openai_tools();
    assert_eq!(tools[0]["function"]["name"], "format_citation");

    let attempt = factory
        .execute_with_retry("format_citation", json!({"title": "X"}))
        .await;
    assert_eq!(attempt.attempts, 1);
    assert_eq!(attempt.result.unwrap()["citation"], "X");
}

#[test]
fn test_macro_tool_outside_async_test() {
    let result = tokio_test::block_on(FormatCitation.execute(json!({"title": "Y", "year": 1999})));
    let value = tokio_test::assert_ok!(result);
    assert_eq!(value["citation"], "Y (1999)");
}
