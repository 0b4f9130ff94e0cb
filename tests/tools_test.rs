use mockito::Matcher;
use serde_json::json;
use std::time::Duration;
use tiny_crew_rs::{
    tools::{page_fetch::fetch_page_text, FetchPage, WebSearchTool},
    ChatModel, CrewError, FunctionFactory, OpenAIClient, Tool,
};

#[tokio::test]
async fn test_web_search_posts_query_and_maps_results() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/search")
        .match_header("authorization", "Bearer tvly-test")
        .match_body(Matcher::PartialJson(json!({
            "query": "nano health particles",
            "max_results": 3,
            "search_depth": "basic"
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "results": [
                    {"title": "First", "url": "https://one.example", "content": "one"},
                    {"title": "Second", "url": "https://two.example", "content": "two"}
                ]
            })
            .to_string(),
        )
        .create_async()
        .await;

    let tool = WebSearchTool::new("tvly-test").with_base_url(server.url());
    let output = tool
        .execute(json!({"query": "nano health particles"}))
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(output["results"][0]["title"], "First");
    assert_eq!(output["results"][1]["url"], "https://two.example");
    assert_eq!(output["results"][1]["snippet"], "two");
}

#[tokio::test]
async fn test_web_search_status_classification() {
    let mut server = mockito::Server::new_async().await;
    let _unavailable = server
        .mock("POST", "/search")
        .match_body(Matcher::PartialJson(json!({"query": "down"})))
        .with_status(503)
        .create_async()
        .await;
    let _unauthorized = server
        .mock("POST", "/search")
        .match_body(Matcher::PartialJson(json!({"query": "denied"})))
        .with_status(401)
        .create_async()
        .await;

    let tool = WebSearchTool::new("key").with_base_url(server.url());

    let err = tool.execute(json!({"query": "down"})).await.unwrap_err();
    assert!(matches!(err, CrewError::ToolTransport(_)));
    assert!(err.is_retryable());

    let err = tool.execute(json!({"query": "denied"})).await.unwrap_err();
    assert!(matches!(err, CrewError::ToolExecution(_)));
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn test_function_factory_retries_transient_search_failures() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/search")
        .with_status(502)
        .expect(3)
        .create_async()
        .await;

    let mut factory = FunctionFactory::new()
        .with_max_retries(2)
        .with_retry_backoff(Duration::from_millis(1));
    factory.register_tool(WebSearchTool::new("key").with_base_url(server.url()));

    let attempt = factory
        .execute_with_retry("web_search", json!({"query": "flaky"}))
        .await;

    mock.assert_async().await;
    assert_eq!(attempt.attempts, 3);
    assert!(matches!(attempt.result, Err(CrewError::ToolTransport(_))));
}

#[tokio::test]
async fn test_fetch_page_extracts_text() {
    let mut server = mockito::Server::new_async().await;
    let _page = server
        .mock("GET", "/article")
        .with_status(200)
        .with_header("content-type", "text/html; charset=utf-8")
        .with_body(
            "<html><head><style>p{}</style><script>var x;</script></head>\
             <body><h1>Nano Health</h1><p>Tiny &amp; useful.</p></body></html>",
        )
        .create_async()
        .await;

    let url = format!("{}/article", server.url());
    let output = fetch_page_text(&url).await.unwrap();

    assert_eq!(output["url"], url);
    assert_eq!(output["text"], "Nano Health Tiny & useful.");
    assert_eq!(output["truncated"], false);
}

#[tokio::test]
async fn test_fetch_page_returns_plain_bodies_untouched() {
    let mut server = mockito::Server::new_async().await;
    let _notes = server
        .mock("GET", "/notes.txt")
        .with_status(200)
        .with_header("content-type", "text/plain")
        .with_body("line one\nline two")
        .create_async()
        .await;

    let output = FetchPage
        .execute(json!({"url": format!("{}/notes.txt", server.url())}))
        .await
        .unwrap();
    assert_eq!(output["text"], "line one\nline two");
}

#[tokio::test]
async fn test_fetch_page_errors() {
    let mut server = mockito::Server::new_async().await;
    let _missing = server
        .mock("GET", "/missing")
        .with_status(404)
        .create_async()
        .await;

    let err = fetch_page_text(&format!("{}/missing", server.url()))
        .await
        .unwrap_err();
    assert!(matches!(err, CrewError::ToolExecution(_)));

    let err = fetch_page_text("http://127.0.0.1:1/unreachable")
        .await
        .unwrap_err();
    assert!(matches!(err, CrewError::ToolTransport(_)));

    let err = FetchPage.execute(json!({"link": "x"})).await.unwrap_err();
    assert!(matches!(err, CrewError::ToolExecution(_)));
}

#[tokio::test]
async fn test_openai_client_sends_bearer_request() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/chat/completions")
        .match_header("authorization", "Bearer test-key")
        .match_body(Matcher::PartialJson(json!({"model": "openai/gpt-4.1-mini"})))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "choices": [{"message": {"role": "assistant", "content": "hi"}}]
            })
            .to_string(),
        )
        .create_async()
        .await;

    let client = OpenAIClient::new("test-key").with_base_url(server.url());
    let response = client
        .chat_completion(&json!({"model": "openai/gpt-4.1-mini", "messages": []}))
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(response["choices"][0]["message"]["content"], "hi");
}

#[tokio::test]
async fn test_openai_client_retries_server_errors_then_fails() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/chat/completions")
        .with_status(500)
        .with_header("content-type", "application/json")
        .with_body(json!({"error": {"message": "upstream down"}}).to_string())
        .expect(4)
        .create_async()
        .await;

    let client = OpenAIClient::new("key")
        .with_base_url(server.url())
        .with_initial_backoff(Duration::from_millis(1));
    let err = client
        .chat_completion(&json!({"model": "m", "messages": []}))
        .await
        .unwrap_err();

    mock.assert_async().await;
    assert!(matches!(err, CrewError::Http(_)));
    assert!(err.to_string().contains("upstream down"));
}

#[tokio::test]
async fn test_openai_client_reports_rate_limit() {
    let mut server = mockito::Server::new_async().await;
    let _limited = server
        .mock("POST", "/chat/completions")
        .with_status(429)
        .with_header("retry-after", "0")
        .with_body("{}")
        .create_async()
        .await;

    let client = OpenAIClient::new("key").with_base_url(server.url());
    let err = client
        .chat_completion(&json!({"model": "m", "messages": []}))
        .await
        .unwrap_err();

    assert!(matches!(err, CrewError::RateLimit { retry_after: 1 }));
    assert!(err.is_retryable());
}
