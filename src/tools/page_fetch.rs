use crate::CrewError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;

pub const MAX_PAGE_CHARS: usize = 20_000;
const USER_AGENT: &str = "Mozilla/5.0 (compatible; tiny-crew/0.1)";

/// Parameters accepted by the page fetch tool
#[derive(Debug, Serialize, Deserialize, schemars::JsonSchema)]
pub struct FetchPageParams {
    /// Fully-qualified URL to fetch (e.g. <https://www.example.com>)
    pub url: String,
}

tinycrew_macros::tool!(
    name = "fetch_page",
    description = "Fetch a web page and return its readable plain text",
    params = FetchPageParams,
    |params: FetchPageParams| async move { fetch_page_text(&params.url).await }
);

/// GET `url` and return `{url, text, truncated}` with the page body
/// reduced to plain text.
pub async fn fetch_page_text(url: &str) -> Result<Value, CrewError> {
    let url = url.trim();
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(CrewError::ToolExecution(format!(
            "Expected an http(s) URL, got `{}`",
            url
        )));
    }

    let client = reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(Duration::from_secs(30))
        .build()
        .map_err(|err| CrewError::ToolExecution(format!("Failed to build HTTP client: {err}")))?;

    let response = client
        .get(url)
        .send()
        .await
        .map_err(|err| CrewError::ToolTransport(format!("Failed to fetch {}: {}", url, err)))?;

    let status = response.status();
    if !status.is_success() {
        let message = format!("{} returned status {}", url, status);
        return Err(if status.is_server_error() {
            CrewError::ToolTransport(message)
        } else {
            CrewError::ToolExecution(message)
        });
    }

    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_ascii_lowercase();

    let body = response
        .text()
        .await
        .map_err(|err| CrewError::ToolTransport(format!("Failed to read {}: {}", url, err)))?;

    let text = if content_type.contains("html") || body.trim_start().starts_with('<') {
        html_to_text(&body)?
    } else {
        body
    };

    let (text, truncated) = truncate_chars(text, MAX_PAGE_CHARS);
    Ok(json!({
        "url": url,
        "text": text,
        "truncated": truncated
    }))
}

/// Strip scripts, styles, comments and tags, decode entities and collapse
/// whitespace.
pub fn html_to_text(html: &str) -> Result<String, CrewError> {
    let compile = |pattern: &str| {
        Regex::new(pattern)
            .map_err(|err| CrewError::ToolExecution(format!("Invalid HTML pattern: {err}")))
    };

    // An unterminated block runs to the end of the document
    let blocks = compile(
        r"(?is)<script\b.*?(?:</script\s*>|\z)|<style\b.*?(?:</style\s*>|\z)|<noscript\b.*?(?:</noscript\s*>|\z)",
    )?;
    let comments = compile(r"(?s)<!--.*?(?:-->|\z)")?;
    // Only a letter, `/`, `!` or `?` after `<` opens markup; "3 < 5" is text
    let tags = compile(r"(?s)<[A-Za-z!/?][^>]*>")?;

    let text = blocks.replace_all(html, " ");
    let text = comments.replace_all(&text, " ");
    let text = tags.replace_all(&text, " ");
    let decoded = html_escape::decode_html_entities(&text);

    Ok(decoded.split_whitespace().collect::<Vec<_>>().join(" "))
}

fn truncate_chars(text: String, max_chars: usize) -> (String, bool) {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => (text[..byte_idx].to_string(), true),
        None => (text, false),
    }
}
