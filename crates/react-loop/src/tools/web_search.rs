use std::time::Duration;

use react_loop_core::tool::{Error as ToolError, Tool, ToolResult};
use reqwest::{Client, Url, header};
use schemars::{JsonSchema, schema_for};
use serde::Deserialize;
use serde_json::Value;

use super::{USER_AGENT, request_error};

const ENDPOINT: &str = "https://api.duckduckgo.com/";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const MAX_RELATED_TOPICS: usize = 3;

#[derive(Deserialize, JsonSchema)]
pub struct WebSearchParameters {
    #[schemars(description = "Search query, works best in English.")]
    query: String,
}

/// The subset of a DuckDuckGo instant answer the tool reports.
#[derive(Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct InstantAnswer {
    #[serde(rename = "Abstract")]
    abstract_text: String,
    abstract_source: String,
    // Usually a string, but some answer types return an object.
    answer: Value,
    definition: String,
    definition_source: String,
    related_topics: Vec<Value>,
}

/// A tool that queries the DuckDuckGo Instant Answer API.
///
/// The API only returns instant answers (abstracts, definitions and related
/// topics), not a full list of web results.
pub struct WebSearchTool {
    client: Client,
    parameter_schema: Value,
}

impl WebSearchTool {
    /// Creates a new web search tool.
    #[inline]
    pub fn new() -> Self {
        Self::with_client(Client::new())
    }

    /// Creates a new web search tool that shares an existing HTTP client.
    pub fn with_client(client: Client) -> Self {
        WebSearchTool {
            client,
            parameter_schema: schema_for!(WebSearchParameters).to_value(),
        }
    }
}

impl Default for WebSearchTool {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl Tool for WebSearchTool {
    type Input = WebSearchParameters;

    fn name(&self) -> &str {
        "web_search"
    }

    fn description(&self) -> &str {
        "Searches the web through DuckDuckGo instant answers. Use it for \
         short answers to general questions; prefer wikipedia for details."
    }

    fn parameter_names(&self) -> &[&str] {
        &["query"]
    }

    fn parameter_schema(&self) -> &Value {
        &self.parameter_schema
    }

    fn execute(
        &self,
        input: WebSearchParameters,
    ) -> impl Future<Output = ToolResult> + Send + 'static {
        search(self.client.clone(), input.query)
    }
}

async fn search(client: Client, query: String) -> ToolResult {
    let query = query.trim();
    if query.is_empty() {
        return Err(ToolError::invalid_input().with_reason("query must not be empty"));
    }

    let url = Url::parse_with_params(
        ENDPOINT,
        &[
            ("q", query),
            ("format", "json"),
            ("no_html", "1"),
            ("skip_disambig", "1"),
        ],
    )
    .map_err(|err| ToolError::invalid_input().with_reason(err.to_string()))?;

    let response = client
        .get(url)
        .header(header::USER_AGENT, USER_AGENT)
        .timeout(REQUEST_TIMEOUT)
        .send()
        .await
        .map_err(request_error)?;
    let status = response.status();
    if !status.is_success() {
        return Err(ToolError::execution_error()
            .with_reason(format!("DuckDuckGo API returned HTTP {status}")));
    }

    // The API answers with `application/x-javascript`, so decode the bytes
    // rather than relying on the content type.
    let body = response.bytes().await.map_err(request_error)?;
    let answer: InstantAnswer = serde_json::from_slice(&body).map_err(|err| {
        ToolError::execution_error()
            .with_reason(format!("invalid DuckDuckGo response: {err}"))
    })?;
    Ok(format_answer(query, &answer))
}

/// Picks the most direct field of an instant answer.
fn format_answer(query: &str, answer: &InstantAnswer) -> String {
    if !answer.abstract_text.is_empty() {
        let source = non_empty_or(&answer.abstract_source, "DuckDuckGo");
        return format!("[{source}] {}", answer.abstract_text);
    }
    if let Some(text) = answer.answer.as_str().filter(|s| !s.is_empty()) {
        return format!("[Answer] {text}");
    }
    if !answer.definition.is_empty() {
        let source = non_empty_or(&answer.definition_source, "Dictionary");
        return format!("[{source}] {}", answer.definition);
    }

    let topics = answer
        .related_topics
        .iter()
        .take(MAX_RELATED_TOPICS)
        .filter_map(|topic| topic.get("Text").and_then(Value::as_str))
        .collect::<Vec<_>>();
    if !topics.is_empty() {
        return format!("Related topics:\n• {}", topics.join("\n• "));
    }

    format!("No direct answer found for: {query}")
}

#[inline]
fn non_empty_or<'a>(value: &'a str, default: &'a str) -> &'a str {
    if value.is_empty() { default } else { value }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn parse(value: Value) -> InstantAnswer {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_abstract_wins() {
        let answer = parse(json!({
            "Abstract": "Rust is a programming language.",
            "AbstractSource": "Wikipedia",
            "Answer": "ignored",
        }));
        assert_eq!(
            format_answer("rust", &answer),
            "[Wikipedia] Rust is a programming language."
        );
    }

    #[test]
    fn test_answer_then_definition() {
        let answer = parse(json!({ "Abstract": "", "Answer": "42" }));
        assert_eq!(format_answer("q", &answer), "[Answer] 42");

        let answer = parse(json!({
            "Answer": { "type": "calc" },
            "Definition": "a small piece",
        }));
        assert_eq!(format_answer("q", &answer), "[Dictionary] a small piece");
    }

    #[test]
    fn test_related_topics() {
        let answer = parse(json!({
            "RelatedTopics": [
                { "Text": "One" },
                { "Name": "Group", "Topics": [] },
                { "Text": "Two" },
                { "Text": "Three" },
            ],
        }));
        assert_eq!(
            format_answer("q", &answer),
            "Related topics:\n• One\n• Two"
        );
    }

    #[test]
    fn test_no_answer() {
        let answer = parse(json!({}));
        assert_eq!(
            format_answer("obscure thing", &answer),
            "No direct answer found for: obscure thing"
        );
    }
}
