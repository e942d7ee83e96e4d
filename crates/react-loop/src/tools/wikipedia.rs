use std::time::Duration;

use react_loop_core::tool::{Error as ToolError, Tool, ToolResult};
use reqwest::{Client, StatusCode, Url, header};
use schemars::{JsonSchema, schema_for};
use serde::Deserialize;
use serde_json::Value;

use super::{USER_AGENT, request_error};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const SUMMARY_SENTENCES: usize = 3;
const DEFAULT_LANGUAGE: &str = "en";

#[derive(Deserialize, JsonSchema)]
pub struct WikipediaParameters {
    #[schemars(description = "Article title or search query.")]
    query: String,
    #[schemars(
        description = "Wikipedia language edition, e.g. `en` or `ru`. Defaults to `en`."
    )]
    language: Option<String>,
}

#[derive(Deserialize)]
struct PageSummary {
    title: Option<String>,
    #[serde(default)]
    extract: String,
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    query: SearchQuery,
}

#[derive(Default, Deserialize)]
struct SearchQuery {
    #[serde(default)]
    search: Vec<SearchHit>,
}

#[derive(Deserialize)]
struct SearchHit {
    title: String,
}

/// A tool that looks up article summaries on Wikipedia.
///
/// Titles are resolved through the REST summary endpoint first. When no page
/// matches, the tool runs a full-text search and summarizes the best hit.
pub struct WikipediaTool {
    client: Client,
    parameter_schema: Value,
}

impl WikipediaTool {
    /// Creates a new Wikipedia tool.
    #[inline]
    pub fn new() -> Self {
        Self::with_client(Client::new())
    }

    /// Creates a new Wikipedia tool that shares an existing HTTP client.
    pub fn with_client(client: Client) -> Self {
        WikipediaTool {
            client,
            parameter_schema: schema_for!(WikipediaParameters).to_value(),
        }
    }
}

impl Default for WikipediaTool {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl Tool for WikipediaTool {
    type Input = WikipediaParameters;

    fn name(&self) -> &str {
        "wikipedia"
    }

    fn description(&self) -> &str {
        "Looks up a topic on Wikipedia and returns a short summary. \
         Use it for facts, definitions, biographies, historical events and \
         scientific concepts."
    }

    fn parameter_names(&self) -> &[&str] {
        &["query", "language"]
    }

    fn parameter_schema(&self) -> &Value {
        &self.parameter_schema
    }

    fn execute(
        &self,
        input: WikipediaParameters,
    ) -> impl Future<Output = ToolResult> + Send + 'static {
        lookup(self.client.clone(), input)
    }
}

async fn lookup(client: Client, input: WikipediaParameters) -> ToolResult {
    let language = input.language.as_deref().unwrap_or(DEFAULT_LANGUAGE);
    let language = check_language(language)?;
    let query = input.query.trim();
    if query.is_empty() {
        return Err(ToolError::invalid_input().with_reason("query must not be empty"));
    }

    if let Some(summary) = fetch_summary(&client, language, query).await? {
        return Ok(summary);
    }
    debug!("no Wikipedia page titled {query:?}, falling back to search");

    let Some(title) = search_title(&client, language, query).await? else {
        return Ok(format!("Nothing found for: {query}"));
    };
    match fetch_summary(&client, language, &title).await? {
        Some(summary) => Ok(summary),
        None => Ok(format!("Nothing found for: {query}")),
    }
}

async fn fetch_summary(
    client: &Client,
    language: &str,
    title: &str,
) -> Result<Option<String>, ToolError> {
    let url = summary_url(language, title)?;
    let response = client
        .get(url)
        .header(header::USER_AGENT, USER_AGENT)
        .timeout(REQUEST_TIMEOUT)
        .send()
        .await
        .map_err(request_error)?;

    let status = response.status();
    if status == StatusCode::NOT_FOUND {
        return Ok(None);
    }
    if !status.is_success() {
        return Err(ToolError::execution_error()
            .with_reason(format!("Wikipedia API returned HTTP {status}")));
    }

    let summary: PageSummary = response.json().await.map_err(request_error)?;
    Ok(Some(format_summary(title, summary)))
}

async fn search_title(
    client: &Client,
    language: &str,
    query: &str,
) -> Result<Option<String>, ToolError> {
    let url = Url::parse_with_params(
        &format!("https://{language}.wikipedia.org/w/api.php"),
        &[
            ("action", "query"),
            ("list", "search"),
            ("srsearch", query),
            ("format", "json"),
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
            .with_reason(format!("Wikipedia search returned HTTP {status}")));
    }

    let body: SearchResponse = response.json().await.map_err(request_error)?;
    Ok(body.query.search.into_iter().next().map(|hit| hit.title))
}

fn summary_url(language: &str, title: &str) -> Result<Url, ToolError> {
    let invalid = || {
        ToolError::invalid_input()
            .with_reason(format!("cannot build a Wikipedia URL for {title:?}"))
    };
    let mut url = Url::parse(&format!(
        "https://{language}.wikipedia.org/api/rest_v1/page/summary/"
    ))
    .map_err(|_| invalid())?;
    url.path_segments_mut()
        .map_err(|_| invalid())?
        .pop_if_empty()
        .push(&title.replace(' ', "_"));
    Ok(url)
}

/// Language editions are short lowercase codes such as `en` or `zh-yue`.
fn check_language(language: &str) -> Result<&str, ToolError> {
    let language = language.trim();
    let valid = !language.is_empty()
        && language.len() <= 12
        && language
            .chars()
            .all(|ch| ch.is_ascii_lowercase() || ch == '-');
    if !valid {
        return Err(ToolError::invalid_input()
            .with_reason(format!("unsupported Wikipedia language `{language}`")));
    }
    Ok(language)
}

fn format_summary(requested: &str, summary: PageSummary) -> String {
    let title = summary.title.as_deref().unwrap_or(requested);
    let extract = summary.extract.trim();
    if extract.is_empty() {
        return format!("Article '{title}' has no summary.");
    }

    let mut text = extract
        .split(". ")
        .take(SUMMARY_SENTENCES)
        .collect::<Vec<_>>()
        .join(". ");
    if !text.ends_with('.') {
        text.push('.');
    }
    format!("[{title}] {text}")
}
