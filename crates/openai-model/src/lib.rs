//! A model provider for OpenAI-compatible chat-completion APIs.
//!
//! The defaults target OpenRouter, but any server that speaks the
//! `/chat/completions` protocol works with a custom base URL.

#[macro_use]
extern crate tracing;

mod config;
mod proto;
mod response;

use std::error::Error as StdError;
use std::fmt::{self, Display};
use std::sync::Arc;

use mime::Mime;
use react_loop_model::{
    ErrorKind, ModelProvider, ModelProviderError, ModelRequest, ModelResponse,
};
use reqwest::{Client, StatusCode, header};

pub use config::{OpenAIConfig, OpenAIConfigBuilder};
use proto::{ChatCompletion, ErrorBody};

/// Error type for [`OpenAIProvider`].
#[derive(Debug)]
pub struct Error {
    message: String,
    kind: ErrorKind,
}

impl Error {
    fn new(message: impl Into<String>, kind: ErrorKind) -> Self {
        Self {
            message: message.into(),
            kind,
        }
    }

    /// Returns the error message.
    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl StdError for Error {}

impl ModelProviderError for Error {
    #[inline]
    fn kind(&self) -> ErrorKind {
        self.kind
    }
}

/// OpenAI-compatible model provider.
#[derive(Clone, Debug)]
pub struct OpenAIProvider {
    client: Client,
    config: Arc<OpenAIConfig>,
}

impl OpenAIProvider {
    /// Creates a new `OpenAIProvider` with the given configuration.
    #[inline]
    pub fn new(config: OpenAIConfig) -> Self {
        Self {
            client: Client::new(),
            config: Arc::new(config),
        }
    }

    /// Returns the configuration of this provider.
    #[inline]
    pub fn config(&self) -> &OpenAIConfig {
        &self.config
    }
}

impl ModelProvider for OpenAIProvider {
    type Error = Error;

    fn send_request(
        &self,
        req: &ModelRequest,
    ) -> impl Future<Output = Result<ModelResponse, Self::Error>> + Send + 'static
    {
        let openai_req = proto::create_request(req, &self.config);
        let resp_fut = self
            .client
            .post(format!("{}{}", self.config.base_url, "/chat/completions"))
            .header(
                header::AUTHORIZATION,
                format!("Bearer {}", self.config.api_key),
            )
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::ACCEPT, "application/json")
            .timeout(self.config.timeout)
            .json(&openai_req)
            .send();

        async move {
            let resp = resp_fut.await.map_err(|err| {
                let message = if err.is_timeout() {
                    format!("request timed out: {err}")
                } else {
                    format!("{err}")
                };
                Error::new(message, ErrorKind::Other)
            })?;

            let status = resp.status();
            if !status.is_success() {
                let body = resp.text().await.unwrap_or_default();
                return Err(status_error(status, &body));
            }

            let content_type = resp
                .headers()
                .get(header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .map(ToOwned::to_owned);
            if let Some(content_type) = &content_type {
                let is_json = content_type
                    .parse::<Mime>()
                    .map(|m| m.subtype() == mime::JSON)
                    .unwrap_or(false);
                if !is_json {
                    return Err(Error::new(
                        format!("Unexpected content type: {content_type}"),
                        ErrorKind::InvalidResponse,
                    ));
                }
            }

            let body = resp
                .bytes()
                .await
                .map_err(|err| Error::new(format!("{err}"), ErrorKind::Other))?;
            let completion = serde_json::from_slice::<ChatCompletion>(&body)
                .map_err(|err| {
                    Error::new(format!("{err}"), ErrorKind::InvalidResponse)
                })?;
            response::into_model_response(completion)
        }
    }
}

fn status_error(status: StatusCode, body: &str) -> Error {
    let kind = match status {
        StatusCode::TOO_MANY_REQUESTS => ErrorKind::RateLimitExceeded,
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            ErrorKind::Unauthorized
        }
        _ => ErrorKind::Other,
    };
    let detail = serde_json::from_str::<ErrorBody>(body)
        .map(|body| body.error.message)
        .unwrap_or_else(|_| body.trim().to_owned());
    debug!("request failed with {status}: {detail}");
    if detail.is_empty() {
        Error::new(format!("HTTP {status}"), kind)
    } else {
        Error::new(format!("HTTP {status}: {detail}"), kind)
    }
}
