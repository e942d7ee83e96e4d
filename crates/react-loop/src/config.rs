use std::env;
use std::fmt::{self, Debug, Formatter};

use react_loop_openai_model::{OpenAIConfig, OpenAIConfigBuilder, OpenAIProvider};
use thiserror::Error;

/// Environment variable holding the OpenRouter API key.
pub const API_KEY_VAR: &str = "OPENROUTER_API_KEY";
/// Environment variable overriding the model name.
pub const MODEL_VAR: &str = "OPENROUTER_MODEL";
/// Environment variable overriding the API base URL.
pub const BASE_URL_VAR: &str = "OPENROUTER_BASE_URL";

/// Errors raised while loading [`Config`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No API key was configured.
    #[error("missing API key, set {API_KEY_VAR} or pass --api-key")]
    MissingApiKey,
}

/// Connection settings of the model provider.
#[derive(Clone, PartialEq)]
pub struct Config {
    api_key: String,
    model: Option<String>,
    base_url: Option<String>,
    max_tokens: Option<u32>,
}

impl Config {
    /// Reads the configuration from the environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_parts(
            env::var(API_KEY_VAR).ok(),
            env::var(MODEL_VAR).ok(),
            env::var(BASE_URL_VAR).ok(),
        )
    }

    /// Builds the configuration from optional values. Blank values count as
    /// missing.
    pub fn from_parts(
        api_key: Option<String>,
        model: Option<String>,
        base_url: Option<String>,
    ) -> Result<Self, ConfigError> {
        let api_key = non_blank(api_key).ok_or(ConfigError::MissingApiKey)?;
        Ok(Self {
            api_key,
            model: non_blank(model),
            base_url: non_blank(base_url),
            max_tokens: None,
        })
    }

    /// Sets the upper bound of generated tokens per completion.
    #[inline]
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Returns the provider configuration.
    pub fn openai_config(&self) -> OpenAIConfig {
        let mut builder = OpenAIConfigBuilder::with_api_key(&self.api_key);
        if let Some(model) = &self.model {
            builder = builder.with_model(model);
        }
        if let Some(base_url) = &self.base_url {
            builder = builder.with_base_url(base_url);
        }
        if let Some(max_tokens) = self.max_tokens {
            builder = builder.with_max_tokens(max_tokens);
        }
        builder.build()
    }

    /// Creates the model provider.
    #[inline]
    pub fn provider(&self) -> OpenAIProvider {
        OpenAIProvider::new(self.openai_config())
    }
}

impl Debug for Config {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("api_key", &"<deducted>")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

#[inline]
fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_api_key() {
        assert!(matches!(
            Config::from_parts(None, None, None),
            Err(ConfigError::MissingApiKey)
        ));
        assert!(matches!(
            Config::from_parts(Some("  ".to_owned()), None, None),
            Err(ConfigError::MissingApiKey)
        ));
    }

    #[test]
    fn test_defaults_and_overrides() {
        let config = Config::from_parts(Some("sk-test".to_owned()), None, None)
            .unwrap()
            .openai_config();
        assert_eq!(config.model(), "openai/gpt-4-turbo-preview");
        assert_eq!(config.base_url(), "https://openrouter.ai/api/v1");

        let config = Config::from_parts(
            Some("sk-test".to_owned()),
            Some("anthropic/claude-3-haiku".to_owned()),
            Some("http://localhost:8080/v1/".to_owned()),
        )
        .unwrap()
        .openai_config();
        assert_eq!(config.model(), "anthropic/claude-3-haiku");
        assert_eq!(config.base_url(), "http://localhost:8080/v1");
    }

    #[test]
    fn test_debug_hides_api_key() {
        let config =
            Config::from_parts(Some("sk-secret".to_owned()), None, None).unwrap();
        let debug = format!("{config:?}");
        assert!(!debug.contains("sk-secret"));
    }
}
