use std::fmt;

use hk_core::{Error, Result};

pub mod models;
pub mod summarizer;

pub use models::{create_backend, is_loopback, BackendConfig, UnconfiguredModel};
pub use summarizer::{cache_key, SummarizationClient, SUMMARY_CACHE_TTL};

/// LLM settings as they arrive from flags and environment.
#[derive(Clone, Default)]
pub struct LlmConfig {
    pub api_endpoint: String,
    pub base_url: Option<String>,
    pub model: String,
    pub api_key: Option<String>,
    pub thinking_tag: Option<String>,
}

impl fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LlmConfig")
            .field("api_endpoint", &self.api_endpoint)
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_deref().map(|_| "<redacted>"))
            .field("thinking_tag", &self.thinking_tag)
            .finish()
    }
}

impl LlmConfig {
    pub fn is_local(&self) -> bool {
        is_loopback(&self.api_endpoint) || self.base_url.as_deref().is_some_and(is_loopback)
    }

    /// Picks the wire protocol. A remote backend needs an API key.
    pub fn backend_config(&self) -> Result<BackendConfig> {
        if self.api_endpoint.trim().is_empty() {
            return Err(Error::InvalidArgument("LLM API endpoint is required".to_string()));
        }
        if self.model.trim().is_empty() {
            return Err(Error::InvalidArgument("LLM model is required".to_string()));
        }

        if self.is_local() {
            return Ok(BackendConfig::Local {
                endpoint: self.api_endpoint.clone(),
                model: self.model.clone(),
                timeout: models::LOCAL_TIMEOUT,
            });
        }

        let api_key = self
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| Error::InvalidArgument("LLM API key is required for a remote endpoint".to_string()))?;
        Ok(BackendConfig::Remote {
            endpoint: self.api_endpoint.clone(),
            model: self.model.clone(),
            api_key,
            timeout: models::REMOTE_TIMEOUT,
        })
    }
}

pub mod prelude {
    pub use super::models::create_backend;
    pub use super::{BackendConfig, LlmConfig, SummarizationClient};
    pub use hk_core::{Error, Result, SummarizedContent};
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(endpoint: &str) -> LlmConfig {
        LlmConfig {
            api_endpoint: endpoint.to_string(),
            model: "llama3".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_local_endpoint_needs_no_key() {
        let backend = config("http://localhost:11434/api/generate").backend_config().unwrap();
        assert!(matches!(backend, BackendConfig::Local { .. }));
    }

    #[test]
    fn test_base_url_marks_local() {
        let mut config = config("http://ollama.internal:11434/api/generate");
        config.base_url = Some("http://127.0.0.1:11434".to_string());
        assert!(config.is_local());
    }

    #[test]
    fn test_remote_requires_key() {
        let mut config = config("https://api.openai.com/v1/chat/completions");
        assert!(matches!(config.backend_config(), Err(Error::InvalidArgument(_))));

        config.api_key = Some("sk-live".to_string());
        match config.backend_config().unwrap() {
            BackendConfig::Remote { api_key, timeout, .. } => {
                assert_eq!(api_key, "sk-live");
                assert_eq!(timeout, models::REMOTE_TIMEOUT);
            }
            other => panic!("expected remote backend, got {:?}", other),
        }
        assert!(!format!("{:?}", config).contains("sk-live"));
    }

    #[test]
    fn test_missing_endpoint_or_model() {
        assert!(config("").backend_config().is_err());
        let mut config = config("http://localhost:11434/api/generate");
        config.model.clear();
        assert!(config.backend_config().is_err());
    }
}
