use std::sync::Arc;
use std::time::Duration;

use hk_core::{Result, SummaryBackend};
use url::Url;

pub mod local;
pub mod remote;
pub mod unconfigured;

pub use local::LocalModel;
pub use remote::RemoteModel;
pub use unconfigured::UnconfiguredModel;

pub const SYSTEM_PROMPT: &str = "You are a helpful assistant that provides concise summaries.";
pub const TEMPERATURE: f32 = 0.3;
pub const LOCAL_TIMEOUT: Duration = Duration::from_secs(120);
pub const REMOTE_TIMEOUT: Duration = Duration::from_secs(60);

/// Wire protocol chosen once at startup.
#[derive(Clone, PartialEq)]
pub enum BackendConfig {
    /// Ollama-style `/api/generate` server on this machine
    Local {
        endpoint: String,
        model: String,
        timeout: Duration,
    },
    /// OpenAI-compatible chat completions with bearer auth
    Remote {
        endpoint: String,
        model: String,
        api_key: String,
        timeout: Duration,
    },
}

impl std::fmt::Debug for BackendConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Local { endpoint, model, timeout } => f
                .debug_struct("Local")
                .field("endpoint", endpoint)
                .field("model", model)
                .field("timeout", timeout)
                .finish(),
            Self::Remote { endpoint, model, timeout, .. } => f
                .debug_struct("Remote")
                .field("endpoint", endpoint)
                .field("model", model)
                .field("api_key", &"<redacted>")
                .field("timeout", timeout)
                .finish(),
        }
    }
}

pub fn create_backend(config: &BackendConfig) -> Result<Arc<dyn SummaryBackend>> {
    match config {
        BackendConfig::Local { endpoint, model, timeout } => {
            Ok(Arc::new(LocalModel::new(endpoint, model, *timeout)?))
        }
        BackendConfig::Remote { endpoint, model, api_key, timeout } => {
            Ok(Arc::new(RemoteModel::new(endpoint, model, api_key, *timeout)?))
        }
    }
}

/// True when `endpoint` parses as a URL whose host is the local machine.
pub fn is_loopback(endpoint: &str) -> bool {
    let Ok(url) = Url::parse(endpoint) else {
        return false;
    };
    matches!(
        url.host_str(),
        Some("localhost") | Some("127.0.0.1") | Some("[::1]") | Some("::1")
    )
}

pub fn summary_prompt(text: &str, max_words: u32) -> String {
    format!(
        "Summarize the following in {} words or fewer:\n\n{}",
        max_words, text
    )
}

/// First `max_chars` characters of a payload, for log lines.
pub fn preview(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_loopback() {
        assert!(is_loopback("http://localhost:11434/api/generate"));
        assert!(is_loopback("http://127.0.0.1:11434/api/generate"));
        assert!(is_loopback("http://[::1]:11434/api/generate"));
        assert!(!is_loopback("https://api.openai.com/v1/chat/completions"));
        // Substring matches are not enough.
        assert!(!is_loopback("https://localhost.example.com/v1"));
        assert!(!is_loopback(""));
        assert!(!is_loopback("not a url"));
    }

    #[test]
    fn test_prompt_and_preview() {
        assert_eq!(
            summary_prompt("Some text", 100),
            "Summarize the following in 100 words or fewer:\n\nSome text"
        );
        assert_eq!(preview("abcdef", 3), "abc...");
        assert_eq!(preview("abc", 3), "abc");
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let config = BackendConfig::Remote {
            endpoint: "https://api.example.com/v1/chat/completions".into(),
            model: "gpt".into(),
            api_key: "sk-secret".into(),
            timeout: REMOTE_TIMEOUT,
        };
        let debug = format!("{:?}", config);
        assert!(debug.contains("<redacted>"));
        assert!(!debug.contains("sk-secret"));
    }

    #[test]
    fn test_create_backend_picks_protocol() {
        let local = create_backend(&BackendConfig::Local {
            endpoint: "http://localhost:11434/api/generate".into(),
            model: "llama3".into(),
            timeout: LOCAL_TIMEOUT,
        })
        .unwrap();
        assert_eq!(local.name(), "local");
        assert_eq!(local.model(), "llama3");

        let remote = create_backend(&BackendConfig::Remote {
            endpoint: "https://api.example.com/v1/chat/completions".into(),
            model: "gpt".into(),
            api_key: "sk".into(),
            timeout: REMOTE_TIMEOUT,
        })
        .unwrap();
        assert_eq!(remote.name(), "remote");
    }
}
