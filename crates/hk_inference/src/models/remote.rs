use std::fmt;
use std::time::Duration;

use anyhow::{anyhow, Context};
use async_trait::async_trait;
use hk_core::{Completion, Result, SummaryBackend};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{preview, summary_prompt, SYSTEM_PROMPT, TEMPERATURE};

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: String,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
    usage: Usage,
}

#[derive(Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Deserialize)]
struct Message {
    content: String,
}

#[derive(Deserialize)]
struct Usage {
    total_tokens: u64,
}

/// OpenAI-compatible chat completions API.
pub struct RemoteModel {
    client: Client,
    api_key: String,
    endpoint: String,
    model: String,
}

impl RemoteModel {
    pub fn new(endpoint: &str, model: &str, api_key: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            api_key: api_key.to_string(),
            endpoint: endpoint.to_string(),
            model: model.to_string(),
        })
    }
}

impl fmt::Debug for RemoteModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteModel")
            .field("client", &"<reqwest::Client>")
            .field("api_key", &"<redacted>")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .finish()
    }
}

#[async_trait]
impl SummaryBackend for RemoteModel {
    fn name(&self) -> &str {
        "remote"
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn complete(&self, text: &str, max_words: u32) -> anyhow::Result<Completion> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: summary_prompt(text, max_words),
                },
            ],
            max_tokens: max_words.saturating_mul(2),
            temperature: TEMPERATURE,
        };
        debug!("Remote LLM request to {} ({} chars of content)", self.endpoint, text.len());

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .context("remote LLM request failed")?;

        let status = response.status();
        let body = response.text().await.context("reading remote LLM response")?;
        if !status.is_success() {
            return Err(anyhow!("remote LLM returned {}: {}", status, preview(&body, 500)));
        }

        let parsed: ChatResponse = serde_json::from_str(&body)
            .with_context(|| format!("malformed remote LLM response: {}", preview(&body, 500)))?;
        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("remote LLM returned no choices"))?;

        Ok(Completion {
            text: choice.message.content,
            token_count: parsed.usage.total_tokens,
        })
    }
}
