use std::fmt;
use std::time::Duration;

use anyhow::{anyhow, Context};
use async_trait::async_trait;
use hk_core::{Completion, Result, SummaryBackend};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{preview, summary_prompt, TEMPERATURE};

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: String,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Serialize)]
struct GenerateOptions {
    temperature: f32,
    num_predict: u32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: Option<String>,
    #[serde(default)]
    prompt_eval_count: u64,
    #[serde(default)]
    eval_count: u64,
}

/// Ollama-style generation endpoint running next to the service.
pub struct LocalModel {
    client: Client,
    endpoint: String,
    model: String,
}

impl LocalModel {
    pub fn new(endpoint: &str, model: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
            model: model.to_string(),
        })
    }
}

impl fmt::Debug for LocalModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalModel")
            .field("client", &"<reqwest::Client>")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .finish()
    }
}

#[async_trait]
impl SummaryBackend for LocalModel {
    fn name(&self) -> &str {
        "local"
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn complete(&self, text: &str, max_words: u32) -> anyhow::Result<Completion> {
        let request = GenerateRequest {
            model: &self.model,
            prompt: summary_prompt(text, max_words),
            stream: false,
            options: GenerateOptions {
                temperature: TEMPERATURE,
                num_predict: max_words.saturating_mul(10),
            },
        };
        debug!("Local LLM request to {} ({} chars of content)", self.endpoint, text.len());

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .context("local LLM request failed")?;

        let status = response.status();
        let body = response.text().await.context("reading local LLM response")?;
        if !status.is_success() {
            return Err(anyhow!("local LLM returned {}: {}", status, preview(&body, 500)));
        }
        debug!("Local LLM response: {}", preview(&body, 200));

        let parsed: GenerateResponse = serde_json::from_str(&body)
            .with_context(|| format!("malformed local LLM response: {}", preview(&body, 500)))?;
        let text = parsed
            .response
            .filter(|r| !r.is_empty())
            .ok_or_else(|| anyhow!("no response text received from local LLM"))?;

        Ok(Completion {
            text,
            token_count: parsed.prompt_eval_count + parsed.eval_count,
        })
    }
}
