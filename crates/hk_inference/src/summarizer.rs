use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use hk_core::{until_cancelled, CacheStore, CancellationToken, Error, Result, SummarizedContent, SummaryBackend};
use regex::Regex;
use sha2::{Digest, Sha256};
use tracing::{debug, error, info};

use crate::models::preview;

pub const SUMMARY_CACHE_TTL: Duration = Duration::from_secs(24 * 60 * 60);

pub type SummaryCache = Arc<dyn CacheStore<String, SummarizedContent>>;

/// Content-addressed key for one summary request.
pub fn cache_key(text: &str, max_words: u32, include_original: bool) -> String {
    let mut hasher = Sha256::new();
    hasher.update(format!("{}{}{}", text, max_words, include_original).as_bytes());
    format!("summary-{}", hex::encode(hasher.finalize()))
}

/// Length-bounded summaries from the configured backend, cached for a day.
pub struct SummarizationClient {
    backend: Arc<dyn SummaryBackend>,
    cache: SummaryCache,
    thinking_tag: Option<Regex>,
}

impl SummarizationClient {
    pub fn new(backend: Arc<dyn SummaryBackend>, cache: SummaryCache, thinking_tag: Option<&str>) -> Self {
        let thinking_tag = thinking_tag
            .map(str::trim)
            .filter(|tag| !tag.is_empty())
            .and_then(|tag| {
                let tag = regex::escape(tag);
                Regex::new(&format!("(?s)<{tag}>.*?</{tag}>")).ok()
            });
        Self {
            backend,
            cache,
            thinking_tag,
        }
    }

    pub fn backend(&self) -> &dyn SummaryBackend {
        self.backend.as_ref()
    }

    pub async fn summarize(
        &self,
        text: &str,
        max_words: u32,
        include_original: bool,
        cancel: &CancellationToken,
    ) -> Result<SummarizedContent> {
        let key = cache_key(text, max_words, include_original);
        if let Some(summary) = self.cache.get(&key).await {
            debug!("Returning cached summary {}", key);
            return Ok(summary);
        }

        debug!(
            "Summarizing {} chars with {} backend: {}",
            text.len(),
            self.backend.name(),
            preview(text, 100)
        );
        let completion = until_cancelled(cancel, async {
            self.backend.complete(text, max_words).await.map_err(|e| {
                error!(
                    "LLM request failed (endpoint: {}, model: {}, backend: {}): {:#}",
                    self.backend.endpoint(),
                    self.backend.model(),
                    self.backend.name(),
                    e
                );
                debug!("Failed request content: {}", preview(text, 200));
                Error::SummarizationFailed
            })
        })
        .await?;

        let summary = self.strip_thinking(&completion.text);
        if summary.is_empty() {
            error!(
                "LLM returned no usable text (endpoint: {}, model: {}): {}",
                self.backend.endpoint(),
                self.backend.model(),
                preview(&completion.text, 200)
            );
            return Err(Error::SummarizationFailed);
        }

        let summary = SummarizedContent {
            summary,
            summary_generated_at: Utc::now(),
            token_count: completion.token_count,
            original_content: include_original.then(|| text.to_string()),
        };
        info!("🤖 Generated summary using {} tokens", summary.token_count);

        self.cache.set(key, summary.clone(), SUMMARY_CACHE_TTL).await;
        Ok(summary)
    }

    fn strip_thinking(&self, raw: &str) -> String {
        match &self.thinking_tag {
            Some(re) => re.replace_all(raw, "").trim().to_string(),
            None => raw.trim().to_string(),
        }
    }
}
