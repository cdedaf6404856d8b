use std::sync::Arc;

use hk_core::{until_cancelled, ArticleContent, CancellationToken, Error, Result};
use lazy_static::lazy_static;
use regex::Regex;
use reqwest::{header, Client};
use tracing::{debug, error, warn};

use crate::limiter::ConcurrencyLimiter;
use crate::scrapers::ScraperConfig;

pub mod content;

pub use content::extract_main_content;

const ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";

lazy_static! {
    static ref HTTP_URL: Regex = Regex::new(r"(?i)^https?://.+").unwrap();
}

enum FetchOutcome {
    Html(String),
    Unsupported(String),
}

/// Fetches linked articles and reduces them to readable text.
///
/// Ordinary failures (bad URL, network errors, non-HTML pages, empty pages,
/// a saturated fetch ceiling) come back as `success = false` content rather
/// than as errors.
#[derive(Debug, Clone)]
pub struct ArticleExtractor {
    client: Client,
    limiter: Arc<ConcurrencyLimiter>,
}

impl ArticleExtractor {
    pub fn new(config: &ScraperConfig, limiter: Arc<ConcurrencyLimiter>) -> Result<Self> {
        Ok(Self::with_client(config.http_client()?, limiter))
    }

    pub fn with_client(client: Client, limiter: Arc<ConcurrencyLimiter>) -> Self {
        Self { client, limiter }
    }

    pub fn limiter(&self) -> &ConcurrencyLimiter {
        &self.limiter
    }

    pub async fn extract(&self, url: &str, cancel: &CancellationToken) -> ArticleContent {
        if !HTTP_URL.is_match(url) {
            warn!("Invalid URL format: {}", url);
            return ArticleContent::failed("Invalid URL provided");
        }

        let _permit = match self.limiter.try_acquire() {
            Ok(permit) => permit,
            Err(e) => {
                warn!("Rejecting article fetch for {}: {}", url, e);
                return ArticleContent::failed(e.to_string());
            }
        };

        debug!("Fetching article from {}", url);
        match until_cancelled(cancel, self.fetch(url)).await {
            Ok(FetchOutcome::Html(html)) => {
                let text = extract_main_content(&html);
                if text.is_empty() {
                    warn!("No content extracted from {}", url);
                    return ArticleContent::failed(format!(
                        "Unable to extract content from {}. The page might be protected or require authentication.",
                        url
                    ));
                }
                debug!("Extracted {} characters from {}", text.chars().count(), url);
                ArticleContent::extracted(text)
            }
            Ok(FetchOutcome::Unsupported(content_type)) => {
                warn!("Non-HTML content type from {}: {}", url, content_type);
                ArticleContent::failed(format!(
                    "Content from {} is not HTML (content type: {})",
                    url, content_type
                ))
            }
            Err(Error::Cancelled) => ArticleContent::failed(Error::Cancelled.to_string()),
            Err(e) => {
                error!("Failed to fetch content from {}: {}", url, e);
                ArticleContent::failed(format!("Unable to fetch content from {}", url))
            }
        }
    }

    async fn fetch(&self, url: &str) -> Result<FetchOutcome> {
        let response = self
            .client
            .get(url)
            .header(header::ACCEPT, ACCEPT)
            .header(header::ACCEPT_LANGUAGE, "en-US,en;q=0.5")
            .send()
            .await?
            .error_for_status()?;

        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_ascii_lowercase();
        if !(content_type.contains("text/html") || content_type.contains("application/xhtml+xml")) {
            return Ok(FetchOutcome::Unsupported(content_type));
        }

        Ok(FetchOutcome::Html(response.text().await?))
    }
}
