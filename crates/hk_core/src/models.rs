use std::fmt;

use async_trait::async_trait;

/// Raw output of one backend call, before any post-processing.
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub text: String,
    pub token_count: u64,
}

#[async_trait]
pub trait SummaryBackend: Send + Sync + fmt::Debug {
    /// Short label used in logs ("local", "remote", ...)
    fn name(&self) -> &str;

    /// Model identifier sent with every request
    fn model(&self) -> &str;

    /// Endpoint the requests go to
    fn endpoint(&self) -> &str;

    /// Ask the backend for a summary of `text` in at most `max_words` words.
    ///
    /// Errors carry backend detail and must never reach end users; the
    /// summarization client logs them and reports an opaque failure.
    async fn complete(&self, text: &str, max_words: u32) -> anyhow::Result<Completion>;
}
