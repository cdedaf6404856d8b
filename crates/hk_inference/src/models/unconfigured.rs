use std::fmt;

use async_trait::async_trait;
use hk_core::{Completion, SummaryBackend};

/// Stand-in for commands that never summarize; every call fails.
pub struct UnconfiguredModel;

impl fmt::Debug for UnconfiguredModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UnconfiguredModel").finish()
    }
}

#[async_trait]
impl SummaryBackend for UnconfiguredModel {
    fn name(&self) -> &str {
        "unconfigured"
    }

    fn model(&self) -> &str {
        ""
    }

    fn endpoint(&self) -> &str {
        ""
    }

    async fn complete(&self, _text: &str, _max_words: u32) -> anyhow::Result<Completion> {
        anyhow::bail!("no LLM backend configured (set LLM_API_ENDPOINT and LLM_MODEL)")
    }
}
