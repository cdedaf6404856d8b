use clap::Subcommand;
use hk_core::{CancellationToken, Result, SummaryRequest};
use serde::Serialize;

use crate::manager::DigestManager;

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum ScraperCommands {
    /// List the current front-page stories
    Stories {
        #[arg(long, default_value_t = 10)]
        count: u32,
    },
    /// Walk a story's comment tree in reading order
    Comments {
        /// Story id
        id: u64,
        #[arg(long, default_value_t = 10)]
        max: usize,
    },
    /// Extract the readable text of an article
    Article { url: String },
    /// Summarize a block of text with the configured backend
    SummarizeText {
        text: String,
        #[arg(long, default_value_t = 200)]
        max_words: u32,
        #[arg(long)]
        include_original: bool,
    },
    /// Build a digest of the top stories with article and comment summaries
    Summarize {
        #[arg(long, default_value_t = 5)]
        stories: u32,
        #[arg(long, default_value_t = 10)]
        comments: u32,
        #[arg(long, default_value_t = 200)]
        max_words: u32,
        #[arg(long)]
        include_original: bool,
    },
}

impl ScraperCommands {
    /// Whether the command calls the summarization backend.
    pub fn needs_llm(&self) -> bool {
        matches!(self, Self::SummarizeText { .. } | Self::Summarize { .. })
    }
}

pub async fn handle_command(
    command: ScraperCommands,
    manager: &DigestManager,
    cancel: &CancellationToken,
) -> Result<()> {
    match command {
        ScraperCommands::Stories { count } => {
            let stories = manager.stories().fetch(count, cancel).await?;
            print_json(&stories)
        }
        ScraperCommands::Comments { id, max } => {
            let comments = manager.comments().retrieve(id, max, cancel).await?;
            print_json(&comments)
        }
        ScraperCommands::Article { url } => {
            let article = manager.extractor().extract(&url, cancel).await;
            if !article.success {
                eprintln!("⚠️  {}", article.error.as_deref().unwrap_or("extraction failed"));
            }
            print_json(&article)
        }
        ScraperCommands::SummarizeText { text, max_words, include_original } => {
            let summary = manager
                .summarizer()
                .summarize(&text, max_words, include_original, cancel)
                .await?;
            print_json(&summary)
        }
        ScraperCommands::Summarize { stories, comments, max_words, include_original } => {
            let request = SummaryRequest {
                num_stories: stories,
                num_comments_per_story: comments,
                max_summary_length: max_words,
                include_original_content: include_original,
            };
            let digest = manager.digest(&request, cancel).await?;
            print_json(&digest)
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
