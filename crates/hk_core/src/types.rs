use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Raw record returned by `GET /item/{id}`, shared by stories and comments.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Item {
    pub id: u64,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub by: Option<String>,
    #[serde(default)]
    pub time: Option<i64>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub parent: Option<u64>,
    #[serde(default)]
    pub kids: Vec<u64>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub score: Option<i64>,
    #[serde(default)]
    pub descendants: Option<u64>,
    #[serde(default)]
    pub deleted: bool,
    #[serde(default)]
    pub dead: bool,
}

fn timestamp(secs: Option<i64>) -> DateTime<Utc> {
    secs.and_then(|s| DateTime::from_timestamp(s, 0))
        .unwrap_or(DateTime::UNIX_EPOCH)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Thread {
    pub id: u64,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub score: i64,
    pub author: String,
    pub created_at: DateTime<Utc>,
    pub descendant_count: u64,
    pub child_ids: Vec<u64>,
}

impl From<Item> for Thread {
    fn from(item: Item) -> Self {
        Self {
            id: item.id,
            title: item.title.unwrap_or_default(),
            url: item.url.filter(|u| !u.is_empty()),
            score: item.score.unwrap_or_default(),
            author: item.by.unwrap_or_default(),
            created_at: timestamp(item.time),
            descendant_count: item.descendants.unwrap_or_default(),
            child_ids: item.kids,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: u64,
    pub text: String,
    pub author: String,
    pub created_at: DateTime<Utc>,
    pub parent_id: u64,
    pub child_ids: Vec<u64>,
    pub depth: u32,
}

impl Comment {
    /// Builds a comment at `depth`, or `None` when the entry has no text
    /// (deleted comments come back without it).
    pub fn from_item(item: Item, depth: u32) -> Option<Self> {
        let text = item.text.filter(|t| !t.trim().is_empty())?;
        Some(Self {
            id: item.id,
            text,
            author: item.by.unwrap_or_default(),
            created_at: timestamp(item.time),
            parent_id: item.parent.unwrap_or_default(),
            child_ids: item.kids,
            depth,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleContent {
    pub text: String,
    pub fetched_at: DateTime<Utc>,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ArticleContent {
    pub fn extracted(text: String) -> Self {
        Self {
            text,
            fetched_at: Utc::now(),
            success: true,
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            text: String::new(),
            fetched_at: Utc::now(),
            success: false,
            error: Some(error.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummarizedContent {
    pub summary: String,
    pub summary_generated_at: DateTime<Utc>,
    pub token_count: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_content: Option<String>,
}

impl SummarizedContent {
    /// A summary that did not involve a backend call.
    pub fn placeholder(summary: String, include_original: bool) -> Self {
        Self {
            summary,
            summary_generated_at: Utc::now(),
            token_count: 0,
            original_content: include_original.then(String::new),
        }
    }
}

fn default_summary_length() -> u32 {
    200
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryRequest {
    pub num_stories: u32,
    pub num_comments_per_story: u32,
    #[serde(default = "default_summary_length")]
    pub max_summary_length: u32,
    #[serde(default)]
    pub include_original_content: bool,
}

impl SummaryRequest {
    pub const STORIES: (u32, u32) = (1, 10);
    pub const COMMENTS: (u32, u32) = (0, 20);
    pub const SUMMARY_WORDS: (u32, u32) = (50, 500);

    pub fn validate(&self) -> Result<()> {
        check_range("numStories", self.num_stories, Self::STORIES)?;
        check_range("numCommentsPerStory", self.num_comments_per_story, Self::COMMENTS)?;
        check_range("maxSummaryLength", self.max_summary_length, Self::SUMMARY_WORDS)
    }
}

fn check_range(field: &str, value: u32, (min, max): (u32, u32)) -> Result<()> {
    if value < min || value > max {
        return Err(Error::InvalidArgument(format!(
            "{} must be between {} and {}",
            field, min, max
        )));
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummarizedThread {
    #[serde(flatten)]
    pub thread: Thread,
    pub article_summary: SummarizedContent,
    pub comments_summary: SummarizedContent,
    pub comments: Vec<Comment>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DigestMeta {
    pub fetched_at: DateTime<Utc>,
    pub processing_time_ms: u64,
    pub stories_retrieved: usize,
    pub total_comments_retrieved: usize,
    pub total_tokens_used: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Digest {
    pub stories: Vec<SummarizedThread>,
    pub meta: DigestMeta,
}
