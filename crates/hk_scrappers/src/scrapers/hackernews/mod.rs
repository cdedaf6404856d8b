use async_trait::async_trait;
use hk_core::{Error, ForumSource, Item, Result};
use reqwest::Client;
use tracing::debug;

use crate::scrapers::ScraperConfig;

pub mod comments;
pub mod stories;

pub use comments::CommentTreeRetriever;
pub use stories::TopStories;

/// Firebase-backed Hacker News API client.
#[derive(Debug, Clone)]
pub struct HackerNewsClient {
    client: Client,
    base_url: String,
}

impl HackerNewsClient {
    pub const BASE_URL: &'static str = "https://hacker-news.firebaseio.com/v0";

    pub fn new(config: &ScraperConfig) -> Result<Self> {
        Ok(Self::with_client(config.http_client()?, &config.hn_base_url))
    }

    pub fn with_client(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl ForumSource for HackerNewsClient {
    async fn top_story_ids(&self) -> Result<Vec<u64>> {
        let url = format!("{}/topstories.json", self.base_url);
        debug!("Fetching top story ids from {}", url);
        let ids = self
            .client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json::<Vec<u64>>()
            .await?;
        Ok(ids)
    }

    async fn item(&self, id: u64) -> Result<Item> {
        let url = format!("{}/item/{}.json", self.base_url, id);
        // The API answers `null` for ids it does not know.
        self.client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json::<Option<Item>>()
            .await?
            .ok_or_else(|| Error::NotFound(format!("item {}", id)))
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::collections::{HashMap, HashSet};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// In-memory forum with a call log and optionally failing ids.
    #[derive(Default)]
    pub struct MockForum {
        pub items: HashMap<u64, Item>,
        pub top: Vec<u64>,
        pub failing: HashSet<u64>,
        pub calls: AtomicUsize,
        pub fetched: Mutex<Vec<u64>>,
    }

    impl MockForum {
        pub fn story(mut self, id: u64, kids: &[u64]) -> Self {
            self.top.push(id);
            self.items.insert(id, Item {
                id,
                kind: Some("story".into()),
                title: Some(format!("Story {}", id)),
                by: Some("pg".into()),
                kids: kids.to_vec(),
                ..Default::default()
            });
            self
        }

        pub fn comment(mut self, id: u64, parent: u64, kids: &[u64]) -> Self {
            self.items.insert(id, Item {
                id,
                kind: Some("comment".into()),
                text: Some(format!("comment {}", id)),
                by: Some("dang".into()),
                parent: Some(parent),
                kids: kids.to_vec(),
                ..Default::default()
            });
            self
        }

        pub fn deleted(mut self, id: u64, parent: u64, kids: &[u64]) -> Self {
            self.items.insert(id, Item {
                id,
                parent: Some(parent),
                kids: kids.to_vec(),
                deleted: true,
                ..Default::default()
            });
            self
        }

        pub fn failing(mut self, id: u64) -> Self {
            self.failing.insert(id);
            self
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        pub fn fetched(&self) -> Vec<u64> {
            self.fetched.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ForumSource for MockForum {
        async fn top_story_ids(&self) -> Result<Vec<u64>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.top.clone())
        }

        async fn item(&self, id: u64) -> Result<Item> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.fetched.lock().unwrap().push(id);
            if self.failing.contains(&id) {
                return Err(Error::Backend(format!("connection reset fetching {}", id)));
            }
            self.items
                .get(&id)
                .cloned()
                .ok_or_else(|| Error::NotFound(format!("item {}", id)))
        }
    }
}
