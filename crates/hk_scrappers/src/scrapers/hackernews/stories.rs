use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use hk_core::{until_cancelled, CacheStore, CancellationToken, Error, ForumSource, Result, Thread};
use tracing::{debug, error, info, warn};

pub const MAX_TOP_STORIES: u32 = 30;
pub const STORIES_CACHE_TTL: Duration = Duration::from_secs(5 * 60);

pub type StoriesCache = Arc<dyn CacheStore<u32, Vec<Thread>>>;

pub struct TopStories {
    source: Arc<dyn ForumSource>,
    cache: StoriesCache,
}

impl TopStories {
    pub fn new(source: Arc<dyn ForumSource>, cache: StoriesCache) -> Self {
        Self { source, cache }
    }

    /// The first `count` front-page stories, in ranking order. Stories that
    /// fail to load are left out.
    pub async fn fetch(&self, count: u32, cancel: &CancellationToken) -> Result<Vec<Thread>> {
        if !(1..=MAX_TOP_STORIES).contains(&count) {
            return Err(Error::InvalidArgument(format!(
                "Number of stories must be between 1 and {}",
                MAX_TOP_STORIES
            )));
        }

        if let Some(threads) = self.cache.get(&count).await {
            debug!("Returning {} cached top stories", threads.len());
            return Ok(threads);
        }

        let ids = match until_cancelled(cancel, self.source.top_story_ids()).await {
            Ok(ids) => ids,
            Err(Error::Cancelled) => return Err(Error::Cancelled),
            Err(e) => {
                error!("Failed to fetch top stories: {}", e);
                return Err(Error::RetrievalFailed("Failed to fetch top stories".to_string()));
            }
        };

        let requested = ids.len().min(count as usize);
        let fetches = ids.into_iter().take(count as usize).map(|id| async move {
            match until_cancelled(cancel, self.source.item(id)).await {
                Ok(item) => Some(Thread::from(item)),
                Err(e) => {
                    warn!("Failed to fetch story {}: {}", id, e);
                    None
                }
            }
        });
        let threads: Vec<Thread> = join_all(fetches).await.into_iter().flatten().collect();

        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }
        info!("📰 Fetched {} top stories", threads.len());

        // A partial list would hide the failed stories until the entry expires.
        if threads.len() == requested {
            self.cache.set(count, threads.clone(), STORIES_CACHE_TTL).await;
        }
        Ok(threads)
    }
}
