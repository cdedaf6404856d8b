use std::sync::Arc;
use std::time::Duration;

use async_recursion::async_recursion;
use hk_core::{until_cancelled, CacheStore, CancellationToken, Comment, Error, ForumSource, Result};
use tracing::{debug, error, info, warn};

pub const MAX_COMMENTS: usize = 50;
pub const COMMENT_CACHE_TTL: Duration = Duration::from_secs(15 * 60);

pub type CommentCache = Arc<dyn CacheStore<(u64, usize), Vec<Comment>>>;

/// Walks a story's reply tree in pre-order, collecting at most a fixed
/// number of readable comments.
pub struct CommentTreeRetriever {
    source: Arc<dyn ForumSource>,
    cache: CommentCache,
}

impl CommentTreeRetriever {
    pub fn new(source: Arc<dyn ForumSource>, cache: CommentCache) -> Self {
        Self { source, cache }
    }

    pub async fn retrieve(
        &self,
        thread_id: u64,
        max_comments: usize,
        cancel: &CancellationToken,
    ) -> Result<Vec<Comment>> {
        if max_comments > MAX_COMMENTS {
            return Err(Error::InvalidArgument(format!(
                "Number of comments must be between 0 and {}",
                MAX_COMMENTS
            )));
        }
        if max_comments == 0 {
            return Ok(Vec::new());
        }

        let key = (thread_id, max_comments);
        if let Some(comments) = self.cache.get(&key).await {
            debug!("Returning cached comments for story {}", thread_id);
            return Ok(comments);
        }

        let thread = match until_cancelled(cancel, self.source.item(thread_id)).await {
            Ok(thread) => thread,
            Err(Error::Cancelled) => return Err(Error::Cancelled),
            Err(e) => {
                error!("Failed to fetch comments for story {}: {}", thread_id, e);
                return Err(Error::RetrievalFailed(format!(
                    "Failed to fetch comments for story {}",
                    thread_id
                )));
            }
        };

        let mut comments = Vec::with_capacity(max_comments);
        self.walk(&thread.kids, 0, max_comments, &mut comments, cancel)
            .await?;
        info!("💬 Retrieved {} comments for story {}", comments.len(), thread_id);

        self.cache.set(key, comments.clone(), COMMENT_CACHE_TTL).await;
        Ok(comments)
    }

    /// Visits `ids` in source order, descending into each comment's replies
    /// before moving on to its next sibling. A textless comment is left out
    /// but its replies are still walked one level down. `out` is the only
    /// budget state; every fetch is preceded by a budget check.
    #[async_recursion]
    async fn walk(
        &self,
        ids: &[u64],
        depth: u32,
        budget: usize,
        out: &mut Vec<Comment>,
        cancel: &CancellationToken,
    ) -> Result<()> {
        for &id in ids {
            if out.len() >= budget {
                break;
            }

            let item = match until_cancelled(cancel, self.source.item(id)).await {
                Ok(item) => item,
                Err(Error::Cancelled) => return Err(Error::Cancelled),
                Err(e) => {
                    warn!("Failed to fetch comment {}: {}", id, e);
                    continue;
                }
            };

            let replies = item.kids.clone();
            match Comment::from_item(item, depth) {
                Some(comment) => out.push(comment),
                None => debug!("Skipping comment {} without text", id),
            }

            if out.len() < budget && !replies.is_empty() {
                self.walk(&replies, depth + 1, budget, out, cancel).await?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scrapers::hackernews::testing::MockForum;
    use hk_storage::MemoryCache;

    // 1
    // ├── 10
    // │   ├── 11
    // │   │   └── 12
    // │   └── 13
    // ├── 20 (deleted)
    // │   └── 21
    // └── 30
    //     └── 31
    fn forum() -> MockForum {
        MockForum::default()
            .story(1, &[10, 20, 30])
            .comment(10, 1, &[11, 13])
            .comment(11, 10, &[12])
            .comment(12, 11, &[])
            .comment(13, 10, &[])
            .deleted(20, 1, &[21])
            .comment(21, 20, &[])
            .comment(30, 1, &[31])
            .comment(31, 30, &[])
    }

    fn retriever(forum: Arc<MockForum>) -> CommentTreeRetriever {
        CommentTreeRetriever::new(forum, Arc::new(MemoryCache::<(u64, usize), Vec<Comment>>::new()))
    }

    fn ids(comments: &[Comment]) -> Vec<u64> {
        comments.iter().map(|c| c.id).collect()
    }

    #[tokio::test]
    async fn test_pre_order_with_depths() {
        let forum = Arc::new(forum());
        let comments = retriever(forum.clone())
            .retrieve(1, 50, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(ids(&comments), vec![10, 11, 12, 13, 21, 30, 31]);
        let depths: Vec<u32> = comments.iter().map(|c| c.depth).collect();
        assert_eq!(depths, vec![0, 1, 2, 1, 1, 0, 1]);
        assert!(comments.iter().all(|c| !c.text.is_empty()));
        assert!(forum.fetched().contains(&20));
    }

    #[tokio::test]
    async fn test_replies_under_deleted_comment_are_kept() {
        let forum = Arc::new(
            MockForum::default()
                .story(1, &[20])
                .deleted(20, 1, &[21])
                .comment(21, 20, &[22])
                .comment(22, 21, &[]),
        );
        let comments = retriever(forum)
            .retrieve(1, 10, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(ids(&comments), vec![21, 22]);
        assert_eq!(comments[0].depth, 1);
        assert_eq!(comments[1].depth, 2);
    }

    #[tokio::test]
    async fn test_budget_stops_fetching() {
        let forum = Arc::new(forum());
        let comments = retriever(forum.clone())
            .retrieve(1, 3, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(ids(&comments), vec![10, 11, 12]);
        // Story plus exactly the three kept comments.
        assert_eq!(forum.fetched(), vec![1, 10, 11, 12]);
    }

    #[tokio::test]
    async fn test_every_budget_is_a_prefix_of_the_full_walk() {
        let full = vec![10, 11, 12, 13, 21, 30, 31];
        for budget in 0..=MAX_COMMENTS {
            let comments = retriever(Arc::new(forum()))
                .retrieve(1, budget, &CancellationToken::new())
                .await
                .unwrap();
            assert!(comments.len() <= budget);
            assert_eq!(ids(&comments), full[..budget.min(full.len())].to_vec());
        }
    }

    #[tokio::test]
    async fn test_out_of_range_budget_does_no_io() {
        let forum = Arc::new(forum());
        let result = retriever(forum.clone())
            .retrieve(1, 51, &CancellationToken::new())
            .await;

        assert!(matches!(result, Err(Error::InvalidArgument(_))));
        assert_eq!(forum.calls(), 0);
    }

    #[tokio::test]
    async fn test_failed_comment_is_skipped() {
        let forum = Arc::new(forum().failing(10));
        let comments = retriever(forum)
            .retrieve(1, 3, &CancellationToken::new())
            .await
            .unwrap();

        // A failed fetch has no known replies, so 11..13 are unreachable.
        assert_eq!(ids(&comments), vec![21, 30, 31]);
    }

    #[tokio::test]
    async fn test_missing_story_is_retrieval_failure() {
        let forum = Arc::new(forum().failing(1));
        let result = retriever(forum.clone())
            .retrieve(1, 5, &CancellationToken::new())
            .await;
        assert!(matches!(result, Err(Error::RetrievalFailed(_))));

        let result = retriever(forum).retrieve(404, 5, &CancellationToken::new()).await;
        assert!(matches!(result, Err(Error::RetrievalFailed(_))));
    }

    #[tokio::test]
    async fn test_results_are_cached_per_budget() {
        let forum = Arc::new(forum());
        let retriever = retriever(forum.clone());
        let cancel = CancellationToken::new();

        let first = retriever.retrieve(1, 4, &cancel).await.unwrap();
        let calls = forum.calls();
        let second = retriever.retrieve(1, 4, &cancel).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(forum.calls(), calls);

        retriever.retrieve(1, 2, &cancel).await.unwrap();
        assert!(forum.calls() > calls);
    }

    #[tokio::test]
    async fn test_cancelled_walk() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let result = retriever(Arc::new(forum())).retrieve(1, 5, &cancel).await;
        assert!(matches!(result, Err(Error::Cancelled)));
    }
}
