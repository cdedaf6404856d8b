use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use futures::future::join_all;
use hk_core::{
    CancellationToken, Comment, Digest, DigestMeta, Error, Result, SummarizedContent,
    SummarizedThread, SummaryRequest, Thread,
};
use hk_inference::SummarizationClient;

use crate::logging::Logger;
use crate::scrapers::utils::html_to_text;
use crate::scrapers::{ArticleExtractor, CommentTreeRetriever, TopStories};

pub const NO_COMMENTS: &str = "No comments available for this story.";
pub const COMMENTS_UNAVAILABLE: &str = "Comments could not be summarized for this story.";

/// Builds the front-page digest: top stories, each with an article summary
/// and a summary of its discussion.
pub struct DigestManager {
    stories: TopStories,
    comments: CommentTreeRetriever,
    extractor: ArticleExtractor,
    summarizer: Arc<SummarizationClient>,
}

impl DigestManager {
    pub fn new(
        stories: TopStories,
        comments: CommentTreeRetriever,
        extractor: ArticleExtractor,
        summarizer: Arc<SummarizationClient>,
    ) -> Self {
        Self {
            stories,
            comments,
            extractor,
            summarizer,
        }
    }

    pub fn stories(&self) -> &TopStories {
        &self.stories
    }

    pub fn comments(&self) -> &CommentTreeRetriever {
        &self.comments
    }

    pub fn extractor(&self) -> &ArticleExtractor {
        &self.extractor
    }

    pub fn summarizer(&self) -> &SummarizationClient {
        &self.summarizer
    }

    /// A failing story never sinks the batch: its summaries degrade to
    /// placeholders. Only validation, the story list itself and cancellation
    /// are fatal.
    pub async fn digest(&self, request: &SummaryRequest, cancel: &CancellationToken) -> Result<Digest> {
        let started = Instant::now();
        request.validate()?;

        let logger = Logger::new().with_prefix("[digest]".to_string());
        logger.info(&format!("📰 Building digest of {} stories", request.num_stories));

        let threads = self.stories.fetch(request.num_stories, cancel).await?;
        let stories: Vec<SummarizedThread> = join_all(
            threads
                .into_iter()
                .map(|thread| self.summarize_thread(thread, request, cancel)),
        )
        .await;

        if cancel.is_cancelled() {
            logger.warn("Digest cancelled before completion");
            return Err(Error::Cancelled);
        }

        let meta = DigestMeta {
            fetched_at: Utc::now(),
            processing_time_ms: started.elapsed().as_millis() as u64,
            stories_retrieved: stories.len(),
            total_comments_retrieved: stories.iter().map(|s| s.comments.len()).sum(),
            total_tokens_used: stories
                .iter()
                .map(|s| s.article_summary.token_count + s.comments_summary.token_count)
                .sum(),
        };
        logger.info(&format!(
            "✅ Digest ready: {} stories, {} comments, {} tokens in {}ms",
            meta.stories_retrieved,
            meta.total_comments_retrieved,
            meta.total_tokens_used,
            meta.processing_time_ms
        ));

        Ok(Digest { stories, meta })
    }

    async fn summarize_thread(
        &self,
        thread: Thread,
        request: &SummaryRequest,
        cancel: &CancellationToken,
    ) -> SummarizedThread {
        let logger = Logger::new().with_prefix(format!("[story {}]", thread.id));

        let discussion = async {
            let comments = self
                .comments
                .retrieve(thread.id, request.num_comments_per_story as usize, cancel)
                .await
                .unwrap_or_else(|e| {
                    logger.warn(&format!("Comment retrieval failed: {}", e));
                    Vec::new()
                });
            let summary = self
                .summarize_comments(&comments, request.max_summary_length, cancel, &logger)
                .await;
            (comments, summary)
        };

        let ((comments, comments_summary), article_summary) = tokio::join!(
            discussion,
            self.summarize_article(
                &thread,
                request.max_summary_length,
                request.include_original_content,
                cancel,
            ),
        );

        logger.debug(&format!(
            "Summaries ready ({} comments, {} tokens)",
            comments.len(),
            article_summary.token_count + comments_summary.token_count
        ));

        SummarizedThread {
            thread,
            article_summary,
            comments_summary,
            comments,
        }
    }

    /// Extracts and summarizes the story's link. Unreachable or unreadable
    /// articles become a placeholder pointing the reader at the link.
    pub async fn summarize_article(
        &self,
        thread: &Thread,
        max_words: u32,
        include_original: bool,
        cancel: &CancellationToken,
    ) -> SummarizedContent {
        let logger = Logger::new()
            .with_prefix(format!("[story {}]", thread.id))
            .with_prefix("[article]".to_string());

        let Some(url) = thread.url.as_deref() else {
            return SummarizedContent::placeholder(
                format!("{} (no URL provided)", thread.title),
                include_original,
            );
        };
        let unretrievable = || {
            SummarizedContent::placeholder(
                format!(
                    "{} from {} unretrievable, try yourself by visiting the link.",
                    thread.title, url
                ),
                include_original,
            )
        };

        let article = self.extractor.extract(url, cancel).await;
        if !article.success {
            logger.warn(&format!(
                "Extraction failed for {}: {}",
                url,
                article.error.as_deref().unwrap_or("unknown error")
            ));
            return unretrievable();
        }

        match self
            .summarizer
            .summarize(&article.text, max_words, include_original, cancel)
            .await
        {
            Ok(summary) => summary,
            Err(e) => {
                logger.error(&format!("Summarization failed for {}: {}", url, e));
                unretrievable()
            }
        }
    }

    async fn summarize_comments(
        &self,
        comments: &[Comment],
        max_words: u32,
        cancel: &CancellationToken,
        logger: &Logger,
    ) -> SummarizedContent {
        if comments.is_empty() {
            return SummarizedContent::placeholder(NO_COMMENTS.to_string(), false);
        }

        let discussion = comments
            .iter()
            .map(|c| format!("{}: {}", c.author, html_to_text(&c.text)))
            .collect::<Vec<_>>()
            .join("\n");

        match self.summarizer.summarize(&discussion, max_words, false, cancel).await {
            Ok(summary) => summary,
            Err(e) => {
                logger.error(&format!("Comment summarization failed: {}", e));
                SummarizedContent::placeholder(COMMENTS_UNAVAILABLE.to_string(), false)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::limiter::ConcurrencyLimiter;
    use crate::scrapers::hackernews::testing::MockForum;
    use async_trait::async_trait;
    use hk_core::{Completion, SummaryBackend};
    use hk_storage::MemoryCache;
    use reqwest::Client;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Debug, Default)]
    struct MockBackend {
        calls: AtomicUsize,
        prompts: Mutex<Vec<String>>,
        fail: bool,
    }

    #[async_trait]
    impl SummaryBackend for MockBackend {
        fn name(&self) -> &str {
            "mock"
        }

        fn model(&self) -> &str {
            "mock-model"
        }

        fn endpoint(&self) -> &str {
            "http://mock"
        }

        async fn complete(&self, text: &str, _max_words: u32) -> anyhow::Result<Completion> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.prompts.lock().unwrap().push(text.to_string());
            if self.fail {
                anyhow::bail!("backend down");
            }
            Ok(Completion {
                text: "Summary of the discussion.".to_string(),
                token_count: 10,
            })
        }
    }

    fn manager(forum: MockForum, backend: Arc<MockBackend>) -> DigestManager {
        let forum = Arc::new(forum);
        let summarizer = SummarizationClient::new(
            backend,
            Arc::new(MemoryCache::<String, SummarizedContent>::new()),
            None,
        );
        DigestManager::new(
            TopStories::new(forum.clone(), Arc::new(MemoryCache::<u32, Vec<Thread>>::new())),
            CommentTreeRetriever::new(forum, Arc::new(MemoryCache::<(u64, usize), Vec<Comment>>::new())),
            ArticleExtractor::with_client(Client::new(), Arc::new(ConcurrencyLimiter::new(10))),
            Arc::new(summarizer),
        )
    }

    fn request(stories: u32, comments: u32) -> SummaryRequest {
        SummaryRequest {
            num_stories: stories,
            num_comments_per_story: comments,
            max_summary_length: 100,
            include_original_content: false,
        }
    }

    fn forum() -> MockForum {
        let mut forum = MockForum::default()
            .story(1, &[10, 11])
            .comment(10, 1, &[])
            .comment(11, 1, &[])
            .story(2, &[])
            .story(3, &[30])
            .comment(30, 3, &[]);
        if let Some(story) = forum.items.get_mut(&3) {
            story.url = Some("gopher://example.com/post".to_string());
        }
        forum
    }

    #[tokio::test]
    async fn test_digest_aggregates_stories() {
        let backend = Arc::new(MockBackend::default());
        let digest = manager(forum(), backend.clone())
            .digest(&request(3, 5), &CancellationToken::new())
            .await
            .unwrap();

        let ids: Vec<u64> = digest.stories.iter().map(|s| s.thread.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);

        let first = &digest.stories[0];
        assert_eq!(first.comments.len(), 2);
        assert_eq!(first.comments_summary.summary, "Summary of the discussion.");
        assert_eq!(first.article_summary.summary, "Story 1 (no URL provided)");
        assert_eq!(first.article_summary.token_count, 0);

        assert_eq!(digest.stories[1].comments_summary.summary, NO_COMMENTS);
        assert_eq!(
            digest.stories[2].article_summary.summary,
            "Story 3 from gopher://example.com/post unretrievable, try yourself by visiting the link."
        );

        assert_eq!(digest.meta.stories_retrieved, 3);
        assert_eq!(digest.meta.total_comments_retrieved, 3);
        assert_eq!(digest.meta.total_tokens_used, 20);
        // Stories 1 and 3 have comments; their discussions differ.
        assert_eq!(backend.calls.load(Ordering::SeqCst), 2);
        assert!(backend.prompts.lock().unwrap().iter().any(|p| p.contains("dang: comment 10")));
    }

    #[tokio::test]
    async fn test_backend_failure_degrades_to_placeholder() {
        let backend = Arc::new(MockBackend {
            fail: true,
            ..Default::default()
        });
        let digest = manager(forum(), backend)
            .digest(&request(1, 5), &CancellationToken::new())
            .await
            .unwrap();

        let story = &digest.stories[0];
        assert_eq!(story.comments.len(), 2);
        assert_eq!(story.comments_summary.summary, COMMENTS_UNAVAILABLE);
        assert_eq!(digest.meta.total_tokens_used, 0);
    }

    #[tokio::test]
    async fn test_unreachable_story_is_left_out() {
        let digest = manager(forum().failing(1), Arc::new(MockBackend::default()))
            .digest(&request(2, 5), &CancellationToken::new())
            .await;
        // Story 1 cannot be listed, story 2 still is.
        let digest = digest.unwrap();
        assert_eq!(digest.stories.len(), 1);
        assert_eq!(digest.stories[0].thread.id, 2);
    }

    #[tokio::test]
    async fn test_validation_happens_before_io() {
        let result = manager(forum(), Arc::new(MockBackend::default()))
            .digest(&request(11, 5), &CancellationToken::new())
            .await;
        match result {
            Err(Error::InvalidArgument(msg)) => assert!(msg.contains("numStories")),
            other => panic!("expected invalid argument, got {:?}", other.map(|d| d.stories.len())),
        }
    }

    #[tokio::test]
    async fn test_cancelled_digest() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let result = manager(forum(), Arc::new(MockBackend::default()))
            .digest(&request(2, 5), &cancel)
            .await;
        assert!(matches!(result, Err(Error::Cancelled)));
    }
}
