pub mod scrapers;
pub mod cli;
pub mod limiter;
pub mod logging;
pub mod manager;

pub use manager::DigestManager;
pub use limiter::ConcurrencyLimiter;
pub use scrapers::{ScraperConfig, ArticleExtractor, CommentTreeRetriever, HackerNewsClient, TopStories};

pub use cli::{ScraperCommands, handle_command};
pub use logging::{init_logging, Logger};

pub mod prelude {
    pub use super::scrapers::{ArticleExtractor, CommentTreeRetriever, TopStories};
    pub use super::DigestManager;
    pub use hk_core::{ArticleContent, Comment, Error, Result, Thread};
}
