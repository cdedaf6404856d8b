use async_trait::async_trait;

use crate::types::Item;
use crate::Result;

/// Read-only access to the forum API.
#[async_trait]
pub trait ForumSource: Send + Sync {
    /// Ordered ids of the current top stories
    async fn top_story_ids(&self) -> Result<Vec<u64>>;

    /// Fetch a story or comment; a missing item is `Error::NotFound`
    async fn item(&self, id: u64) -> Result<Item>;
}
