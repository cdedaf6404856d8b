pub mod cancel;
pub mod models;
pub mod error;
pub mod source;
pub mod storage;
pub mod types;

pub use cancel::{until_cancelled, CancellationToken};
pub use error::{Error, Result};
pub use models::{Completion, SummaryBackend};
pub use source::ForumSource;
pub use storage::CacheStore;
pub use types::*;
