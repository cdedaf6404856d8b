use std::future::Future;

pub use tokio_util::sync::CancellationToken;

use crate::{Error, Result};

/// Drives `fut` to completion unless `cancel` fires first.
pub async fn until_cancelled<T, F>(cancel: &CancellationToken, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(Error::Cancelled),
        result = fut => result,
    }
}
