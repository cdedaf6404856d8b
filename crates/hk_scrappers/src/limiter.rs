use std::sync::Arc;

use hk_core::{Error, Result};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Process-wide ceiling on concurrent article fetches.
///
/// Requests that arrive while every slot is taken are rejected immediately
/// rather than queued. Slots are released when the returned permit drops.
#[derive(Debug, Clone)]
pub struct ConcurrencyLimiter {
    semaphore: Arc<Semaphore>,
    max: usize,
}

impl ConcurrencyLimiter {
    pub fn new(max: usize) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(max)),
            max,
        }
    }

    pub fn try_acquire(&self) -> Result<OwnedSemaphorePermit> {
        self.semaphore.clone().try_acquire_owned().map_err(|_| {
            Error::RateLimitExceeded(format!(
                "{} article fetches already in flight, try again later",
                self.max
            ))
        })
    }

    pub fn max(&self) -> usize {
        self.max
    }

    pub fn in_flight(&self) -> usize {
        self.max - self.semaphore.available_permits()
    }
}
