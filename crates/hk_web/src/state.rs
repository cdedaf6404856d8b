use std::sync::Arc;
use std::time::Duration;

use hk_scrappers::DigestManager;

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Clone)]
pub struct AppState {
    pub manager: Arc<DigestManager>,
    /// Deadline for one request; in-flight fetches are cancelled when it passes
    pub request_timeout: Duration,
}

impl AppState {
    pub fn new(manager: Arc<DigestManager>) -> Self {
        Self {
            manager,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}
