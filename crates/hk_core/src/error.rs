use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Retrieval failed: {0}")]
    RetrievalFailed(String),

    #[error("Failed to generate content summary")]
    SummarizationFailed,

    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    #[error("Request cancelled")]
    Cancelled,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Backend error: {0}")]
    Backend(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl Error {
    /// Errors the HTTP surface may hand to a caller verbatim.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Error::InvalidArgument(_)
                | Error::RetrievalFailed(_)
                | Error::SummarizationFailed
                | Error::RateLimitExceeded(_)
                | Error::Cancelled
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
