use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use hk_core::{
    ArticleContent, CancellationToken, Comment, Digest, Error, Result, SummarizedContent, SummaryRequest,
};
use serde::Deserialize;
use serde_json::json;
use tracing::{error, warn};

use crate::AppState;

pub const DEFAULT_COMMENTS: usize = 10;

/// Error body returned to HTTP callers. Anything outside the public
/// taxonomy is reported as a bare internal error.
#[derive(Debug)]
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(error: Error) -> Self {
        Self(error)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self.0 {
            Error::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            Error::RateLimitExceeded(_) => StatusCode::TOO_MANY_REQUESTS,
            Error::RetrievalFailed(_) => StatusCode::BAD_GATEWAY,
            Error::Cancelled => StatusCode::GATEWAY_TIMEOUT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if self.0.is_terminal() {
            self.0.to_string()
        } else {
            error!("Unexpected error: {}", self.0);
            "Internal server error".to_string()
        };
        if status.is_server_error() {
            warn!("Request failed with {}: {}", status, message);
        }
        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// Runs `work` with a fresh cancellation token that fires when the deadline
/// passes or the handler future is dropped.
pub async fn with_deadline<T, F, Fut>(timeout: Duration, work: F) -> Result<T>
where
    F: FnOnce(CancellationToken) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let cancel = CancellationToken::new();
    let _guard = cancel.clone().drop_guard();
    match tokio::time::timeout(timeout, work(cancel.clone())).await {
        Ok(result) => result,
        Err(_) => {
            cancel.cancel();
            Err(Error::Cancelled)
        }
    }
}

pub async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

pub async fn summarized_stories(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SummaryRequest>,
) -> std::result::Result<Json<Digest>, ApiError> {
    let manager = state.manager.clone();
    let digest = with_deadline(state.request_timeout, |cancel| async move {
        manager.digest(&request, &cancel).await
    })
    .await?;
    Ok(Json(digest))
}

#[derive(Debug, Deserialize)]
pub struct CommentsQuery {
    pub max: Option<usize>,
}

pub async fn story_comments(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
    Query(query): Query<CommentsQuery>,
) -> std::result::Result<Json<Vec<Comment>>, ApiError> {
    let manager = state.manager.clone();
    let max = query.max.unwrap_or(DEFAULT_COMMENTS);
    let comments = with_deadline(state.request_timeout, |cancel| async move {
        manager.comments().retrieve(id, max, &cancel).await
    })
    .await?;
    Ok(Json(comments))
}

#[derive(Debug, Deserialize)]
pub struct ExtractRequest {
    pub url: String,
}

pub async fn extract_article(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ExtractRequest>,
) -> std::result::Result<Json<ArticleContent>, ApiError> {
    let manager = state.manager.clone();
    let article = with_deadline(state.request_timeout, |cancel| async move {
        Ok(manager.extractor().extract(&request.url, &cancel).await)
    })
    .await?;
    Ok(Json(article))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummarizeRequest {
    pub text: String,
    #[serde(default = "default_max_words")]
    pub max_words: u32,
    #[serde(default)]
    pub include_original: bool,
}

fn default_max_words() -> u32 {
    200
}

impl SummarizeRequest {
    pub fn validate(&self) -> Result<()> {
        if self.text.trim().is_empty() {
            return Err(Error::InvalidArgument("text must not be empty".to_string()));
        }
        let (min, max) = SummaryRequest::SUMMARY_WORDS;
        if !(min..=max).contains(&self.max_words) {
            return Err(Error::InvalidArgument(format!(
                "maxWords must be between {} and {}",
                min, max
            )));
        }
        Ok(())
    }
}

pub async fn summarize_text(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SummarizeRequest>,
) -> std::result::Result<Json<SummarizedContent>, ApiError> {
    request.validate()?;
    let manager = state.manager.clone();
    let summary = with_deadline(state.request_timeout, |cancel| async move {
        manager
            .summarizer()
            .summarize(&request.text, request.max_words, request.include_original, &cancel)
            .await
    })
    .await?;
    Ok(Json(summary))
}
