use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub mod handlers;
pub mod state;

pub use handlers::ApiError;
pub use state::AppState;

pub async fn create_app(state: AppState) -> Router {
    let cors = CorsLayer::permissive();

    Router::new()
        .route("/health", get(handlers::health))
        .route(
            "/api/v1/hacker-news/summarized-stories",
            post(handlers::summarized_stories),
        )
        .route(
            "/api/v1/hacker-news/stories/:id/comments",
            get(handlers::story_comments),
        )
        .route("/api/v1/articles/extract", post(handlers::extract_article))
        .route("/api/v1/summaries", post(handlers::summarize_text))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(Arc::new(state))
}

pub mod prelude {
    pub use crate::{create_app, AppState};
    pub use hk_core::{Error, Result};
}
