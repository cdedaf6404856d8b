use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use hk_core::{CancellationToken, Comment, SummarizedContent, SummaryBackend, Thread};
use hk_inference::{create_backend, LlmConfig, SummarizationClient, UnconfiguredModel};
use hk_scrappers::{
    handle_command, init_logging, ArticleExtractor, CommentTreeRetriever, ConcurrencyLimiter,
    DigestManager, HackerNewsClient, ScraperCommands, ScraperConfig, TopStories,
};
use hk_storage::MemoryCache;
use hk_web::{create_app, AppState};
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq)]
struct HumanDuration(Duration);

impl FromStr for HumanDuration {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let mut total_seconds = 0u64;
        let mut current_number = String::new();
        let mut has_unit = false;

        for c in s.chars() {
            if c.is_ascii_digit() {
                current_number.push(c);
            } else if let Ok(num) = current_number.parse::<u64>() {
                match c {
                    's' => total_seconds += num,
                    'm' => total_seconds += num * 60,
                    'h' => total_seconds += num * 3600,
                    _ => return Err(format!("Invalid duration unit: {}", c)),
                }
                current_number.clear();
                has_unit = true;
            } else if !c.is_whitespace() {
                return Err(format!("Invalid character in duration: {}", c));
            }
        }

        // A bare number is seconds
        if !current_number.is_empty() {
            total_seconds += current_number
                .parse::<u64>()
                .map_err(|_| "Invalid number in duration".to_string())?;
            has_unit = true;
        }

        if !has_unit || total_seconds == 0 {
            return Err("Duration must be a positive number of seconds, e.g. 60 or 1m30s".to_string());
        }

        Ok(HumanDuration(Duration::from_secs(total_seconds)))
    }
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Hacker News digests with LLM summaries", long_about = None)]
struct Cli {
    #[arg(long, env = "HN_API_BASE_URL", default_value = HackerNewsClient::BASE_URL)]
    hn_base_url: String,
    /// Required by `serve`, `summarize` and `summarize-text`
    #[arg(long, env = "LLM_API_ENDPOINT")]
    llm_endpoint: Option<String>,
    #[arg(long, env = "LLM_BASE_URL")]
    llm_base_url: Option<String>,
    #[arg(long, env = "LLM_MODEL")]
    llm_model: Option<String>,
    #[arg(long, env = "LLM_API_KEY", hide_env_values = true)]
    llm_api_key: Option<String>,
    /// Tag wrapping reasoning traces to strip from answers, e.g. `think`
    #[arg(long, env = "LLM_THINKING_TAG")]
    llm_thinking_tag: Option<String>,
    #[arg(long, env = "SCRAPER_MAX_CONCURRENT", default_value_t = 10)]
    max_concurrent_fetches: usize,
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,
    /// Per-request deadline for the HTTP server (e.g. 60, 90s, 2m)
    #[arg(long, env = "REQUEST_TIMEOUT_SECS", default_value = "60")]
    request_timeout: HumanDuration,
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Serve the HTTP API
    Serve {
        #[arg(long, default_value = "0.0.0.0:3000")]
        addr: String,
    },
    #[command(flatten)]
    Scrape(ScraperCommands),
}

impl Commands {
    fn needs_llm(&self) -> bool {
        match self {
            Commands::Serve { .. } => true,
            Commands::Scrape(command) => command.needs_llm(),
        }
    }
}

impl Cli {
    fn llm_config(&self) -> LlmConfig {
        LlmConfig {
            api_endpoint: self.llm_endpoint.clone().unwrap_or_default(),
            base_url: self.llm_base_url.clone(),
            model: self.llm_model.clone().unwrap_or_default(),
            api_key: self.llm_api_key.clone(),
            thinking_tag: self.llm_thinking_tag.clone(),
        }
    }

    fn scraper_config(&self) -> ScraperConfig {
        ScraperConfig {
            hn_base_url: self.hn_base_url.clone(),
            max_concurrent_fetches: self.max_concurrent_fetches,
            ..Default::default()
        }
    }
}

fn build_manager(cli: &Cli) -> anyhow::Result<DigestManager> {
    let llm = cli.llm_config();
    let backend: Arc<dyn SummaryBackend> = if cli.command.needs_llm() {
        let backend_config = llm.backend_config().context("invalid LLM configuration")?;
        let backend = create_backend(&backend_config).context("failed to create LLM backend")?;
        info!(
            "🧠 LLM backend ready (endpoint: {}, model: {}, mode: {})",
            backend.endpoint(),
            backend.model(),
            backend.name()
        );
        backend
    } else {
        Arc::new(UnconfiguredModel)
    };
    let summarizer = SummarizationClient::new(
        backend,
        Arc::new(MemoryCache::<String, SummarizedContent>::new()),
        llm.thinking_tag.as_deref(),
    );

    let scraper = cli.scraper_config();
    let forum = Arc::new(HackerNewsClient::new(&scraper).context("failed to build forum client")?);
    let limiter = Arc::new(ConcurrencyLimiter::new(scraper.max_concurrent_fetches));
    let extractor = ArticleExtractor::new(&scraper, limiter).context("failed to build article extractor")?;
    info!(
        "🦗 Scrapers ready (forum: {}, article fetch ceiling: {})",
        forum.base_url(),
        scraper.max_concurrent_fetches
    );

    Ok(DigestManager::new(
        TopStories::new(forum.clone(), Arc::new(MemoryCache::<u32, Vec<Thread>>::new())),
        CommentTreeRetriever::new(forum, Arc::new(MemoryCache::<(u64, usize), Vec<Comment>>::new())),
        extractor,
        Arc::new(summarizer),
    ))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    let manager = Arc::new(build_manager(&cli)?);

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("🛑 Interrupted, cancelling in-flight work");
            on_signal.cancel();
        }
    });

    match cli.command {
        Commands::Serve { addr } => {
            let state = AppState::new(manager).with_request_timeout(cli.request_timeout.0);
            let app = create_app(state).await;
            let listener = tokio::net::TcpListener::bind(&addr)
                .await
                .with_context(|| format!("failed to bind {}", addr))?;
            info!("🚀 Listening on {}", listener.local_addr()?);
            axum::serve(listener, app)
                .with_graceful_shutdown(async move { cancel.cancelled().await })
                .await?;
        }
        Commands::Scrape(command) => {
            handle_command(command, &manager, &cancel).await?;
        }
    }

    Ok(())
}
