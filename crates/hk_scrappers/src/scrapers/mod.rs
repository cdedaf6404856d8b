use std::time::Duration;

use hk_core::Result;
use reqwest::{redirect, Client};

pub mod article;
pub mod hackernews;

pub use article::ArticleExtractor;
pub use hackernews::{CommentTreeRetriever, HackerNewsClient, TopStories};

#[derive(Debug, Clone)]
pub struct ScraperConfig {
    /// Root of the forum API, without a trailing slash
    pub hn_base_url: String,
    /// Ceiling on article fetches in flight across all callers
    pub max_concurrent_fetches: usize,
    pub fetch_timeout: Duration,
    pub max_redirects: usize,
    pub user_agent: String,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            hn_base_url: HackerNewsClient::BASE_URL.to_string(),
            max_concurrent_fetches: 10,
            fetch_timeout: Duration::from_secs(10),
            max_redirects: 5,
            user_agent: "Mozilla/5.0 (compatible; HakNewsBot/1.0; +http://haknews.com)".to_string(),
        }
    }
}

impl ScraperConfig {
    pub fn http_client(&self) -> Result<Client> {
        let client = Client::builder()
            .timeout(self.fetch_timeout)
            .user_agent(self.user_agent.as_str())
            .redirect(redirect::Policy::limited(self.max_redirects))
            .build()?;
        Ok(client)
    }
}

/// Common utilities for scrapers
pub(crate) mod utils {
    use scraper::{ElementRef, Html, Node};

    const BLOCK_ELEMENTS: &[&str] = &[
        "p", "br", "div", "li", "ul", "ol", "pre", "blockquote", "h1", "h2", "h3", "h4", "h5",
        "h6", "tr", "td", "section", "article", "header", "footer", "main",
    ];

    pub fn collapse_whitespace(text: &str) -> String {
        text.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    pub fn truncate_chars(text: &str, max_chars: usize) -> String {
        match text.char_indices().nth(max_chars) {
            Some((idx, _)) => text[..idx].to_string(),
            None => text.to_string(),
        }
    }

    /// Text nodes are concatenated as-is; block elements start a new word.
    pub fn element_text(element: &ElementRef) -> String {
        let mut text = String::new();
        for node in element.descendants() {
            match node.value() {
                Node::Text(t) => text.push_str(t),
                Node::Element(e) if BLOCK_ELEMENTS.contains(&e.name()) => text.push(' '),
                _ => {}
            }
        }
        collapse_whitespace(&text)
    }

    /// Plain text of an HTML fragment such as a comment body.
    pub fn html_to_text(fragment: &str) -> String {
        let fragment = Html::parse_fragment(fragment);
        element_text(&fragment.root_element())
    }
}
