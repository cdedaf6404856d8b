use lazy_static::lazy_static;
use scraper::{Html, Selector};
use tracing::debug;

use crate::scrapers::utils::{collapse_whitespace, element_text, truncate_chars};

pub const BODY_TEXT_LIMIT: usize = 10_000;

const NOISE: &str = "script, style, noscript, nav, header, footer, iframe, aside, \
    [role='complementary'], .comments, #comments, .ads, .advertisement, .social";

const CONTENT_CONTAINERS: &[&str] = &[
    "article",
    "[role='main']",
    ".post-content",
    ".article-content",
    ".content",
    "main",
    ".entry-content",
    "#content",
    ".article",
    ".post",
];

lazy_static! {
    static ref NOISE_SELECTOR: Selector = Selector::parse(NOISE).unwrap();
    static ref BODY_SELECTOR: Selector = Selector::parse("body").unwrap();
    static ref CONTAINER_SELECTORS: Vec<(&'static str, Selector)> = CONTENT_CONTAINERS
        .iter()
        .map(|s| (*s, Selector::parse(s).unwrap()))
        .collect();
}

/// Readable text of an HTML page, or an empty string when nothing survives
/// noise removal. Every lookup starts at the root element: `Html::select`
/// also visits detached nodes.
pub fn extract_main_content(html: &str) -> String {
    let mut document = Html::parse_document(html);
    strip_noise(&mut document);

    for (name, selector) in CONTAINER_SELECTORS.iter() {
        let matches: Vec<_> = document.root_element().select(selector).collect();
        if matches.is_empty() {
            continue;
        }
        debug!("Found content using selector: {}", name);
        let text = collapse_whitespace(
            &matches.iter().map(element_text).collect::<Vec<_>>().join(" "),
        );
        if !text.is_empty() {
            return text;
        }
        break;
    }

    debug!("No content container matched, falling back to body text");
    document
        .root_element()
        .select(&BODY_SELECTOR)
        .next()
        .map(|body| truncate_chars(&element_text(&body), BODY_TEXT_LIMIT))
        .unwrap_or_default()
}

fn strip_noise(document: &mut Html) {
    let ids: Vec<_> = document
        .root_element()
        .select(&NOISE_SELECTOR)
        .map(|el| el.id())
        .collect();
    for id in ids {
        if let Some(mut node) = document.tree.get_mut(id) {
            node.detach();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_article_wins_over_body() {
        let html = r#"
            <html><body>
              <nav>Home | About</nav>
              <article>
                <h1>Title</h1>
                <p>First   paragraph.</p>
                <script>var tracking = 1;</script>
                <p>Second paragraph.</p>
              </article>
              <footer>Copyright</footer>
            </body></html>"#;
        assert_eq!(
            extract_main_content(html),
            "Title First paragraph. Second paragraph."
        );
    }

    #[test]
    fn test_selector_order() {
        let html = r#"
            <html><body>
              <div class="post">Post wrapper</div>
              <main>Main landmark</main>
            </body></html>"#;
        assert_eq!(extract_main_content(html), "Main landmark");
    }

    #[test]
    fn test_noise_is_removed_before_matching() {
        let html = r#"
            <html><body>
              <aside><article>Sidebar teaser</article></aside>
              <div class="comments"><div class="content">Reader comment</div></div>
              <p>Plain body text</p>
            </body></html>"#;
        assert_eq!(extract_main_content(html), "Plain body text");
    }

    #[test]
    fn test_noise_nested_in_container_is_dropped() {
        let html = r#"
            <html><body>
              <nav><article>Menu landmark</article></nav>
              <div class="content">Story <div class="ads">Buy now</div>text</div>
            </body></html>"#;
        assert_eq!(extract_main_content(html), "Story text");
    }

    #[test]
    fn test_inline_markup_does_not_split_words() {
        let html = "<html><body><article><p>See <a>this link</a>. Rust<em>aceans</em> rejoice!</p></article></body></html>";
        assert_eq!(extract_main_content(html), "See this link. Rustaceans rejoice!");
    }

    #[test]
    fn test_body_fallback_is_truncated() {
        let html = format!("<html><body><p>{}</p></body></html>", "a".repeat(BODY_TEXT_LIMIT + 500));
        assert_eq!(extract_main_content(&html).chars().count(), BODY_TEXT_LIMIT);
    }

    #[test]
    fn test_empty_page() {
        let html = "<html><head><style>p{}</style></head><body><script>x()</script></body></html>";
        assert_eq!(extract_main_content(html), "");
    }
}
