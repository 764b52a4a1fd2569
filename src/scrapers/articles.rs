//! Article page scraper.
//!
//! Fetches the page behind every catalog entry and extracts its body text
//! from `main#pageContent`. Every entry yields exactly one
//! [`ResolvedArticle`]; pages that fail to load, and document-viewer links
//! that have no HTML body, get empty content instead of being dropped.

use crate::config::ResolverConfig;
use crate::models::{CatalogEntry, ResolvedArticle};
use crate::utils::normalize_whitespace;
use futures::stream::{self, StreamExt};
use once_cell::sync::Lazy;
use reqwest::Client;
use scraper::{Html, Selector};
use std::error::Error;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

static PAGE_CONTENT: Lazy<Selector> =
    Lazy::new(|| Selector::parse("main#pageContent").expect("static selector"));

/// Marker of links that open the PDF viewer rather than an article page.
const DOCUMENT_VIEWER_MARKER: &str = "pdf-viewer?contentId=";

/// `true` for links that open an embedded document instead of an article.
pub fn is_document_viewer(url: &str) -> bool {
    url.contains(DOCUMENT_VIEWER_MARKER)
}

/// Extract normalized body text from an article page.
///
/// All text nodes below `main#pageContent` are joined with single spaces and
/// runs of whitespace collapsed. Pages without that element yield an empty
/// string.
pub fn extract_page_content(html: &str) -> String {
    let document = Html::parse_document(html);
    let text = document
        .select(&PAGE_CONTENT)
        .flat_map(|element| element.text())
        .collect::<Vec<_>>()
        .join(" ");
    normalize_whitespace(&text)
}

/// Fetches article pages with a bounded number of requests in flight.
#[derive(Debug, Clone)]
pub struct ArticleResolver {
    client: Client,
    concurrency: usize,
}

impl ArticleResolver {
    pub fn new(config: &ResolverConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            concurrency: config.concurrency.max(1),
        })
    }

    /// Resolve every entry, preserving input order.
    #[instrument(level = "info", skip_all, fields(count = entries.len()))]
    pub async fn resolve_all(&self, entries: Vec<CatalogEntry>) -> Vec<ResolvedArticle> {
        let articles: Vec<ResolvedArticle> = stream::iter(entries)
            .map(|entry| self.resolve(entry))
            .buffered(self.concurrency)
            .collect()
            .await;

        let empty = articles.iter().filter(|a| a.is_blank()).count();
        info!(
            count = articles.len(),
            empty,
            "Resolved article contents"
        );
        articles
    }

    /// Resolve one entry. Failures are logged and produce empty content.
    pub async fn resolve(&self, entry: CatalogEntry) -> ResolvedArticle {
        if is_document_viewer(&entry.url) {
            debug!(url = %entry.url, "Skipping document viewer link");
            return ResolvedArticle::from_entry(entry, String::new());
        }

        match self.fetch_article(&entry.url).await {
            Ok((final_url, content)) => {
                let mut article = ResolvedArticle::from_entry(entry, content);
                article.url = final_url;
                article
            }
            Err(e) => {
                warn!(
                    url = %entry.url,
                    error = %e,
                    "Article fetch failed; keeping entry without content"
                );
                ResolvedArticle::from_entry(entry, String::new())
            }
        }
    }

    /// Fetch a page and return its post-redirect URL and extracted text.
    #[instrument(level = "debug", skip_all, fields(%url))]
    async fn fetch_article(&self, url: &str) -> Result<(String, String), Box<dyn Error>> {
        let response = self.client.get(url).send().await?.error_for_status()?;
        let final_url = response.url().to_string();
        let body = response.text().await?;
        let content = extract_page_content(&body);
        debug!(bytes = content.len(), "Parsed article");
        Ok((final_url, content))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(url: &str) -> CatalogEntry {
        CatalogEntry {
            url: url.to_string(),
            title: "Annual report".to_string(),
            description: "PDF".to_string(),
            categories: vec!["Global Trade".to_string()],
        }
    }

    #[test]
    fn test_extract_page_content() {
        let html = r#"
            <html><body>
              <nav>Menu  Login</nav>
              <main id="pageContent">
                <h1>Cold chain
                    costs</h1>
                <p>Shipping rates   rose <b>again</b>.</p>
              </main>
              <footer>Copyright</footer>
            </body></html>"#;
        assert_eq!(
            extract_page_content(html),
            "Cold chain costs Shipping rates rose again ."
        );
    }

    #[test]
    fn test_extract_without_main_is_empty() {
        let html = "<html><body><main id=\"other\">Text</main></body></html>";
        assert_eq!(extract_page_content(html), "");
    }

    #[test]
    fn test_document_viewer_detection() {
        assert!(is_document_viewer(
            "https://www.freshproduce.com/pdf-viewer?contentId=123"
        ));
        assert!(!is_document_viewer(
            "https://www.freshproduce.com/resources/technology/ai-sorting/"
        ));
    }

    #[tokio::test]
    async fn test_document_viewer_resolves_without_fetch() {
        let resolver = ArticleResolver::new(&ResolverConfig::default()).unwrap();
        let url = "http://127.0.0.1:9/pdf-viewer?contentId=42";
        let article = resolver.resolve(entry(url)).await;
        assert_eq!(article.url, url);
        assert!(article.is_blank());
        assert_eq!(article.title, "Annual report");
    }

    #[tokio::test]
    async fn test_unreachable_page_keeps_entry() {
        let config = ResolverConfig {
            timeout_secs: 2,
            ..ResolverConfig::default()
        };
        let resolver = ArticleResolver::new(&config).unwrap();
        let articles = resolver
            .resolve_all(vec![
                entry("http://127.0.0.1:9/a"),
                entry("http://127.0.0.1:9/pdf-viewer?contentId=1"),
            ])
            .await;
        assert_eq!(articles.len(), 2);
        assert_eq!(articles[0].url, "http://127.0.0.1:9/a");
        assert!(articles.iter().all(|a| a.is_blank()));
    }
}
