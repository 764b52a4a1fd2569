//! Catalog search API scraper.
//!
//! The Fresh Produce site exposes its article catalog through a JSON search
//! endpoint that returns one page of tiles at a time together with paging
//! metadata:
//!
//! ```text
//! GET /api/search/query?staticCategories=Technology|Food Safety&pageSize=50
//!     &sortBy=2&filteredCategories=Article&pageNumber=0
//!
//! { "results": [ { "url": "/resources/...", "tileTitle": "...",
//!                  "tileDescription": "...", "categories": ["..."] } ],
//!   "pagingSpecification": { "pageNumber": 0, "totalNumberOfPages": 7 } }
//! ```
//!
//! [`collect_catalog`] walks the pages one after another, re-reading the page
//! count from every response. [`collect_catalog_parallel`] fetches the
//! remaining pages concurrently once page 0 has reported the total.

use crate::config::CatalogConfig;
use crate::error::CatalogError;
use crate::models::CatalogEntry;
use futures::stream::{self, StreamExt, TryStreamExt};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};
use url::Url;

/// Filters sent with every page request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogQuery {
    pub categories: Vec<String>,
    pub page_size: u32,
    pub content_type: String,
    pub sort_by: u32,
}

impl From<&CatalogConfig> for CatalogQuery {
    fn from(config: &CatalogConfig) -> Self {
        Self {
            categories: config.categories.clone(),
            page_size: config.page_size,
            content_type: config.content_type.clone(),
            sort_by: config.sort_by,
        }
    }
}

impl CatalogQuery {
    /// Build the request URL for one page.
    pub fn page_url(&self, base_url: &str, page_number: u32) -> Result<Url, CatalogError> {
        let mut url = Url::parse(base_url)?;
        url.query_pairs_mut()
            .append_pair("staticCategories", &self.categories.join("|"))
            .append_pair("pageSize", &self.page_size.to_string())
            .append_pair("sortBy", &self.sort_by.to_string())
            .append_pair("filteredCategories", &self.content_type)
            .append_pair("pageNumber", &page_number.to_string());
        Ok(url)
    }
}

/// The server's view of pagination at the time a page was served.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Paging {
    #[serde(rename = "pageNumber")]
    pub current_page: u32,
    #[serde(rename = "totalNumberOfPages")]
    pub total_pages: u32,
}

impl Paging {
    /// The next page to request, if the server reports one.
    pub fn next_page(&self) -> Option<u32> {
        let next = self.current_page.checked_add(1)?;
        (next < self.total_pages).then_some(next)
    }
}

/// One page of catalog results.
#[derive(Debug, Clone, Default)]
pub struct CatalogPage {
    pub entries: Vec<CatalogEntry>,
    pub paging: Paging,
}

/// Anything that can serve catalog pages by index.
pub trait CatalogSource {
    /// Fetch page `page_number` (0-based). Errors are fatal for the run.
    async fn fetch_page(
        &self,
        query: &CatalogQuery,
        page_number: u32,
    ) -> Result<CatalogPage, CatalogError>;
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchResult>,
    #[serde(default)]
    paging_specification: Paging,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchResult {
    url: String,
    #[serde(default)]
    tile_title: Option<String>,
    #[serde(default)]
    tile_description: Option<String>,
    #[serde(default)]
    categories: Vec<String>,
}

/// Decode one search response body, resolving relative article paths
/// against `site`.
pub fn parse_search_page(
    body: &str,
    source_url: &str,
    site: &Url,
) -> Result<CatalogPage, CatalogError> {
    let response: SearchResponse =
        serde_json::from_str(body).map_err(|source| CatalogError::Decode {
            url: source_url.to_string(),
            source,
        })?;

    let mut entries = Vec::with_capacity(response.results.len());
    for result in response.results {
        let url = match site.join(&result.url) {
            Ok(resolved) => resolved.to_string(),
            Err(e) => {
                warn!(url = %result.url, error = %e, "Unresolvable catalog URL; keeping it as-is");
                result.url
            }
        };
        entries.push(CatalogEntry {
            url,
            title: result.tile_title.unwrap_or_default(),
            description: result.tile_description.unwrap_or_default(),
            categories: result.categories,
        });
    }

    Ok(CatalogPage {
        entries,
        paging: response.paging_specification,
    })
}

/// Catalog source backed by the live search API.
#[derive(Debug, Clone)]
pub struct HttpCatalog {
    client: Client,
    base_url: String,
    site: Url,
}

impl HttpCatalog {
    pub fn new(config: &CatalogConfig) -> Result<Self, CatalogError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            site: Url::parse(&config.site_url)?,
        })
    }
}

impl CatalogSource for HttpCatalog {
    #[instrument(level = "info", skip_all, fields(page_number = page_number))]
    async fn fetch_page(
        &self,
        query: &CatalogQuery,
        page_number: u32,
    ) -> Result<CatalogPage, CatalogError> {
        let url = query.page_url(&self.base_url, page_number)?;
        debug!(%url, "Requesting catalog page");

        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(CatalogError::Status {
                status,
                url: url.to_string(),
            });
        }
        let body = response.text().await?;
        let page = parse_search_page(&body, url.as_str(), &self.site)?;

        info!(
            count = page.entries.len(),
            current_page = page.paging.current_page,
            total_pages = page.paging.total_pages,
            "Fetched catalog page"
        );
        Ok(page)
    }
}

/// Walk the catalog sequentially until the server reports no further page.
///
/// Each iteration acts on the latest `totalNumberOfPages`. If a response
/// reports a page number behind the one requested, the requested index is
/// used so the walk still advances by exactly one page per request.
///
/// # Arguments
///
/// * `source` - Where pages come from
/// * `query` - Filters sent with every request
///
/// # Returns
///
/// All entries of all pages in page order, duplicates included.
///
/// # Errors
///
/// The first failed page aborts the walk with its [`CatalogError`].
#[instrument(level = "info", skip_all)]
pub async fn collect_catalog<S: CatalogSource>(
    source: &S,
    query: &CatalogQuery,
) -> Result<Vec<CatalogEntry>, CatalogError> {
    let first = source.fetch_page(query, 0).await?;
    let mut entries = first.entries;
    let mut paging = first.paging;
    let mut fetched = 1u32;

    while let Some(next) = paging.next_page() {
        let page = source.fetch_page(query, next).await?;
        entries.extend(page.entries);
        fetched += 1;

        if page.paging.current_page != next {
            warn!(
                requested = next,
                reported = page.paging.current_page,
                "Catalog reported a different page number than requested"
            );
        }
        paging = Paging {
            current_page: page.paging.current_page.max(next),
            total_pages: page.paging.total_pages,
        };
    }

    info!(pages = fetched, count = entries.len(), "Collected catalog");
    Ok(entries)
}

/// Fetch page 0, then pages `1..total_pages` with up to `concurrency`
/// requests in flight. Entries are concatenated in page order.
#[instrument(level = "info", skip_all, fields(concurrency = concurrency))]
pub async fn collect_catalog_parallel<S: CatalogSource>(
    source: &S,
    query: &CatalogQuery,
    concurrency: usize,
) -> Result<Vec<CatalogEntry>, CatalogError> {
    let first = source.fetch_page(query, 0).await?;
    let total_pages = first.paging.total_pages;
    let start = first.paging.next_page();
    let mut entries = first.entries;

    if let Some(start) = start {
        let pages: Vec<CatalogPage> = stream::iter(start..total_pages)
            .map(|page_number| source.fetch_page(query, page_number))
            .buffered(concurrency.max(1))
            .try_collect()
            .await?;
        for page in pages {
            entries.extend(page.entries);
        }
    }

    info!(pages = total_pages.max(1), count = entries.len(), "Collected catalog");
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Reply, serve};
    use std::cell::RefCell;

    /// Serves canned pages and records which indices were requested.
    struct ScriptedCatalog {
        pages: Vec<CatalogPage>,
        requests: RefCell<Vec<u32>>,
    }

    impl ScriptedCatalog {
        fn new(pages: Vec<CatalogPage>) -> Self {
            Self {
                pages,
                requests: RefCell::new(Vec::new()),
            }
        }

        fn requests(&self) -> Vec<u32> {
            self.requests.borrow().clone()
        }
    }

    impl CatalogSource for ScriptedCatalog {
        async fn fetch_page(
            &self,
            _query: &CatalogQuery,
            page_number: u32,
        ) -> Result<CatalogPage, CatalogError> {
            self.requests.borrow_mut().push(page_number);
            self.pages
                .get(page_number as usize)
                .cloned()
                .ok_or_else(|| CatalogError::Status {
                    status: reqwest::StatusCode::NOT_FOUND,
                    url: format!("page {page_number}"),
                })
        }
    }

    fn entry(title: &str) -> CatalogEntry {
        CatalogEntry {
            url: format!("https://www.freshproduce.com/resources/{}/", title.to_lowercase()),
            title: title.to_string(),
            description: String::new(),
            categories: vec!["Technology".to_string()],
        }
    }

    fn page(titles: &[&str], current_page: u32, total_pages: u32) -> CatalogPage {
        CatalogPage {
            entries: titles.iter().map(|t| entry(t)).collect(),
            paging: Paging {
                current_page,
                total_pages,
            },
        }
    }

    fn query() -> CatalogQuery {
        CatalogQuery::from(&CatalogConfig::default())
    }

    fn titles(entries: &[CatalogEntry]) -> Vec<&str> {
        entries.iter().map(|e| e.title.as_str()).collect()
    }

    #[tokio::test]
    async fn test_two_pages_in_order() {
        let source = ScriptedCatalog::new(vec![page(&["A", "B"], 0, 2), page(&["C"], 1, 2)]);
        let entries = collect_catalog(&source, &query()).await.unwrap();
        assert_eq!(titles(&entries), vec!["A", "B", "C"]);
        assert_eq!(source.requests(), vec![0, 1]);
    }

    #[tokio::test]
    async fn test_fetches_exactly_total_pages() {
        let pages: Vec<CatalogPage> = (0..5)
            .map(|i| page(&["x", "y", "z"][..(i as usize % 3) + 1], i, 5))
            .collect();
        let expected: usize = pages.iter().map(|p| p.entries.len()).sum();
        let source = ScriptedCatalog::new(pages);

        let entries = collect_catalog(&source, &query()).await.unwrap();
        assert_eq!(entries.len(), expected);
        assert_eq!(source.requests(), vec![0, 1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn test_single_page_fetches_once() {
        let source = ScriptedCatalog::new(vec![page(&["A"], 0, 1), page(&["never"], 1, 1)]);
        let entries = collect_catalog(&source, &query()).await.unwrap();
        assert_eq!(titles(&entries), vec!["A"]);
        assert_eq!(source.requests(), vec![0]);
    }

    #[tokio::test]
    async fn test_zero_total_keeps_first_page() {
        let source = ScriptedCatalog::new(vec![page(&["A", "B"], 0, 0)]);
        let entries = collect_catalog(&source, &query()).await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(source.requests(), vec![0]);
    }

    #[tokio::test]
    async fn test_shrinking_total_stops_early() {
        // Catalog shrinks from 4 pages to 2 while it is being walked.
        let source = ScriptedCatalog::new(vec![
            page(&["A"], 0, 4),
            page(&["B"], 1, 2),
            page(&["C"], 2, 2),
        ]);
        let entries = collect_catalog(&source, &query()).await.unwrap();
        assert_eq!(titles(&entries), vec!["A", "B"]);
        assert_eq!(source.requests(), vec![0, 1]);
    }

    #[tokio::test]
    async fn test_duplicates_are_kept() {
        let source = ScriptedCatalog::new(vec![page(&["A", "B"], 0, 2), page(&["B", "C"], 1, 2)]);
        let entries = collect_catalog(&source, &query()).await.unwrap();
        assert_eq!(titles(&entries), vec!["A", "B", "B", "C"]);
    }

    #[tokio::test]
    async fn test_stale_page_number_still_advances() {
        // Server always claims to be on page 0.
        let source = ScriptedCatalog::new(vec![
            page(&["A"], 0, 3),
            page(&["B"], 0, 3),
            page(&["C"], 0, 3),
        ]);
        let entries = collect_catalog(&source, &query()).await.unwrap();
        assert_eq!(titles(&entries), vec!["A", "B", "C"]);
        assert_eq!(source.requests(), vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn test_error_aborts_collection() {
        // Page 0 promises three pages but only two exist.
        let source = ScriptedCatalog::new(vec![page(&["A"], 0, 3), page(&["B"], 1, 3)]);
        let result = collect_catalog(&source, &query()).await;
        assert!(matches!(result, Err(CatalogError::Status { .. })));
    }

    #[tokio::test]
    async fn test_parallel_matches_sequential_order() {
        let pages = vec![
            page(&["A", "B"], 0, 3),
            page(&["C", "D"], 1, 3),
            page(&["E"], 2, 3),
        ];
        let source = ScriptedCatalog::new(pages);
        let entries = collect_catalog_parallel(&source, &query(), 4).await.unwrap();
        assert_eq!(titles(&entries), vec!["A", "B", "C", "D", "E"]);

        let mut requested = source.requests();
        requested.sort_unstable();
        assert_eq!(requested, vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn test_parallel_single_page() {
        let source = ScriptedCatalog::new(vec![page(&["A"], 0, 1)]);
        let entries = collect_catalog_parallel(&source, &query(), 4).await.unwrap();
        assert_eq!(titles(&entries), vec!["A"]);
        assert_eq!(source.requests(), vec![0]);
    }

    #[test]
    fn test_page_url_parameters() {
        let url = query()
            .page_url("https://www.freshproduce.com/api/search/query", 3)
            .unwrap();
        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("staticCategories".to_string(), "Technology|Food Safety|Global Trade".to_string()),
                ("pageSize".to_string(), "50".to_string()),
                ("sortBy".to_string(), "2".to_string()),
                ("filteredCategories".to_string(), "Article".to_string()),
                ("pageNumber".to_string(), "3".to_string()),
            ]
        );
    }

    #[test]
    fn test_parse_search_page() {
        let body = r#"{
            "results": [
                {"url": "/resources/technology/robotic-harvest/",
                 "tileTitle": "Robotic harvest",
                 "tileDescription": "Machines in the field",
                 "categories": ["Technology", "Article"]},
                {"url": "/resources/food-safety/recall/",
                 "tileTitle": "Recall",
                 "tileDescription": null}
            ],
            "pagingSpecification": {"pageNumber": 1, "totalNumberOfPages": 4, "pageSize": 2}
        }"#;
        let site = Url::parse("https://www.freshproduce.com").unwrap();
        let page = parse_search_page(body, "test", &site).unwrap();

        assert_eq!(page.paging, Paging { current_page: 1, total_pages: 4 });
        assert_eq!(page.entries.len(), 2);
        assert_eq!(
            page.entries[0].url,
            "https://www.freshproduce.com/resources/technology/robotic-harvest/"
        );
        assert_eq!(page.entries[0].categories, vec!["Technology", "Article"]);
        assert_eq!(page.entries[1].description, "");
        assert!(page.entries[1].categories.is_empty());
    }

    #[test]
    fn test_parse_search_page_without_paging() {
        let site = Url::parse("https://www.freshproduce.com").unwrap();
        let page = parse_search_page(r#"{"results": []}"#, "test", &site).unwrap();
        assert_eq!(page.paging, Paging::default());
        assert_eq!(page.paging.next_page(), None);
    }

    #[test]
    fn test_parse_search_page_rejects_garbage() {
        let site = Url::parse("https://www.freshproduce.com").unwrap();
        let result = parse_search_page("<html>maintenance</html>", "https://x/api", &site);
        assert!(matches!(result, Err(CatalogError::Decode { .. })));
    }

    fn local_catalog(addr: std::net::SocketAddr) -> HttpCatalog {
        HttpCatalog::new(&CatalogConfig {
            base_url: format!("http://{addr}/api/search/query"),
            timeout_secs: 5,
            ..CatalogConfig::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_http_catalog_error_status_is_fatal() {
        let addr = serve(Reply::json("503 Service Unavailable", "{}")).await;
        let result = local_catalog(addr).fetch_page(&query(), 0).await;
        match result {
            Err(CatalogError::Status { status, url }) => {
                assert_eq!(status.as_u16(), 503);
                assert!(url.contains("pageNumber=0"));
            }
            other => panic!("expected a status error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_http_catalog_decodes_page() {
        let body = r#"{"results": [{"url": "/resources/global-trade/ports/",
            "tileTitle": "Ports", "categories": ["Global Trade"]}],
            "pagingSpecification": {"pageNumber": 0, "totalNumberOfPages": 1}}"#;
        let addr = serve(Reply::json("200 OK", body)).await;
        let catalog = local_catalog(addr);

        let page = catalog.fetch_page(&query(), 0).await.unwrap();
        assert_eq!(page.paging.next_page(), None);
        assert_eq!(
            page.entries[0].url,
            "https://www.freshproduce.com/resources/global-trade/ports/"
        );
        assert_eq!(collect_catalog(&catalog, &query()).await.unwrap().len(), 1);
    }
}
