//! The three pipeline stages and their file hand-offs.
//!
//! Each stage reads the previous stage's file and writes its own, so any
//! stage can be re-run alone. A stage error aborts the run.

use crate::api::AnalysisClient;
use crate::config::AppConfig;
use crate::dispatcher::Dispatcher;
use crate::outputs::json::{self, CatalogSnapshot};
use crate::outputs::{DataPaths, table};
use crate::scrapers::articles::ArticleResolver;
use crate::scrapers::catalog::{
    CatalogQuery, HttpCatalog, collect_catalog, collect_catalog_parallel,
};
use crate::utils::ensure_writable_dir;
use std::error::Error;
use std::time::Instant;
use tracing::{error, info, instrument};

/// Concurrent page requests when `parallel_pages` is on.
const PAGE_CONCURRENCY: usize = 4;

/// Walk the catalog and write `raw/catalog.json`. Returns the entry count.
#[instrument(level = "info", skip_all)]
pub async fn run_catalog(config: &AppConfig, paths: &DataPaths) -> Result<usize, Box<dyn Error>> {
    ensure_writable_dir(&paths.raw_dir).await?;

    let t0 = Instant::now();
    let source = HttpCatalog::new(&config.catalog)?;
    let query = CatalogQuery::from(&config.catalog);
    info!(
        categories = %query.categories.join("|"),
        page_size = query.page_size,
        content_type = %query.content_type,
        sort_by = query.sort_by,
        parallel = config.catalog.parallel_pages,
        "Collecting catalog"
    );

    let result = if config.catalog.parallel_pages {
        collect_catalog_parallel(&source, &query, PAGE_CONCURRENCY).await
    } else {
        collect_catalog(&source, &query).await
    };
    let entries = result.inspect_err(|e| error!(error = %e, "Catalog collection failed"))?;

    let count = entries.len();
    let snapshot = CatalogSnapshot::new(query.categories, query.content_type, entries);
    json::write_catalog(&snapshot, &paths.catalog()).await?;
    info!(count, elapsed_ms = t0.elapsed().as_millis() as u64, "Catalog stage complete");
    Ok(count)
}

/// Fetch every catalog entry's page and write `processed/scraped_data.csv`.
#[instrument(level = "info", skip_all)]
pub async fn run_resolve(config: &AppConfig, paths: &DataPaths) -> Result<usize, Box<dyn Error>> {
    ensure_writable_dir(&paths.processed_dir).await?;

    let t0 = Instant::now();
    let snapshot = json::read_catalog(&paths.catalog()).await?;
    let resolver = ArticleResolver::new(&config.resolver)?;
    let articles = resolver.resolve_all(snapshot.entries).await;

    table::write_articles(&articles, &paths.articles())?;
    info!(
        count = articles.len(),
        elapsed_ms = t0.elapsed().as_millis() as u64,
        "Resolve stage complete"
    );
    Ok(articles.len())
}

/// Summarize every article and write `processed/analysis_summary.csv`.
#[instrument(level = "info", skip_all)]
pub async fn run_enrich(config: &AppConfig, paths: &DataPaths) -> Result<usize, Box<dyn Error>> {
    ensure_writable_dir(&paths.processed_dir).await?;

    let t0 = Instant::now();
    let articles = table::read_articles(&paths.articles())
        .inspect_err(|e| error!(error = %e, "Failed to load article table"))?;
    let client = AnalysisClient::new(&config.analysis)?;
    let dispatcher = Dispatcher::new(client, config.analysis.concurrency);
    info!(
        rows = articles.len(),
        concurrency = dispatcher.concurrency(),
        model = %config.analysis.model,
        "Starting article enrichment"
    );

    let records = dispatcher.enrich_all(&articles).await;
    table::write_summaries(&records, &paths.summaries())?;
    info!(
        count = records.len(),
        elapsed_ms = t0.elapsed().as_millis() as u64,
        "Enrich stage complete"
    );
    Ok(records.len())
}
