//! CSV tables exchanged with the dashboard.
//!
//! Two files live under `processed/`:
//!
//! | File | Columns |
//! |------|---------|
//! | `scraped_data.csv` | `title, url, description, categories, page_content` |
//! | `analysis_summary.csv` | `Title, URL, Category, Summary, Topics` |
//!
//! Column names are read by the presentation layer and must not change.
//! Within a cell, `categories` is joined with `,`; the output `Category` and
//! `Topics` cells are joined with `, `.

use crate::error::DatasetError;
use crate::models::{EnrichedRecord, ResolvedArticle};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::Path;
use tracing::{info, instrument};

#[derive(Debug, Deserialize, Serialize)]
struct ArticleRow {
    title: String,
    url: String,
    #[serde(default)]
    description: String,
    #[serde(default, alias = "category")]
    categories: String,
    #[serde(default)]
    page_content: String,
}

impl From<&ResolvedArticle> for ArticleRow {
    fn from(article: &ResolvedArticle) -> Self {
        Self {
            title: article.title.clone(),
            url: article.url.clone(),
            description: article.description.clone(),
            categories: article.categories.join(","),
            page_content: article.page_content.clone(),
        }
    }
}

impl From<ArticleRow> for ResolvedArticle {
    fn from(row: ArticleRow) -> Self {
        Self {
            title: row.title,
            url: row.url,
            description: row.description,
            categories: split_list(&row.categories),
            page_content: row.page_content,
        }
    }
}

#[derive(Debug, Serialize)]
struct SummaryRow<'a> {
    #[serde(rename = "Title")]
    title: &'a str,
    #[serde(rename = "URL")]
    url: &'a str,
    #[serde(rename = "Category")]
    category: String,
    #[serde(rename = "Summary")]
    summary: &'a str,
    #[serde(rename = "Topics")]
    topics: String,
}

impl<'a> From<&'a EnrichedRecord> for SummaryRow<'a> {
    fn from(record: &'a EnrichedRecord) -> Self {
        Self {
            title: &record.title,
            url: &record.url,
            category: record.category.join(", "),
            summary: &record.summary,
            topics: record.topics.join(", "),
        }
    }
}

fn split_list(cell: &str) -> Vec<String> {
    cell.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn io_error(path: &Path, source: std::io::Error) -> DatasetError {
    DatasetError::Io {
        path: path.display().to_string(),
        source,
    }
}

/// Write resolved articles to `scraped_data.csv`.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub fn write_articles(articles: &[ResolvedArticle], path: &Path) -> Result<(), DatasetError> {
    let file = File::create(path).map_err(|e| io_error(path, e))?;
    let mut writer = csv::Writer::from_writer(file);
    for article in articles {
        writer.serialize(ArticleRow::from(article))?;
    }
    writer.flush().map_err(|e| io_error(path, e))?;
    info!(count = articles.len(), "Wrote article table");
    Ok(())
}

/// Load the article table written by [`write_articles`].
///
/// # Arguments
///
/// * `path` - Location of `scraped_data.csv`
///
/// # Returns
///
/// One [`ResolvedArticle`] per data row, in file order. The `categories`
/// column is split back on commas.
///
/// # Errors
///
/// Any unreadable file or malformed row is fatal and returns a
/// [`DatasetError`].
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub fn read_articles(path: &Path) -> Result<Vec<ResolvedArticle>, DatasetError> {
    let file = File::open(path).map_err(|e| io_error(path, e))?;
    let mut reader = csv::Reader::from_reader(file);
    let articles = reader
        .deserialize::<ArticleRow>()
        .map(|row| row.map(ResolvedArticle::from))
        .collect::<Result<Vec<_>, _>>()?;
    info!(count = articles.len(), "Loaded article table");
    Ok(articles)
}

/// Write enriched records to `analysis_summary.csv`, in input order.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub fn write_summaries(records: &[EnrichedRecord], path: &Path) -> Result<(), DatasetError> {
    let file = File::create(path).map_err(|e| io_error(path, e))?;
    let mut writer = csv::Writer::from_writer(file);
    for record in records {
        writer.serialize(SummaryRow::from(record))?;
    }
    writer.flush().map_err(|e| io_error(path, e))?;
    info!(count = records.len(), "Wrote analysis table");
    Ok(())
}
