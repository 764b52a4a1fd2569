//! Data models for catalog entries, resolved articles, and their enrichment.
//!
//! This module defines the core data structures used throughout the pipeline:
//! - [`CatalogEntry`]: One search result from the paginated catalog API
//! - [`ResolvedArticle`]: A catalog entry plus the text of its page
//! - [`AnalysisResult`]: Summary and topics produced for one article
//! - [`EnrichedRecord`]: One row of the final analysis table
//!
//! Wire-level shapes (the catalog API's camelCase JSON, the CSV column names)
//! live next to the code that reads or writes them; these types are the
//! pipeline's own vocabulary.

use serde::{Deserialize, Serialize};

/// Summary used when the model gave no usable `SUMMARY:` line.
pub const NO_SUMMARY: &str = "No summary available.";

/// Summary used when an article had no text worth analyzing.
pub const NO_CONTENT: &str = "No content";

/// A single search result from the catalog API, before its page is fetched.
///
/// Entries are produced in the order the server ranks them. The collector
/// does not deduplicate, so the same URL may appear twice if the catalog
/// shifts while it is being walked.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct CatalogEntry {
    /// Absolute URL of the article page.
    pub url: String,
    /// The tile title shown in search results.
    pub title: String,
    /// The tile description shown in search results.
    pub description: String,
    /// Categories assigned by the site, in the order the API lists them.
    pub categories: Vec<String>,
}

/// A catalog entry together with the text extracted from its page.
///
/// This is the input row of the enrichment stage. `page_content` is empty
/// when the page could not be fetched or is not an HTML article.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ResolvedArticle {
    pub url: String,
    pub title: String,
    pub description: String,
    pub categories: Vec<String>,
    pub page_content: String,
}

impl ResolvedArticle {
    /// Attach page text to a catalog entry.
    pub fn from_entry(entry: CatalogEntry, page_content: String) -> Self {
        Self {
            url: entry.url,
            title: entry.title,
            description: entry.description,
            categories: entry.categories,
            page_content,
        }
    }

    /// `true` when there is nothing to send to the model.
    pub fn is_blank(&self) -> bool {
        self.page_content.trim().is_empty()
    }
}

/// How an [`AnalysisResult`] came to be.
///
/// The output table cannot tell a failed call from a reply without topics;
/// this status keeps that distinction for logging and run statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnalysisStatus {
    /// The model replied and the reply was parsed (possibly partially).
    Analyzed,
    /// The call failed or the reply was empty; defaults were substituted.
    Failed,
    /// The article had no text, so no call was made.
    NoContent,
}

/// Summary and topics for one article.
///
/// Always present: a failed or unparsable reply degrades to
/// [`AnalysisResult::unavailable`] rather than to an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisResult {
    pub summary: String,
    pub topics: Vec<String>,
    pub status: AnalysisStatus,
}

impl AnalysisResult {
    /// Default for a failed call or an empty reply.
    pub fn unavailable() -> Self {
        Self {
            summary: NO_SUMMARY.to_string(),
            topics: Vec::new(),
            status: AnalysisStatus::Failed,
        }
    }

    /// Sentinel for articles whose text is blank.
    pub fn no_content() -> Self {
        Self {
            summary: NO_CONTENT.to_string(),
            topics: Vec::new(),
            status: AnalysisStatus::NoContent,
        }
    }
}

/// One row of the analysis table, aligned index-for-index with its input row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrichedRecord {
    pub title: String,
    pub url: String,
    pub category: Vec<String>,
    pub summary: String,
    pub topics: Vec<String>,
    pub status: AnalysisStatus,
}

impl EnrichedRecord {
    /// Combine an input row with the analysis produced for it.
    pub fn new(article: &ResolvedArticle, analysis: AnalysisResult) -> Self {
        Self {
            title: article.title.clone(),
            url: article.url.clone(),
            category: article.categories.clone(),
            summary: analysis.summary,
            topics: analysis.topics,
            status: analysis.status,
        }
    }
}
