//! Command-line interface definitions.
//!
//! Flags override values from the optional YAML config file. The analysis
//! API key can also come from the environment (a `.env` file is honored).

use crate::config::AppConfig;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Command-line arguments.
///
/// # Examples
///
/// ```sh
/// # Full pass: catalog, page text, analysis
/// freshproduce_insights run
///
/// # Only walk the catalog, 100 results per page, webinars
/// freshproduce_insights catalog --page-size 100 --content-type Webinar
///
/// # Re-run the analysis over an existing scraped_data.csv
/// DEEPSEEK_API_KEY=sk-... freshproduce_insights enrich --concurrency 3
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Optional path to a config.yaml file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Root directory for raw/ and processed/ data files
    #[arg(short, long, global = true, default_value = "data")]
    pub data_dir: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Walk every catalog page and write raw/catalog.json
    Catalog(CatalogArgs),
    /// Fetch each catalog entry's page and write processed/scraped_data.csv
    Resolve,
    /// Summarize every article and write processed/analysis_summary.csv
    Enrich(AnalysisArgs),
    /// Run catalog, resolve and enrich in sequence
    Run {
        #[command(flatten)]
        catalog: CatalogArgs,
        #[command(flatten)]
        analysis: AnalysisArgs,
    },
}

#[derive(Args, Debug, Default)]
pub struct CatalogArgs {
    /// Static categories to search, separated by `|`
    #[arg(long, value_delimiter = '|')]
    pub categories: Option<Vec<String>>,

    /// Results per catalog page
    #[arg(long)]
    pub page_size: Option<u32>,

    /// Content-type filter (Article, Event, Podcast, Video, Webinar, ...)
    #[arg(long)]
    pub content_type: Option<String>,

    /// Sort mode passed to the search API
    #[arg(long)]
    pub sort_by: Option<u32>,

    /// Fetch pages after the first concurrently
    #[arg(long)]
    pub parallel_pages: bool,
}

#[derive(Args, Debug, Default)]
pub struct AnalysisArgs {
    /// Bearer key for the analysis API
    #[arg(long, env = "DEEPSEEK_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Chat-completion endpoint
    #[arg(long, env = "ANALYSIS_ENDPOINT")]
    pub endpoint: Option<String>,

    /// Model name sent with each request
    #[arg(long)]
    pub model: Option<String>,

    /// Maximum analysis calls in flight
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Per-call timeout in seconds
    #[arg(long)]
    pub timeout_secs: Option<u64>,
}

impl CatalogArgs {
    fn apply(&self, config: &mut AppConfig) {
        if let Some(categories) = &self.categories {
            config.catalog.categories = categories
                .iter()
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty())
                .collect();
        }
        if let Some(page_size) = self.page_size {
            config.catalog.page_size = page_size;
        }
        if let Some(content_type) = &self.content_type {
            config.catalog.content_type = content_type.clone();
        }
        if let Some(sort_by) = self.sort_by {
            config.catalog.sort_by = sort_by;
        }
        if self.parallel_pages {
            config.catalog.parallel_pages = true;
        }
    }
}

impl AnalysisArgs {
    fn apply(&self, config: &mut AppConfig) {
        if let Some(api_key) = &self.api_key {
            config.analysis.api_key = Some(api_key.clone());
        }
        if let Some(endpoint) = &self.endpoint {
            config.analysis.endpoint = endpoint.clone();
        }
        if let Some(model) = &self.model {
            config.analysis.model = model.clone();
        }
        if let Some(concurrency) = self.concurrency {
            config.analysis.concurrency = concurrency.max(1);
        }
        if let Some(timeout_secs) = self.timeout_secs {
            config.analysis.timeout_secs = timeout_secs;
        }
    }
}

impl Cli {
    /// Layer this invocation's flags over `config`.
    pub fn apply_overrides(&self, config: &mut AppConfig) {
        match &self.command {
            Command::Catalog(catalog) => catalog.apply(config),
            Command::Resolve => {}
            Command::Enrich(analysis) => analysis.apply(config),
            Command::Run { catalog, analysis } => {
                catalog.apply(config);
                analysis.apply(config);
            }
        }
    }
}
