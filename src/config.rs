//! YAML configuration with built-in defaults.
//!
//! Every field is optional in the file; anything left out falls back to the
//! defaults below. Command-line flags and environment variables are applied
//! on top by [`crate::cli::Cli::apply_overrides`].
//!
//! ```yaml
//! catalog:
//!   categories: ["Technology", "Food Safety", "Global Trade"]
//!   page_size: 50
//!   content_type: Article
//!   sort_by: 2
//! analysis:
//!   model: deepseek-chat
//!   timeout_secs: 60
//!   concurrency: 5
//! ```

use crate::dispatcher::DEFAULT_CONCURRENCY;
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{info, instrument};

/// Complete runtime configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    pub catalog: CatalogConfig,
    pub resolver: ResolverConfig,
    pub analysis: AnalysisConfig,
}

/// Where and how to query the catalog search API.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Search endpoint.
    pub base_url: String,
    /// Origin that the API's relative article paths are resolved against.
    pub site_url: String,
    /// Static category filter; sent joined with `|`.
    pub categories: Vec<String>,
    pub page_size: u32,
    /// Content-type filter, e.g. `Article` or `Webinar`.
    pub content_type: String,
    /// Sort mode understood by the API (2 = newest first).
    pub sort_by: u32,
    /// Fetch pages 1.. concurrently once page 0 reports the total.
    pub parallel_pages: bool,
    pub timeout_secs: u64,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.freshproduce.com/api/search/query".to_string(),
            site_url: "https://www.freshproduce.com".to_string(),
            categories: vec![
                "Technology".to_string(),
                "Food Safety".to_string(),
                "Global Trade".to_string(),
            ],
            page_size: 50,
            content_type: "Article".to_string(),
            sort_by: 2,
            parallel_pages: false,
            timeout_secs: 30,
        }
    }
}

/// Article page fetching.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ResolverConfig {
    pub concurrency: usize,
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            concurrency: 8,
            timeout_secs: 30,
            user_agent: concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// The chat-completion service used for summaries.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub endpoint: String,
    pub model: String,
    /// Bearer credential. Usually supplied through `DEEPSEEK_API_KEY` instead.
    pub api_key: Option<String>,
    pub timeout_secs: u64,
    /// Maximum analysis calls in flight.
    pub concurrency: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.deepseek.com/v1/chat/completions".to_string(),
            model: "deepseek-chat".to_string(),
            api_key: None,
            timeout_secs: 60,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }
}

impl AnalysisConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// The configured key, rejecting blank values.
    pub fn require_api_key(&self) -> Result<&str, ConfigError> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or(ConfigError::MissingApiKey)
    }
}

/// Parse configuration from YAML text.
pub fn parse_config(yaml: &str) -> Result<AppConfig, ConfigError> {
    if yaml.trim().is_empty() {
        return Ok(AppConfig::default());
    }
    Ok(serde_yaml::from_str(yaml)?)
}

/// Load configuration from `path`, or the defaults when no path is given.
#[instrument(level = "info")]
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let Some(path) = path else {
        info!("No config file given; using defaults");
        return Ok(AppConfig::default());
    };
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let config = parse_config(&text)?;
    info!(path = %path.display(), "Loaded configuration");
    Ok(config)
}
