//! Error types for each pipeline stage.
//!
//! Catalog, dataset, and configuration errors abort a run. Analysis errors
//! never leave the analysis client: they are logged and replaced by a
//! default result (see [`crate::api`]).

use thiserror::Error;

/// Failure while walking the catalog API. Fatal for the whole collection run.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("catalog API returned HTTP {status} for {url}")]
    Status {
        status: reqwest::StatusCode,
        url: String,
    },

    #[error("catalog response from {url} is not valid JSON: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid catalog URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

/// Failure of a single analysis call. Converted to a soft failure by the client.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("analysis request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("analysis API returned HTTP {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("analysis reply had no choices")]
    EmptyReply,
}

/// Failure reading or writing a tabular or JSON dataset.
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("dataset I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Failure loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("no API key for the analysis service (set DEEPSEEK_API_KEY or analysis.api_key)")]
    MissingApiKey,

    #[error("API key contains characters not allowed in an HTTP header")]
    InvalidApiKey,

    #[error("cannot build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}
