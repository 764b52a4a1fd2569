//! JSON snapshot of the collected catalog.
//!
//! The catalog stage writes every entry, in server order, together with the
//! query that produced it:
//!
//! ```text
//! data/
//! └── raw/
//!     └── catalog.json
//! ```
//!
//! The resolve stage reads the snapshot back, so the two can run separately.

use crate::error::DatasetError;
use crate::models::CatalogEntry;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::fs;
use tracing::{error, info, instrument};

/// Everything the catalog stage produced in one run.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CatalogSnapshot {
    pub collected_at: DateTime<Utc>,
    pub categories: Vec<String>,
    pub content_type: String,
    pub entries: Vec<CatalogEntry>,
}

impl CatalogSnapshot {
    pub fn new(categories: Vec<String>, content_type: String, entries: Vec<CatalogEntry>) -> Self {
        Self {
            collected_at: Utc::now(),
            categories,
            content_type,
            entries,
        }
    }
}

/// Write the snapshot as pretty-printed JSON.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn write_catalog(snapshot: &CatalogSnapshot, path: &Path) -> Result<(), DatasetError> {
    let json = serde_json::to_string_pretty(snapshot)?;
    if let Err(e) = fs::write(path, json).await {
        error!(error = %e, "Failed to write catalog snapshot");
        return Err(DatasetError::Io {
            path: path.display().to_string(),
            source: e,
        });
    }
    info!(count = snapshot.entries.len(), "Wrote catalog snapshot");
    Ok(())
}

/// Load a snapshot written by [`write_catalog`].
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn read_catalog(path: &Path) -> Result<CatalogSnapshot, DatasetError> {
    let text = fs::read_to_string(path)
        .await
        .map_err(|source| DatasetError::Io {
            path: path.display().to_string(),
            source,
        })?;
    let snapshot: CatalogSnapshot = serde_json::from_str(&text)?;
    info!(
        count = snapshot.entries.len(),
        collected_at = %snapshot.collected_at,
        "Loaded catalog snapshot"
    );
    Ok(snapshot)
}
