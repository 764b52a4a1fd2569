//! Output generation for the catalog snapshot and the CSV tables.
//!
//! # Submodules
//!
//! - [`json`]: Writes and reloads the collected catalog
//! - [`table`]: Reads and writes the article and analysis CSV tables
//!
//! # Output Structure
//!
//! ```text
//! data_dir/
//! ├── raw/
//! │   └── catalog.json           # catalog stage
//! └── processed/
//!     ├── scraped_data.csv       # resolve stage
//!     └── analysis_summary.csv   # enrich stage
//! ```

pub mod json;
pub mod table;

use std::path::{Path, PathBuf};

/// File locations under one data directory.
#[derive(Debug, Clone)]
pub struct DataPaths {
    pub raw_dir: PathBuf,
    pub processed_dir: PathBuf,
}

impl DataPaths {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            raw_dir: data_dir.join("raw"),
            processed_dir: data_dir.join("processed"),
        }
    }

    pub fn catalog(&self) -> PathBuf {
        self.raw_dir.join("catalog.json")
    }

    pub fn articles(&self) -> PathBuf {
        self.processed_dir.join("scraped_data.csv")
    }

    pub fn summaries(&self) -> PathBuf {
        self.processed_dir.join("analysis_summary.csv")
    }
}
