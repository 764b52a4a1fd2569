//! # Fresh Produce Insights
//!
//! Collects the Fresh Produce article catalog, fetches the text of every
//! article, and enriches each one with an LLM-generated summary and topic
//! list for the dashboard.
//!
//! ## Usage
//!
//! ```sh
//! DEEPSEEK_API_KEY=sk-... freshproduce_insights run
//! freshproduce_insights catalog --content-type Webinar
//! ```
//!
//! ## Architecture
//!
//! The application follows a pipeline architecture:
//! 1. **Catalog**: Walk the paginated search API (`raw/catalog.json`)
//! 2. **Resolve**: Download each article page and extract its text
//!    (`processed/scraped_data.csv`)
//! 3. **Enrich**: Send articles to the model, at most N at a time
//!    (`processed/analysis_summary.csv`)

use clap::Parser;
use std::error::Error;
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod api;
mod cli;
mod config;
mod dispatcher;
mod error;
mod models;
mod outputs;
mod pipeline;
mod scrapers;
#[cfg(test)]
mod testing;
mod utils;

use cli::{Cli, Command};
use outputs::DataPaths;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // A missing .env file is fine; real environment variables still apply.
    let _ = dotenvy::dotenv();

    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("freshproduce_insights starting up");

    let args = Cli::parse();
    debug!(?args.data_dir, ?args.config, "Parsed CLI arguments");

    let mut config = config::load_config(args.config.as_deref())?;
    args.apply_overrides(&mut config);
    let paths = DataPaths::new(&args.data_dir);

    match &args.command {
        Command::Catalog(_) => {
            pipeline::run_catalog(&config, &paths).await?;
        }
        Command::Resolve => {
            pipeline::run_resolve(&config, &paths).await?;
        }
        Command::Enrich(_) => {
            pipeline::run_enrich(&config, &paths).await?;
        }
        Command::Run { .. } => {
            // Fail before crawling if the analysis stage could never run.
            config.analysis.require_api_key()?;
            let entries = pipeline::run_catalog(&config, &paths).await?;
            let articles = pipeline::run_resolve(&config, &paths).await?;
            let records = pipeline::run_enrich(&config, &paths).await?;
            info!(entries, articles, records, "All stages complete");
        }
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        "Execution complete"
    );

    Ok(())
}
