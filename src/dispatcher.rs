//! Bounded-concurrency enrichment of resolved articles.
//!
//! Every row gets exactly one [`EnrichedRecord`], written back into the slot
//! of its input index, so the output lines up with the input regardless of
//! the order in which calls complete.
//!
//! Rows with blank text skip the model entirely. All other rows take a
//! permit from a counting semaphore before calling the analyzer. The permit
//! is a guard held for the duration of the call, so it is returned on every
//! exit path, including timeouts inside the client.

use crate::api::{Analyze, parse_response};
use crate::models::{AnalysisResult, AnalysisStatus, EnrichedRecord, ResolvedArticle};
use futures::stream::{FuturesUnordered, StreamExt};
use itertools::Itertools;
use tokio::sync::Semaphore;
use tracing::{debug, info, instrument, warn};

/// Default number of analysis calls allowed in flight.
pub const DEFAULT_CONCURRENCY: usize = 5;

/// Fans analysis calls out over a fixed number of permits.
#[derive(Debug)]
pub struct Dispatcher<A> {
    analyzer: A,
    permits: Semaphore,
    concurrency: usize,
}

impl<A: Analyze> Dispatcher<A> {
    /// `concurrency` is clamped to at least one.
    pub fn new(analyzer: A, concurrency: usize) -> Self {
        let concurrency = concurrency.max(1);
        Self {
            analyzer,
            permits: Semaphore::new(concurrency),
            concurrency,
        }
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Enrich every row. Completes once each row has its record.
    ///
    /// # Arguments
    ///
    /// * `rows` - Resolved articles; blank ones are never sent to the analyzer
    ///
    /// # Returns
    ///
    /// Exactly `rows.len()` records, where record `i` belongs to `rows[i]`.
    /// Failed calls yield default summary and topics rather than an error.
    #[instrument(
        level = "info",
        skip_all,
        fields(rows = rows.len(), concurrency = self.concurrency)
    )]
    pub async fn enrich_all(&self, rows: &[ResolvedArticle]) -> Vec<EnrichedRecord> {
        let mut slots: Vec<Option<EnrichedRecord>> = (0..rows.len()).map(|_| None).collect();

        let mut pending: FuturesUnordered<_> = rows
            .iter()
            .enumerate()
            .map(|(index, row)| self.enrich_row(index, row))
            .collect();

        while let Some((index, record)) = pending.next().await {
            slots[index] = Some(record);
        }

        let records: Vec<EnrichedRecord> = slots.into_iter().flatten().collect();
        debug_assert_eq!(records.len(), rows.len());

        let by_status = records.iter().counts_by(|r| r.status);
        info!(
            total = records.len(),
            analyzed = by_status.get(&AnalysisStatus::Analyzed).copied().unwrap_or(0),
            failed = by_status.get(&AnalysisStatus::Failed).copied().unwrap_or(0),
            no_content = by_status.get(&AnalysisStatus::NoContent).copied().unwrap_or(0),
            "Completed article enrichment"
        );
        records
    }

    async fn enrich_row(&self, index: usize, row: &ResolvedArticle) -> (usize, EnrichedRecord) {
        if row.is_blank() {
            debug!(index, url = %row.url, "No content; skipping analysis");
            return (index, EnrichedRecord::new(row, AnalysisResult::no_content()));
        }

        let analysis = match self.permits.acquire().await {
            Ok(_permit) => {
                debug!(index, url = %row.url, "Analyzing article");
                let reply = self.analyzer.analyze(&row.page_content).await;
                parse_response(reply.as_deref())
            }
            Err(e) => {
                // Only reachable if the semaphore is closed, which this type never does.
                warn!(index, error = %e, "Permit set closed; using default analysis");
                AnalysisResult::unavailable()
            }
        };

        if analysis.status == AnalysisStatus::Failed {
            warn!(index, url = %row.url, "Analysis unavailable; using default summary");
        }
        (index, EnrichedRecord::new(row, analysis))
    }
}
