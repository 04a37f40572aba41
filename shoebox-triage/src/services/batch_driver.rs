//! Batch driver: the end-to-end classify-and-ledger loop
//!
//! Per candidate image, in order: path skip (cheapest, no hash computed),
//! content-hash skip (catches renamed copies), rate governor (may sleep or
//! stop the run), classification (never fails past its boundary), ledger
//! append, counters, politeness delay. Only ledger write failures abort
//! the run; everything per-image becomes a sentinel row.

use crate::services::fingerprinter::content_fingerprint;
use crate::services::ledger::{LedgerError, LedgerIndex, LedgerWriter};
use crate::services::rate_governor::{RateDecision, RateGovernor};
use crate::types::{Classify, ImageRecord, PipelineSpec, RunReport, RunStats, StopReason};
use std::path::PathBuf;
use std::time::Duration;

/// Politeness delay between calls, beyond the windowed budget
pub const INTER_CALL_DELAY: Duration = Duration::from_secs(1);

/// One run of the classify-and-ledger loop
pub struct BatchDriver<C: Classify> {
    classifier: C,
    governor: RateGovernor,
    spec: &'static PipelineSpec,
    index: LedgerIndex,
    writer: LedgerWriter,
}

impl<C: Classify> BatchDriver<C> {
    pub fn new(
        classifier: C,
        governor: RateGovernor,
        spec: &'static PipelineSpec,
        index: LedgerIndex,
        writer: LedgerWriter,
    ) -> Self {
        Self {
            classifier,
            governor,
            spec,
            index,
            writer,
        }
    }

    /// Process the candidate list sequentially
    pub async fn run(mut self, candidates: Vec<PathBuf>) -> Result<RunReport, LedgerError> {
        let total = candidates.len();
        let mut stats = RunStats {
            discovered: total,
            ..Default::default()
        };
        let mut stop_reason = StopReason::Exhausted;

        for path in candidates {
            let path_str = path.display().to_string();

            if self.index.knows_path(&path_str) {
                tracing::info!("Skipping already processed image (by path): {}", path_str);
                stats.skipped_by_path += 1;
                continue;
            }

            let content_hash = if self.spec.hash_column {
                let hash = content_fingerprint(&path);
                if self.index.knows_hash(&hash) {
                    tracing::info!("Skipping already processed image (by hash): {}", path_str);
                    stats.skipped_by_hash += 1;
                    continue;
                }
                Some(hash)
            } else {
                None
            };

            match self.governor.acquire().await {
                RateDecision::Proceed => {}
                RateDecision::DailyLimitReached => {
                    tracing::info!(
                        "Daily limit of {} requests reached. Stopping processing.",
                        self.governor.daily_limit()
                    );
                    stop_reason = StopReason::DailyLimitReached;
                    break;
                }
            }

            tracing::info!("Processing ({}/{}): {}", stats.processed + 1, total, path_str);

            let attributes = self.classifier.classify(&path).await;
            let is_sentinel = self.spec.is_sentinel(&attributes);

            let record = ImageRecord {
                path: path_str,
                content_hash,
                attributes,
                processed_at: shoebox_common::time::ledger_timestamp(),
            };

            self.writer.append(&record)?;
            self.index.insert(&record);

            for (field, value) in self.spec.fields.iter().zip(&record.attributes) {
                tracing::info!("- {}: {}", field.label, value);
            }

            stats.processed += 1;
            if is_sentinel {
                stats.failed += 1;
            }
            self.governor.record_call();

            tokio::time::sleep(INTER_CALL_DELAY).await;
        }

        self.writer.flush()?;

        tracing::info!(
            "Processing complete. New rows: {}, skipped by path: {}, skipped by hash: {}",
            stats.processed,
            stats.skipped_by_path,
            stats.skipped_by_hash
        );

        Ok(RunReport { stats, stop_reason })
    }
}
