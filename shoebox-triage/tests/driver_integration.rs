//! End-to-end driver tests over a temp folder and a mock classifier
//!
//! The mock stands in for the inference round trip so the de-duplication,
//! rate-cap, and ledger behavior can be exercised without a network. Time
//! is paused, so the driver's politeness delays cost nothing.

use async_trait::async_trait;
use shoebox_triage::services::batch_driver::BatchDriver;
use shoebox_triage::services::ledger::{LedgerIndex, LedgerWriter};
use shoebox_triage::services::rate_governor::RateGovernor;
use shoebox_triage::services::scanner::{self, ImageScanner};
use shoebox_triage::types::{Classify, PipelineSpec, RunReport, StopReason};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Stand-in classifier: sentinel rows for "corrupt" files, labeled values
/// otherwise, with a call counter for budget assertions
struct MockClassifier {
    spec: &'static PipelineSpec,
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl Classify for MockClassifier {
    async fn classify(&self, path: &Path) -> Vec<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let name = path.file_name().unwrap().to_string_lossy();
        if name.contains("corrupt") {
            self.spec.sentinel_attributes("Failed to load image")
        } else {
            self.spec
                .fields
                .iter()
                .map(|f| format!("{} value", f.label))
                .collect()
        }
    }
}

async fn run_once(
    images: &Path,
    ledger: &Path,
    spec: &'static PipelineSpec,
    daily_limit: u32,
    calls: Arc<AtomicUsize>,
) -> RunReport {
    let index = LedgerIndex::load(ledger, spec);
    let files = ImageScanner::new().scan(images).unwrap();
    let candidates = scanner::exclude_known(files, &index);
    let writer = LedgerWriter::open(ledger, spec).unwrap();
    let driver = BatchDriver::new(
        MockClassifier { spec, calls },
        RateGovernor::new(daily_limit),
        spec,
        index,
        writer,
    );
    driver.run(candidates).await.unwrap()
}

fn ledger_rows(ledger: &Path) -> Vec<csv::StringRecord> {
    let mut reader = csv::Reader::from_path(ledger).unwrap();
    reader.records().map(|r| r.unwrap()).collect()
}

fn setup() -> (tempfile::TempDir, PathBuf, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let images = dir.path().join("images");
    fs::create_dir(&images).unwrap();
    let ledger = dir.path().join("photo_analysis.csv");
    (dir, images, ledger)
}

#[tokio::test(start_paused = true)]
async fn test_second_run_over_unchanged_folder_adds_no_rows() {
    let (_dir, images, ledger) = setup();
    for name in ["a.jpg", "b.jpg", "c.jpg"] {
        fs::write(images.join(name), name.as_bytes()).unwrap();
    }
    let calls = Arc::new(AtomicUsize::new(0));

    let first = run_once(&images, &ledger, PipelineSpec::photos(), 1000, calls.clone()).await;
    assert_eq!(first.stats.processed, 3);
    assert_eq!(first.stop_reason, StopReason::Exhausted);
    assert_eq!(ledger_rows(&ledger).len(), 3);

    let second = run_once(&images, &ledger, PipelineSpec::photos(), 1000, calls.clone()).await;
    assert_eq!(second.stats.processed, 0);
    assert_eq!(second.stats.discovered, 0, "known paths excluded at scan time");
    assert_eq!(ledger_rows(&ledger).len(), 3);
    assert_eq!(calls.load(Ordering::SeqCst), 3, "no second-run inference calls");
}

#[tokio::test(start_paused = true)]
async fn test_renamed_copy_is_skipped_by_hash() {
    let (_dir, images, ledger) = setup();
    fs::write(images.join("a.jpg"), b"the same pixels").unwrap();
    let calls = Arc::new(AtomicUsize::new(0));

    run_once(&images, &ledger, PipelineSpec::photos(), 1000, calls.clone()).await;
    assert_eq!(ledger_rows(&ledger).len(), 1);

    // Same content under a new name: the path check misses, the hash
    // check must fire.
    fs::write(images.join("moved.jpg"), b"the same pixels").unwrap();
    let report = run_once(&images, &ledger, PipelineSpec::photos(), 1000, calls.clone()).await;
    assert_eq!(report.stats.discovered, 1);
    assert_eq!(report.stats.skipped_by_hash, 1);
    assert_eq!(report.stats.processed, 0);
    assert_eq!(ledger_rows(&ledger).len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_mixed_folder_scenario() {
    let (_dir, images, ledger) = setup();
    let calls = Arc::new(AtomicUsize::new(0));

    // Image A goes into the ledger on a first run
    fs::write(images.join("a.jpg"), b"image a").unwrap();
    run_once(&images, &ledger, PipelineSpec::photos(), 1000, calls.clone()).await;
    assert_eq!(ledger_rows(&ledger).len(), 1);

    // B is new and classifies, C is new and fails
    fs::write(images.join("b.jpg"), b"image b").unwrap();
    fs::write(images.join("corrupt.jpg"), b"image c").unwrap();
    let report = run_once(&images, &ledger, PipelineSpec::photos(), 1000, calls.clone()).await;

    assert_eq!(report.stats.processed, 2);
    assert_eq!(report.stats.failed, 1);

    let rows = ledger_rows(&ledger);
    assert_eq!(rows.len(), 3, "ledger grows by exactly two rows");

    // Columns: path, hash, Category, Wedding, People, Location, Description, date
    let b_row = rows.iter().find(|r| r.get(0).unwrap().ends_with("b.jpg")).unwrap();
    assert_eq!(b_row.get(2), Some("Category value"));

    let c_row = rows.iter().find(|r| r.get(0).unwrap().ends_with("corrupt.jpg")).unwrap();
    assert_eq!(c_row.get(2), Some("Error"));
    assert_eq!(c_row.get(6), Some("Failed to load image"));
    assert!(!c_row.get(1).unwrap().is_empty(), "sentinel rows still carry the hash");
}

#[tokio::test(start_paused = true)]
async fn test_daily_cap_stops_the_run() {
    let (_dir, images, ledger) = setup();
    for i in 0..5 {
        fs::write(images.join(format!("img{}.jpg", i)), format!("pixels {}", i)).unwrap();
    }
    let calls = Arc::new(AtomicUsize::new(0));

    let report = run_once(&images, &ledger, PipelineSpec::photos(), 2, calls.clone()).await;
    assert_eq!(report.stop_reason, StopReason::DailyLimitReached);
    assert_eq!(report.stats.processed, 2);
    assert_eq!(calls.load(Ordering::SeqCst), 2, "no calls past the daily budget");
    assert_eq!(ledger_rows(&ledger).len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_identical_new_files_classified_once_within_a_run() {
    let (_dir, images, ledger) = setup();
    fs::write(images.join("first.jpg"), b"duplicate bytes").unwrap();
    fs::write(images.join("second.jpg"), b"duplicate bytes").unwrap();
    let calls = Arc::new(AtomicUsize::new(0));

    let report = run_once(&images, &ledger, PipelineSpec::photos(), 1000, calls.clone()).await;
    assert_eq!(report.stats.processed, 1);
    assert_eq!(report.stats.skipped_by_hash, 1);
    assert_eq!(ledger_rows(&ledger).len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_tattoo_pipeline_deduplicates_by_path_only() {
    let dir = tempfile::tempdir().unwrap();
    let images = dir.path().join("images");
    fs::create_dir(&images).unwrap();
    let ledger = dir.path().join("tattoo_analysis.csv");
    let calls = Arc::new(AtomicUsize::new(0));

    // Identical content, two paths: without a hash column both are
    // classified, since the schema has nowhere to record the fingerprint.
    fs::write(images.join("left_arm.jpg"), b"same ink").unwrap();
    fs::write(images.join("right_arm.jpg"), b"same ink").unwrap();

    let report = run_once(&images, &ledger, PipelineSpec::tattoos(), 1000, calls.clone()).await;
    assert_eq!(report.stats.processed, 2);
    assert_eq!(report.stats.skipped_by_hash, 0);

    let rows = ledger_rows(&ledger);
    assert_eq!(rows.len(), 2);
    // Columns: path, Primary Style, Secondary Style, Description, date
    assert_eq!(rows[0].len(), 5);
}
