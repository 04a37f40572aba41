//! Read-side ledger analytics
//!
//! Frequency distribution over one attribute column, a ranked top-N
//! console view, and persistence of the full distribution to a derived
//! summary file. Never writes to the ledger itself.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Summary errors
#[derive(Debug, Error)]
pub enum SummaryError {
    /// Ledger file absent
    #[error("Ledger not found: {0}")]
    LedgerNotFound(String),

    /// CSV-level read or write error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// I/O error writing the summary file
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Requested column absent from the ledger header
    #[error("Missing column {0:?} in ledger header")]
    MissingColumn(String),
}

/// One row of the frequency distribution
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryRow {
    pub value: String,
    pub count: usize,
    /// Share of all ledger rows, percent, one decimal place
    pub percentage: f64,
}

/// Frequency distribution of `column` over the full ledger
///
/// Descending by count; ties broken by value so the output is
/// deterministic across runs.
pub fn distribution(ledger: &Path, column: &str) -> Result<Vec<SummaryRow>, SummaryError> {
    if !ledger.exists() {
        return Err(SummaryError::LedgerNotFound(ledger.display().to_string()));
    }

    let mut reader = csv::Reader::from_path(ledger)?;
    let headers = reader.headers()?.clone();
    let col = headers
        .iter()
        .position(|h| h == column)
        .ok_or_else(|| SummaryError::MissingColumn(column.to_string()))?;

    let mut counts: HashMap<String, usize> = HashMap::new();
    let mut total = 0usize;
    for record in reader.records() {
        let record = record?;
        if let Some(value) = record.get(col) {
            *counts.entry(value.to_string()).or_insert(0) += 1;
            total += 1;
        }
    }

    let mut rows: Vec<SummaryRow> = counts
        .into_iter()
        .map(|(value, count)| SummaryRow {
            value,
            count,
            percentage: round_one_decimal(count as f64 / total as f64 * 100.0),
        })
        .collect();
    rows.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.value.cmp(&b.value)));
    Ok(rows)
}

fn round_one_decimal(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

/// Summary file path: `_analysis` suffixed before the ledger's extension
pub fn summary_path(ledger: &Path) -> PathBuf {
    let stem = ledger
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("ledger");
    let ext = ledger.extension().and_then(|s| s.to_str()).unwrap_or("csv");
    ledger.with_file_name(format!("{}_analysis.{}", stem, ext))
}

/// Persist the full distribution
///
/// Columns: `Category, Count, Percentage`, one row per distinct value,
/// already ordered by descending count.
pub fn write_summary(rows: &[SummaryRow], path: &Path) -> Result<(), SummaryError> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(["Category", "Count", "Percentage"])?;
    for row in rows {
        let count = row.count.to_string();
        let percentage = format!("{:.1}", row.percentage);
        writer.write_record([row.value.as_str(), count.as_str(), percentage.as_str()])?;
    }
    writer.flush()?;
    Ok(())
}

/// Print the ranked top-N view
pub fn print_top(title: &str, rows: &[SummaryRow], top: usize) {
    tracing::info!("{}:", title);
    for row in rows.iter().take(top) {
        tracing::info!("- {}: {} ({:.1}%)", row.value, row.count, row.percentage);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_ledger(dir: &Path) -> PathBuf {
        let ledger = dir.join("photo_analysis.csv");
        let mut content = String::from(
            "Image Path,Image Hash,Category,Wedding,People,Location,Description,Processed Date\n",
        );
        for (i, category) in ["Wedding", "Wedding", "Wedding", "Birthday"].iter().enumerate() {
            content.push_str(&format!(
                "/p/{i}.jpg,h{i},{category},N/A,Friends,Indoors,desc,2026-03-01 12:00:00\n"
            ));
        }
        fs::write(&ledger, content).unwrap();
        ledger
    }

    #[test]
    fn test_distribution_counts_and_percentages() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = write_ledger(dir.path());

        let rows = distribution(&ledger, "Category").unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].value, "Wedding");
        assert_eq!(rows[0].count, 3);
        assert_eq!(rows[0].percentage, 75.0);
        assert_eq!(rows[1].value, "Birthday");
        assert_eq!(rows[1].count, 1);
        assert_eq!(rows[1].percentage, 25.0);
        assert_eq!(rows.iter().map(|r| r.percentage).sum::<f64>(), 100.0);
    }

    #[test]
    fn test_distribution_tie_break_is_deterministic() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = dir.path().join("l.csv");
        fs::write(
            &ledger,
            "Image Path,Category\n/a.jpg,Zebra\n/b.jpg,Apple\n",
        )
        .unwrap();

        let rows = distribution(&ledger, "Category").unwrap();
        assert_eq!(rows[0].value, "Apple");
        assert_eq!(rows[1].value, "Zebra");
    }

    #[test]
    fn test_missing_column_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = write_ledger(dir.path());

        let result = distribution(&ledger, "Mood");
        assert!(matches!(result, Err(SummaryError::MissingColumn(_))));
    }

    #[test]
    fn test_missing_ledger_is_an_error() {
        let result = distribution(Path::new("/nonexistent/l.csv"), "Category");
        assert!(matches!(result, Err(SummaryError::LedgerNotFound(_))));
    }

    #[test]
    fn test_summary_path_naming() {
        assert_eq!(
            summary_path(Path::new("/out/photo_analysis.csv")),
            PathBuf::from("/out/photo_analysis_analysis.csv")
        );
        assert_eq!(
            summary_path(Path::new("ledger.csv")),
            PathBuf::from("ledger_analysis.csv")
        );
    }

    #[test]
    fn test_write_summary_file_contents() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = write_ledger(dir.path());
        let rows = distribution(&ledger, "Category").unwrap();

        let out = summary_path(&ledger);
        write_summary(&rows, &out).unwrap();

        let content = fs::read_to_string(&out).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines[0], "Category,Count,Percentage");
        assert_eq!(lines[1], "Wedding,3,75.0");
        assert_eq!(lines[2], "Birthday,1,25.0");
    }
}
