//! Ledger reading and writing
//!
//! The ledger is an append-only CSV: one row per classified image, header
//! written once at file creation. Reading yields the identity index used
//! for de-duplication. A malformed existing ledger degrades to an empty
//! index and the run still appends to the same file; the old and new
//! sections may then disagree. This is an acknowledged risk, not repaired
//! here.

use crate::types::{ImageRecord, PipelineSpec, HASH_COLUMN, PATH_COLUMN};
use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::path::Path;
use thiserror::Error;

/// Rows appended between durability flushes
pub const FLUSH_EVERY: usize = 10;

/// Ledger I/O errors
#[derive(Debug, Error)]
pub enum LedgerError {
    /// I/O error opening or writing the ledger file
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV-level read or write error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Header row lacks a column the pipeline schema requires
    #[error("Missing column {0:?} in ledger header")]
    MissingColumn(&'static str),
}

/// Identities already present in the ledger
#[derive(Debug, Default)]
pub struct LedgerIndex {
    hashes: HashSet<String>,
    paths: HashSet<String>,
}

impl LedgerIndex {
    /// Load the index from an existing ledger
    ///
    /// A missing file yields an empty index with no error. A malformed
    /// file is logged and also yields an empty index: the run continues as
    /// if no prior ledger existed, at the risk of duplicate rows in the
    /// damaged file.
    pub fn load(path: &Path, spec: &PipelineSpec) -> Self {
        if !path.exists() {
            return Self::default();
        }

        match Self::read(path, spec) {
            Ok(index) => index,
            Err(e) => {
                tracing::error!(
                    ledger = %path.display(),
                    "Failed to read existing ledger, treating as empty: {}",
                    e
                );
                Self::default()
            }
        }
    }

    fn read(path: &Path, spec: &PipelineSpec) -> Result<Self, LedgerError> {
        let mut reader = csv::Reader::from_path(path)?;
        let headers = reader.headers()?.clone();

        let path_col = column_index(&headers, PATH_COLUMN)?;
        let hash_col = if spec.hash_column {
            Some(column_index(&headers, HASH_COLUMN)?)
        } else {
            None
        };

        let mut index = Self::default();
        for record in reader.records() {
            let record = record?;
            if let Some(value) = record.get(path_col) {
                index.paths.insert(value.to_string());
            }
            if let Some(col) = hash_col {
                if let Some(value) = record.get(col) {
                    index.hashes.insert(value.to_string());
                }
            }
        }
        Ok(index)
    }

    pub fn knows_path(&self, path: &str) -> bool {
        self.paths.contains(path)
    }

    pub fn knows_hash(&self, hash: &str) -> bool {
        self.hashes.contains(hash)
    }

    /// Record a freshly written row so the in-run index stays authoritative
    /// (two identical unseen files in one run must not both be classified)
    pub fn insert(&mut self, record: &ImageRecord) {
        self.paths.insert(record.path.clone());
        if let Some(hash) = &record.content_hash {
            self.hashes.insert(hash.clone());
        }
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

fn column_index(headers: &csv::StringRecord, name: &'static str) -> Result<usize, LedgerError> {
    headers
        .iter()
        .position(|h| h == name)
        .ok_or(LedgerError::MissingColumn(name))
}

/// Append-only ledger writer
///
/// Holds the file handle for the duration of a run. Every tenth append
/// forces a flush so a crash loses at most the current partial batch,
/// never previously flushed rows.
pub struct LedgerWriter {
    writer: csv::Writer<File>,
    pending: usize,
}

impl LedgerWriter {
    /// Open for appending, writing the header first when the file is new
    pub fn open(path: &Path, spec: &PipelineSpec) -> Result<Self, LedgerError> {
        let exists = path.exists();
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);

        if !exists {
            writer.write_record(spec.columns())?;
            writer.flush()?;
        }

        Ok(Self { writer, pending: 0 })
    }

    /// Append one row
    pub fn append(&mut self, record: &ImageRecord) -> Result<(), LedgerError> {
        let mut row: Vec<&str> = Vec::with_capacity(3 + record.attributes.len());
        row.push(&record.path);
        if let Some(hash) = &record.content_hash {
            row.push(hash);
        }
        for value in &record.attributes {
            row.push(value);
        }
        row.push(&record.processed_at);

        self.writer.write_record(&row)?;

        self.pending += 1;
        if self.pending >= FLUSH_EVERY {
            self.flush()?;
        }
        Ok(())
    }

    /// Force buffered rows to the file
    pub fn flush(&mut self) -> Result<(), LedgerError> {
        self.writer.flush()?;
        self.pending = 0;
        Ok(())
    }
}
