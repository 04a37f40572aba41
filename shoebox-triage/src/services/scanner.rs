//! Image file scanner
//!
//! Recursive discovery of candidate images under a root folder, filtered
//! by extension. Enumeration order is whatever the filesystem yields and
//! is not stable across runs or platforms.

use crate::services::ledger::LedgerIndex;
use rand::seq::SliceRandom;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

/// Image scanner errors
#[derive(Debug, Error)]
pub enum ScanError {
    /// Specified path does not exist
    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    /// Path exists but is not a directory
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),
}

/// Recursive image file scanner
pub struct ImageScanner {
    extensions: &'static [&'static str],
}

impl ImageScanner {
    /// Create a scanner recognizing the supported image extensions
    pub fn new() -> Self {
        Self {
            extensions: &["jpg", "jpeg", "png", "gif", "webp"],
        }
    }

    /// Scan `root` recursively for image files
    ///
    /// Unreadable entries are logged and skipped rather than aborting the
    /// scan; only a missing or non-directory root is an error.
    pub fn scan(&self, root: &Path) -> Result<Vec<PathBuf>, ScanError> {
        if !root.exists() {
            return Err(ScanError::PathNotFound(root.to_path_buf()));
        }
        if !root.is_dir() {
            return Err(ScanError::NotADirectory(root.to_path_buf()));
        }

        let mut files = Vec::new();
        for entry in WalkDir::new(root).follow_links(false) {
            match entry {
                Ok(entry) => {
                    if entry.file_type().is_file() && self.is_image_file(entry.path()) {
                        files.push(entry.path().to_path_buf());
                    }
                }
                Err(e) => {
                    tracing::warn!("Error accessing entry: {}", e);
                }
            }
        }

        tracing::debug!(root = %root.display(), count = files.len(), "Scan complete");
        Ok(files)
    }

    fn is_image_file(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| {
                let lower = ext.to_lowercase();
                self.extensions.contains(&lower.as_str())
            })
            .unwrap_or(false)
    }
}

impl Default for ImageScanner {
    fn default() -> Self {
        Self::new()
    }
}

/// Drop candidates whose path the ledger already records
///
/// The cheap first-pass filter; content-hash de-duplication for renamed
/// copies happens later, in the driver.
pub fn exclude_known(files: Vec<PathBuf>, index: &LedgerIndex) -> Vec<PathBuf> {
    files
        .into_iter()
        .filter(|path| !index.knows_path(&path.display().to_string()))
        .collect()
}

/// Uniform random subset of `n` candidates, without replacement
///
/// Identity when `n` is at least the candidate count.
pub fn sample(files: Vec<PathBuf>, n: usize) -> Vec<PathBuf> {
    if n >= files.len() {
        return files;
    }
    let mut rng = rand::thread_rng();
    files.choose_multiple(&mut rng, n).cloned().collect()
}
