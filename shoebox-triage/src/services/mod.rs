//! Service modules for the classification pipeline

pub mod batch_driver;
pub mod classifier;
pub mod fingerprinter;
pub mod image_loader;
pub mod ledger;
pub mod rate_governor;
pub mod scanner;
pub mod summary;
pub mod vision_client;

pub use batch_driver::BatchDriver;
pub use classifier::ClassificationClient;
pub use fingerprinter::content_fingerprint;
pub use image_loader::{ImageLoadError, PreparedImage};
pub use ledger::{LedgerError, LedgerIndex, LedgerWriter};
pub use rate_governor::{RateDecision, RateGovernor};
pub use scanner::{ImageScanner, ScanError};
pub use summary::{SummaryError, SummaryRow};
pub use vision_client::{VisionClient, VisionError};
