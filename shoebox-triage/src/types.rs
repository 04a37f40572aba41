//! Core types for the classify-and-ledger engine
//!
//! The engine is written once and configured per pipeline variant through
//! [`PipelineSpec`]: instruction template, attribute schema, ledger columns.

use async_trait::async_trait;
use std::path::Path;

/// Ledger column holding the image path (always first)
pub const PATH_COLUMN: &str = "Image Path";
/// Ledger column holding the content fingerprint (photo pipeline only)
pub const HASH_COLUMN: &str = "Image Hash";
/// Ledger column holding the classification timestamp (always last)
pub const DATE_COLUMN: &str = "Processed Date";

/// One attribute column of a pipeline's ledger schema
///
/// `label` doubles as the ledger column header and as the literal line
/// prefix expected in the inference response (`"Category: ..."`).
#[derive(Debug, Clone, Copy)]
pub struct AttributeField {
    /// Column header and response line label
    pub label: &'static str,
    /// Fixed placeholder written when classification fails
    pub error_value: &'static str,
}

/// Static description of one pipeline variant
#[derive(Debug)]
pub struct PipelineSpec {
    /// Short variant name used in logs
    pub name: &'static str,
    /// Instruction sent to the inference service with every image
    pub instruction: &'static str,
    /// Attribute columns, in ledger and response order
    pub fields: &'static [AttributeField],
    /// Whether the ledger schema carries an `Image Hash` column. Without
    /// it, de-duplication degrades to the path check alone.
    pub hash_column: bool,
    /// Ledger file name used when none is configured
    pub default_ledger: &'static str,
    /// Extra column whose distribution is printed after a run, beyond the
    /// primary attribute
    pub secondary_summary: Option<&'static str>,
}

const PHOTO_INSTRUCTION: &str = "\
Analyze this personal photo and provide:
1. Event/Category (e.g., Wedding, Birthday, Screenshot, Family Gathering, Travel, etc.)
2. If Wedding: Whose wedding? (e.g., \"Your wedding\", \"Friend's wedding\", \"Unknown wedding\")
3. People present (e.g., You, Family members, Friends, Colleagues, etc.)
4. Location type (e.g., Indoors, Outdoors, Beach, Restaurant, etc.)
5. Brief description of the content

Format your response exactly like this, with each item on a new line:
Category: [category]
Wedding: [whose wedding or \"N/A\"]
People: [people present]
Location: [location type]
Description: [brief description]
";

const PHOTO_FIELDS: &[AttributeField] = &[
    AttributeField { label: "Category", error_value: "Error" },
    AttributeField { label: "Wedding", error_value: "N/A" },
    AttributeField { label: "People", error_value: "Unknown" },
    AttributeField { label: "Location", error_value: "Unknown" },
    AttributeField { label: "Description", error_value: "Error" },
];

const TATTOO_INSTRUCTION: &str = "\
Analyze this tattoo image and provide:
1. Primary tattoo style (most likely style)
2. Secondary tattoo style (another possible style)
3. Detailed description of the tattoo's content and special features

Format your response exactly like this, with each item on a new line:
Primary Style: [style]
Secondary Style: [style]
Description: [detailed description]
";

const TATTOO_FIELDS: &[AttributeField] = &[
    AttributeField { label: "Primary Style", error_value: "Error" },
    AttributeField { label: "Secondary Style", error_value: "Error" },
    AttributeField { label: "Description", error_value: "Error" },
];

static PHOTOS: PipelineSpec = PipelineSpec {
    name: "photos",
    instruction: PHOTO_INSTRUCTION,
    fields: PHOTO_FIELDS,
    hash_column: true,
    default_ledger: "photo_analysis.csv",
    secondary_summary: Some("Wedding"),
};

static TATTOOS: PipelineSpec = PipelineSpec {
    name: "tattoos",
    instruction: TATTOO_INSTRUCTION,
    fields: TATTOO_FIELDS,
    hash_column: false,
    default_ledger: "tattoo_analysis.csv",
    secondary_summary: None,
};

impl PipelineSpec {
    /// Personal photo triage pipeline
    pub fn photos() -> &'static PipelineSpec {
        &PHOTOS
    }

    /// Tattoo classification pipeline
    pub fn tattoos() -> &'static PipelineSpec {
        &TATTOOS
    }

    /// Full ledger column list, in row order
    pub fn columns(&self) -> Vec<&'static str> {
        let mut columns = vec![PATH_COLUMN];
        if self.hash_column {
            columns.push(HASH_COLUMN);
        }
        columns.extend(self.fields.iter().map(|f| f.label));
        columns.push(DATE_COLUMN);
        columns
    }

    /// Attribute values recorded when classification fails
    ///
    /// Every field gets its fixed placeholder; the final (description)
    /// field carries the human-readable failure reason instead.
    pub fn sentinel_attributes(&self, reason: &str) -> Vec<String> {
        let mut values: Vec<String> = self
            .fields
            .iter()
            .map(|f| f.error_value.to_string())
            .collect();
        if let Some(last) = values.last_mut() {
            *last = reason.to_string();
        }
        values
    }

    /// Whether an attribute set is a sentinel error record
    ///
    /// The first field's placeholder (`Error`) never appears in genuine
    /// model output for these schemas, so it identifies failures.
    pub fn is_sentinel(&self, attributes: &[String]) -> bool {
        match (attributes.first(), self.fields.first()) {
            (Some(value), Some(field)) => value == field.error_value,
            _ => false,
        }
    }
}

/// One row of the ledger
#[derive(Debug, Clone)]
pub struct ImageRecord {
    /// File path as scanned; the human-facing identity
    pub path: String,
    /// Bounded-prefix content digest; `None` for schemas without a hash
    /// column
    pub content_hash: Option<String>,
    /// Positional attribute values matching the pipeline's fields
    pub attributes: Vec<String>,
    /// Classification timestamp, informational only
    pub processed_at: String,
}

/// Per-invocation counters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunStats {
    /// Candidate images handed to the driver
    pub discovered: usize,
    /// Skipped because the path was already in the ledger
    pub skipped_by_path: usize,
    /// Skipped because the content hash was already in the ledger
    pub skipped_by_hash: usize,
    /// Rows written this run (genuine and sentinel)
    pub processed: usize,
    /// Subset of `processed` written as sentinel error records
    pub failed: usize,
}

/// Why the driver stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Candidate list ran out
    Exhausted,
    /// Daily call budget spent; remaining candidates left for the next run
    DailyLimitReached,
}

/// Outcome of one driver invocation
#[derive(Debug, Clone)]
pub struct RunReport {
    pub stats: RunStats,
    pub stop_reason: StopReason,
}

/// Seam between the batch driver and the inference round trip
///
/// Implementations never fail: any per-image problem (decode, network,
/// malformed response) is converted into the pipeline's sentinel attribute
/// values so the ledger always advances.
#[async_trait]
pub trait Classify: Send + Sync {
    async fn classify(&self, path: &Path) -> Vec<String>;
}
