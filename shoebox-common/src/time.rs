//! Timestamp utilities

use chrono::Local;

/// Format used for the ledger's `Processed Date` column
pub const LEDGER_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Current local time formatted for the ledger, e.g. `2026-03-01 14:30:00`
pub fn ledger_timestamp() -> String {
    Local::now().format(LEDGER_TIMESTAMP_FORMAT).to_string()
}
