//! Classify-and-ledger engine for the shoebox suite
//!
//! One generic batch pipeline (scan, de-duplicate, throttle, classify,
//! append) configured by a [`types::PipelineSpec`] per variant (personal
//! photos, tattoo images). The binary in `main.rs` wires the two variants
//! to clap subcommands.

pub mod config;
pub mod services;
pub mod types;
