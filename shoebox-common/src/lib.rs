//! Shared foundation for the shoebox suite
//!
//! Carries the pieces both pipeline binaries need: the common error type,
//! TOML configuration loading, and timestamp helpers.

pub mod config;
pub mod error;
pub mod time;

pub use error::{Error, Result};
