//! EAIP Importer Library
//!
//! A Rust library for importing vendor-packaged electronic AIP chart archives
//! into a normalized, per-AIRAC-cycle chart library.
//!
//! This library provides tools for:
//! - Extracting (optionally password protected) ZIP archives with free-space preflight
//! - Detecting the AIRAC period and vendor directory of an extracted cycle
//! - Renaming charts from the vendor's JSON manifests and categorizing them per airport
//! - Writing `index.json` files and merging multi-part chart documents
//! - Querying the resulting library by airport, category, runway or keyword
//! - Running imports in the background with monotonic progress events

pub mod archive;
pub mod config;
pub mod constants;
pub mod error;
pub mod models;
pub mod pdf;
pub mod period;
pub mod pipeline;
pub mod processor;
pub mod query;

// CLI modules
pub mod cli {
    pub mod args;
    pub mod commands;
}

// Re-export commonly used types
pub use config::ImporterConfig;
pub use error::{EaipError, ErrorClass, Result};
pub use models::{AirportSummary, ImportEvent, ImportOutcome, ImportProgress, IndexEntry};
pub use pipeline::{ImportHandle, ImportRequest, ImportWorker};
pub use query::{ChartFilter, ChartLibrary, ChartPayload};
