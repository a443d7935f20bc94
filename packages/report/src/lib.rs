#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Report sink for the crime statistics toolchain.
//!
//! Serializes the two derived reports to delimited files ([`export`])
//! and renders the hotspot rows as a self-contained heatmap document
//! ([`heatmap`]). Derived rows are never persisted back to the store;
//! these writers are their only durable output.

pub mod export;
pub mod heatmap;

/// Errors that can occur while writing reports.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    /// CSV serialization error.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// I/O error writing an output file.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error (heat point array).
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
