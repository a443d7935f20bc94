#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CSV ingestion for the crime statistics store.
//!
//! Loads are fail-fast: header validation and row parsing both complete
//! before a single row is inserted, so a malformed file never leaves the
//! store partially loaded. Ingestion is strictly sequential and
//! single-writer; the store itself chunks inserts (1000 rows per chunk).

mod csv_source;

pub use csv_source::{load_communities_csv, load_incidents_csv};

/// Errors that can occur during ingestion.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    /// The input file is missing required columns.
    #[error("Input is missing required columns: {}", missing.join(", "))]
    MissingColumns {
        /// The required column names that were not found.
        missing: Vec<String>,
    },

    /// A row's fields could not be parsed.
    #[error("Invalid row at line {line}: {message}")]
    InvalidRow {
        /// 1-based line number in the input file (header is line 1).
        line: u64,
        /// Description of the parse failure.
        message: String,
    },

    /// CSV read error.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// I/O error opening the input file.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Store error while writing the batch.
    #[error(transparent)]
    Db(#[from] crime_stats_database::DbError),
}
