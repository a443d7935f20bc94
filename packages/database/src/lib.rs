#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Embedded `DuckDB` storage for crime incident and demographic data.
//!
//! The store is a single `DuckDB` file holding the `crime_stats` and
//! `community_stats` tables. [`store::open`] is idempotent (create-if-absent
//! schema) and safe to call on every process start. Aggregate queries used
//! by the analytics engine live in [`aggregates`].

pub mod aggregates;
pub mod paths;
pub mod store;

/// Errors that can occur during database operations.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// `DuckDB` error.
    #[error("DuckDB error: {0}")]
    DuckDb(#[from] duckdb::Error),

    /// I/O error (e.g. creating the data directory).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
