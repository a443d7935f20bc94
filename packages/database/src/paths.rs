#![allow(clippy::module_name_repetitions)]
//! Canonical file paths for the `DuckDB` data directory.

use std::path::{Path, PathBuf};

/// Environment variable overriding the store file location.
pub const DB_PATH_ENV: &str = "CRIME_STATS_DB";

/// Returns the path of the crime statistics `DuckDB` file.
///
/// Honors the `CRIME_STATS_DB` environment variable, falling back to
/// `data/crime_stats.duckdb` relative to the working directory.
#[must_use]
pub fn db_path() -> PathBuf {
    std::env::var(DB_PATH_ENV).map_or_else(
        |_| Path::new("data").join("crime_stats.duckdb"),
        PathBuf::from,
    )
}

/// Ensures a directory exists, creating it if necessary.
///
/// # Errors
///
/// Returns an I/O error if the directory cannot be created.
pub fn ensure_dir(path: &Path) -> std::io::Result<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)?;
    }
    Ok(())
}
