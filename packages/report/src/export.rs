//! Delimited tabular exports of the derived report rows.

use std::path::Path;

use crime_stats_models::{HotspotRow, TrendRow};

use crate::ReportError;

/// Writes hotspot rows to a CSV file, one row per community.
///
/// # Errors
///
/// Returns [`ReportError`] if the file cannot be written.
pub fn write_hotspots_csv(path: &Path, rows: &[HotspotRow]) -> Result<(), ReportError> {
    write_rows(path, rows)?;
    log::info!("Wrote {} hotspot rows to {}", rows.len(), path.display());
    Ok(())
}

/// Writes trend rows to a CSV file, one row per (year, community).
///
/// A `None` year-over-year change serializes as an empty field.
///
/// # Errors
///
/// Returns [`ReportError`] if the file cannot be written.
pub fn write_trends_csv(path: &Path, rows: &[TrendRow]) -> Result<(), ReportError> {
    write_rows(path, rows)?;
    log::info!("Wrote {} trend rows to {}", rows.len(), path.display());
    Ok(())
}

fn write_rows<T: serde::Serialize>(path: &Path, rows: &[T]) -> Result<(), ReportError> {
    let mut writer = csv::Writer::from_path(path)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}
