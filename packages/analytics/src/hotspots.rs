//! Spatial hotspot analysis.
//!
//! A hotspot is a community with at least one "active" month — a month
//! whose summed incident count met the minimum threshold. The threshold
//! is applied per month, not to the final per-community total, so a
//! community with many quiet months and one busy one still qualifies.

use crime_stats_models::{HotspotRow, MonthlyTotal};
use duckdb::Connection;

use crate::AnalyticsError;

/// Computes hotspot summaries for the given year.
///
/// Months below `min_incidents` are discarded before grouping; a
/// community whose every month falls below the threshold is absent from
/// the result entirely (no zero rows). Output is sorted descending by
/// total incidents; ties keep the store's community order (the sort is
/// stable) so repeated runs are identical.
///
/// # Errors
///
/// Returns [`AnalyticsError`] if the store query fails.
pub fn analyze_crime_hotspots(
    conn: &Connection,
    year: i32,
    min_incidents: u32,
) -> Result<Vec<HotspotRow>, AnalyticsError> {
    let totals = crime_stats_database::aggregates::monthly_totals(conn, year, min_incidents)?;

    let mut rows = summarize(&totals);
    rows.sort_by(|a, b| b.total_incidents.cmp(&a.total_incidents));

    log::debug!(
        "Hotspot analysis for {year}: {} communities with >= 1 month over {min_incidents} incidents",
        rows.len(),
    );

    Ok(rows)
}

/// Collapses per-month totals into one row per community.
///
/// Input rows are grouped by contiguous community runs (the store orders
/// them by community), averaging coordinates unweighted across months.
fn summarize(totals: &[MonthlyTotal]) -> Vec<HotspotRow> {
    let mut rows: Vec<HotspotRow> = Vec::new();

    for total in totals {
        match rows.last_mut() {
            Some(row) if row.community == total.community => {
                row.avg_longitude += total.longitude;
                row.avg_latitude += total.latitude;
                row.active_months += 1;
                row.total_incidents += total.incident_count;
            }
            _ => rows.push(HotspotRow {
                community: total.community.clone(),
                avg_longitude: total.longitude,
                avg_latitude: total.latitude,
                active_months: 1,
                total_incidents: total.incident_count,
            }),
        }
    }

    for row in &mut rows {
        let months = f64::from(row.active_months);
        row.avg_longitude /= months;
        row.avg_latitude /= months;
    }

    rows
}
