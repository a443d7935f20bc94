//! Multi-year crime-rate trend analysis.
//!
//! Rates are incidents per 100,000 population. Communities with an
//! unknown or non-positive population are silently excluded — an
//! undefined rate is not an error. The year-over-year delta for a
//! community compares against its nearest *earlier surviving* year,
//! which is not necessarily `year - 1` when a year was excluded.

use crime_stats_models::TrendRow;
use duckdb::Connection;

use crate::{AnalyticsError, round2};

/// Computes per-community crime rates for each year in the inclusive
/// range, with year-over-year deltas.
///
/// Output is sorted by year descending, then crime rate descending;
/// the sort is stable so rate ties keep the store's community order.
///
/// # Errors
///
/// Returns [`AnalyticsError`] if the store query fails.
pub fn calculate_crime_rate_trends(
    conn: &Connection,
    start_year: i32,
    end_year: i32,
) -> Result<Vec<TrendRow>, AnalyticsError> {
    let totals = crime_stats_database::aggregates::yearly_totals(conn, start_year, end_year)?;

    let mut rows: Vec<TrendRow> = Vec::new();
    let mut prev: Option<(&str, f64)> = None;

    // Totals arrive ordered by community, then year ascending, so the
    // previous surviving row for the same community is simply the last
    // one pushed for it.
    for total in &totals {
        let Some(population) = total.population.filter(|&p| p > 0) else {
            continue;
        };

        #[allow(clippy::cast_precision_loss)]
        let crime_rate = round2(total.incidents as f64 * 100_000.0 / population as f64);

        let year_over_year_change = match prev {
            Some((community, prev_rate)) if community == total.community => {
                Some(round2(crime_rate - prev_rate))
            }
            _ => None,
        };

        rows.push(TrendRow {
            year: total.year,
            community: total.community.clone(),
            incidents: total.incidents,
            population,
            crime_rate,
            year_over_year_change,
        });

        prev = Some((total.community.as_str(), crime_rate));
    }

    rows.sort_by(|a, b| {
        b.year
            .cmp(&a.year)
            .then_with(|| b.crime_rate.total_cmp(&a.crime_rate))
    });

    log::debug!(
        "Trend analysis {start_year}-{end_year}: {} community-year rows",
        rows.len(),
    );

    Ok(rows)
}
