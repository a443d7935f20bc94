#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Aggregation engine for crime statistics.
//!
//! Turns stored incident rows into two derived reports: per-community
//! hotspot summaries ([`hotspots`]) and per-community, per-year crime
//! rates with year-over-year deltas ([`trends`]). Both operations are
//! read-only and side-effect-free; running either twice against an
//! unchanged store returns identical output.

pub mod hotspots;
pub mod trends;

pub use hotspots::analyze_crime_hotspots;
pub use trends::calculate_crime_rate_trends;

/// Default minimum monthly incident total for a month to count as
/// "active" in hotspot analysis.
pub const DEFAULT_MIN_INCIDENTS: u32 = 5;

/// Errors that can occur during analysis.
#[derive(Debug, thiserror::Error)]
pub enum AnalyticsError {
    /// Underlying store error.
    #[error("Database error: {0}")]
    Database(#[from] crime_stats_database::DbError),
}

/// Rounds to 2 decimal places, half away from zero.
///
/// This is the single rounding policy for rates and rate deltas, pinned
/// so report fixtures are reproducible.
#[must_use]
pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::round2;

    #[test]
    fn rounds_to_two_decimal_places() {
        assert!((round2(2.346) - 2.35).abs() < 1e-9);
        assert!((round2(2.344) - 2.34).abs() < 1e-9);
        assert!((round2(-2.346) - -2.35).abs() < 1e-9);
        assert!((round2(1000.0) - 1000.0).abs() < 1e-9);
    }
}
