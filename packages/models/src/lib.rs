#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Row types for the crime statistics toolchain.
//!
//! These types represent the shapes of data as stored in and retrieved
//! from the store (`IncidentRecord`, `CommunityStats`), the intermediate
//! aggregate shapes the store hands to the analytics engine
//! (`MonthlyTotal`, `YearlyTotal`), and the derived report rows
//! (`HotspotRow`, `TrendRow`) consumed by the report sink.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// One observed crime incident aggregate for a given
/// sector/community/category/date.
///
/// `(sector, community, category, date)` identifies at most one stored
/// row. `year` and `month` are denormalized from `date` so year-scoped
/// scans never need date arithmetic; use [`IncidentRecord::new`] to keep
/// them consistent at write time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncidentRecord {
    /// Administrative zone name.
    pub sector: String,
    /// Neighborhood name (primary grouping key).
    pub community: String,
    /// Crime type label.
    pub category: String,
    /// Day the incidents were observed.
    pub date: NaiveDate,
    /// Number of incidents of this category on this date.
    pub count: u32,
    /// Year component of `date`.
    pub year: i32,
    /// Month component of `date` (1-12).
    pub month: u32,
    /// Longitude (WGS84).
    pub longitude: f64,
    /// Latitude (WGS84).
    pub latitude: f64,
}

impl IncidentRecord {
    /// Creates a record with `year` and `month` derived from `date`.
    #[must_use]
    pub fn new(
        sector: impl Into<String>,
        community: impl Into<String>,
        category: impl Into<String>,
        date: NaiveDate,
        count: u32,
        longitude: f64,
        latitude: f64,
    ) -> Self {
        Self {
            sector: sector.into(),
            community: community.into(),
            category: category.into(),
            date,
            count,
            year: date.year(),
            month: date.month(),
            longitude,
            latitude,
        }
    }
}

/// Demographic reference data, one row per community.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommunityStats {
    /// Neighborhood name (unique key, joins to
    /// [`IncidentRecord::community`]).
    pub community: String,
    /// Resident population; `None` when unknown. Communities with an
    /// unknown or zero population are excluded from rate computation.
    pub population: Option<i64>,
    /// Median household income (carried, unused by current reports).
    pub median_income: Option<f64>,
    /// Land area in square kilometers (carried, unused by current
    /// reports).
    pub area_sqkm: Option<f64>,
}

/// Per-(community, month) incident total for one analysis year, after
/// the minimum-incidents threshold has been applied.
///
/// Coordinates are the mean across the month's surviving records.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyTotal {
    /// Neighborhood name.
    pub community: String,
    /// Month (1-12).
    pub month: u32,
    /// Mean longitude of the month's records.
    pub longitude: f64,
    /// Mean latitude of the month's records.
    pub latitude: f64,
    /// Summed incident count for the month.
    pub incident_count: u64,
}

/// Per-(year, community) incident total with outer-joined population.
#[derive(Debug, Clone, PartialEq)]
pub struct YearlyTotal {
    /// Data year.
    pub year: i32,
    /// Neighborhood name.
    pub community: String,
    /// Summed incident count for the year.
    pub incidents: u64,
    /// Population from the demographics table; `None` when the
    /// community has no demographic row.
    pub population: Option<i64>,
}

/// One hotspot summary row: a community with at least one month whose
/// incident count met the minimum threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HotspotRow {
    /// Neighborhood name.
    pub community: String,
    /// Mean longitude, unweighted across surviving months.
    pub avg_longitude: f64,
    /// Mean latitude, unweighted across surviving months.
    pub avg_latitude: f64,
    /// Number of distinct months that met the threshold.
    pub active_months: u32,
    /// Sum of the surviving monthly totals.
    pub total_incidents: u64,
}

/// One crime-rate trend row for a (year, community) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendRow {
    /// Data year.
    pub year: i32,
    /// Neighborhood name.
    pub community: String,
    /// Total incidents for the year.
    pub incidents: u64,
    /// Community population used as the rate denominator.
    pub population: i64,
    /// Incidents per 100,000 population, rounded to 2 decimal places.
    pub crime_rate: f64,
    /// Rate difference from the community's nearest earlier surviving
    /// year; `None` for its first year in the series.
    pub year_over_year_change: Option<f64>,
}
