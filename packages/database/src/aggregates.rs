//! Aggregate queries the analytics engine builds on.
//!
//! Both queries return rows in a deterministic order (community, then
//! month or year) so the engine's grouping and stable sorts produce
//! identical output across runs. `SUM` results are cast to `BIGINT` in
//! SQL since `DuckDB` widens integer sums to `HUGEINT`.

use crime_stats_models::{MonthlyTotal, YearlyTotal};
use duckdb::Connection;

use crate::DbError;

/// Returns, for each (community, month) of the given year, the summed
/// incident count, filtered to months meeting `min_incidents`.
///
/// Coordinates are averaged within each month group. Ordered by
/// community, then month.
///
/// # Errors
///
/// Returns [`DbError`] if the query fails.
pub fn monthly_totals(
    conn: &Connection,
    year: i32,
    min_incidents: u32,
) -> Result<Vec<MonthlyTotal>, DbError> {
    let mut stmt = conn.prepare(
        "SELECT community,
                month,
                AVG(longitude) AS longitude,
                AVG(latitude) AS latitude,
                CAST(SUM(\"count\") AS BIGINT) AS incident_count
         FROM crime_stats
         WHERE year = ?
         GROUP BY community, month
         HAVING SUM(\"count\") >= ?
         ORDER BY community, month",
    )?;

    let rows = stmt.query_map(
        duckdb::params![year, i64::from(min_incidents)],
        |row| {
            let month: i64 = row.get(1)?;
            let incident_count: i64 = row.get(4)?;
            Ok(MonthlyTotal {
                community: row.get(0)?,
                month: u32::try_from(month).unwrap_or(0),
                longitude: row.get(2)?,
                latitude: row.get(3)?,
                incident_count: u64::try_from(incident_count).unwrap_or(0),
            })
        },
    )?;

    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

/// Returns, for each (year, community) in the inclusive range, the
/// summed incident count and the community's population.
///
/// The demographics join is a LEFT JOIN: a community without a
/// demographic row yields `None` population, which the engine filters.
/// Ordered by community, then year ascending (the order the engine
/// walks when computing year-over-year changes).
///
/// # Errors
///
/// Returns [`DbError`] if the query fails.
pub fn yearly_totals(
    conn: &Connection,
    start_year: i32,
    end_year: i32,
) -> Result<Vec<YearlyTotal>, DbError> {
    let mut stmt = conn.prepare(
        "SELECT cs.year,
                cs.community,
                CAST(SUM(cs.\"count\") AS BIGINT) AS incidents,
                MAX(cst.population) AS population
         FROM crime_stats cs
         LEFT JOIN community_stats cst ON cs.community = cst.community
         WHERE cs.year BETWEEN ? AND ?
         GROUP BY cs.year, cs.community
         ORDER BY cs.community, cs.year",
    )?;

    let rows = stmt.query_map(duckdb::params![start_year, end_year], |row| {
        let incidents: i64 = row.get(2)?;
        Ok(YearlyTotal {
            year: row.get(0)?,
            community: row.get(1)?,
            incidents: u64::try_from(incidents).unwrap_or(0),
            population: row.get(3)?,
        })
    })?;

    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}
