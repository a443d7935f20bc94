//! `DuckDB`-backed incident and demographic storage.
//!
//! One `DuckDB` file holds the `crime_stats` table (one row per
//! sector/community/category/date aggregate) and the `community_stats`
//! demographics table. Duplicate keys upsert: re-ingesting an existing
//! key overwrites its count and coordinates (last write wins).

use std::collections::BTreeMap;
use std::path::Path;

use chrono::NaiveDate;
use crime_stats_models::{CommunityStats, IncidentRecord};
use duckdb::Connection;

use crate::DbError;

/// Number of rows per INSERT chunk.
const CHUNK_SIZE: usize = 1_000;

/// Opens (or creates) the crime statistics `DuckDB` database and ensures
/// the schema exists.
///
/// Safe to call on every process start; tables and indexes are created
/// only if absent.
///
/// # Errors
///
/// Returns [`DbError`] if the connection or schema creation fails.
pub fn open(path: &Path) -> Result<Connection, DbError> {
    if let Some(parent) = path.parent() {
        crate::paths::ensure_dir(parent)?;
    }

    let conn = Connection::open(path)?;
    create_schema(&conn)?;

    Ok(conn)
}

/// Opens a read-only connection to an existing database.
///
/// `DuckDB` permits many concurrent read-only handles on one file but
/// only a single read-write instance, so concurrent analyses each take
/// one of these instead of sharing the writer handle. The schema must
/// already exist (any prior [`open`] call ensures it).
///
/// # Errors
///
/// Returns [`DbError`] if the connection fails.
pub fn open_read_only(path: &Path) -> Result<Connection, DbError> {
    let config = duckdb::Config::default().access_mode(duckdb::AccessMode::ReadOnly)?;
    Ok(Connection::open_with_flags(path, config)?)
}

/// Opens an in-memory database with the schema applied.
///
/// Used for ephemeral analysis and tests; nothing written here survives
/// the connection.
///
/// # Errors
///
/// Returns [`DbError`] if the connection or schema creation fails.
pub fn open_in_memory() -> Result<Connection, DbError> {
    let conn = Connection::open_in_memory()?;
    create_schema(&conn)?;
    Ok(conn)
}

fn create_schema(conn: &Connection) -> Result<(), DbError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS crime_stats (
            sector VARCHAR NOT NULL,
            community VARCHAR NOT NULL,
            category VARCHAR NOT NULL,
            date DATE NOT NULL,
            \"count\" INTEGER NOT NULL,
            year INTEGER NOT NULL,
            month INTEGER NOT NULL,
            longitude DOUBLE NOT NULL,
            latitude DOUBLE NOT NULL,
            UNIQUE (sector, community, category, date)
        );

        CREATE TABLE IF NOT EXISTS community_stats (
            community VARCHAR NOT NULL UNIQUE,
            population BIGINT,
            median_income DOUBLE,
            area_sqkm DOUBLE
        );

        CREATE INDEX IF NOT EXISTS idx_crime_stats_date
            ON crime_stats (date);
        CREATE INDEX IF NOT EXISTS idx_crime_stats_community
            ON crime_stats (community);",
    )?;

    Ok(())
}

/// Inserts a batch of incident records.
///
/// Uses multi-row INSERT with ON CONFLICT to upsert on the
/// `(sector, community, category, date)` key. Rows are written in chunks
/// of [`CHUNK_SIZE`] and are visible to queries once the call returns.
///
/// Returns the number of rows affected.
///
/// # Errors
///
/// Returns [`DbError`] if any database operation fails.
pub fn insert_incidents(
    conn: &Connection,
    records: &[IncidentRecord],
) -> Result<u64, DbError> {
    if records.is_empty() {
        return Ok(0);
    }

    // Deduplicate within the batch: keep the last occurrence of each key,
    // since DuckDB rejects a single INSERT touching the same key twice.
    type Key<'a> = (&'a str, &'a str, &'a str, NaiveDate);
    let mut last_seen: BTreeMap<Key<'_>, usize> = BTreeMap::new();
    for (i, record) in records.iter().enumerate() {
        last_seen.insert(
            (
                record.sector.as_str(),
                record.community.as_str(),
                record.category.as_str(),
                record.date,
            ),
            i,
        );
    }
    let deduped: Vec<&IncidentRecord> = records
        .iter()
        .enumerate()
        .filter(|(i, r)| {
            last_seen.get(&(
                r.sector.as_str(),
                r.community.as_str(),
                r.category.as_str(),
                r.date,
            )) == Some(i)
        })
        .map(|(_, r)| r)
        .collect();

    if deduped.len() < records.len() {
        log::info!(
            "Deduplicated INSERT batch: {} -> {} rows ({} duplicates removed)",
            records.len(),
            deduped.len(),
            records.len() - deduped.len(),
        );
    }

    let mut total_inserted = 0u64;

    for chunk in deduped.chunks(CHUNK_SIZE) {
        let mut sql = String::from(
            "INSERT INTO crime_stats (
                sector, community, category, date, \"count\",
                year, month, longitude, latitude
            ) VALUES ",
        );

        for (i, _) in chunk.iter().enumerate() {
            if i > 0 {
                sql.push_str(", ");
            }
            sql.push_str("(?, ?, ?, ?, ?, ?, ?, ?, ?)");
        }

        sql.push_str(
            " ON CONFLICT (sector, community, category, date) DO UPDATE SET
                \"count\" = EXCLUDED.\"count\",
                year = EXCLUDED.year,
                month = EXCLUDED.month,
                longitude = EXCLUDED.longitude,
                latitude = EXCLUDED.latitude",
        );

        let mut stmt = conn.prepare(&sql)?;
        let mut param_idx = 1usize;

        for record in chunk {
            stmt.raw_bind_parameter(param_idx, &record.sector)?;
            stmt.raw_bind_parameter(param_idx + 1, &record.community)?;
            stmt.raw_bind_parameter(param_idx + 2, &record.category)?;
            stmt.raw_bind_parameter(
                param_idx + 3,
                record.date.format("%Y-%m-%d").to_string(),
            )?;
            stmt.raw_bind_parameter(param_idx + 4, i64::from(record.count))?;
            stmt.raw_bind_parameter(param_idx + 5, record.year)?;
            stmt.raw_bind_parameter(param_idx + 6, i64::from(record.month))?;
            stmt.raw_bind_parameter(param_idx + 7, record.longitude)?;
            stmt.raw_bind_parameter(param_idx + 8, record.latitude)?;

            param_idx += 9;
        }

        let rows = stmt.raw_execute()?;
        total_inserted += u64::try_from(rows).unwrap_or(0);
    }

    Ok(total_inserted)
}

/// Upserts demographic rows keyed by community name.
///
/// Returns the number of rows affected.
///
/// # Errors
///
/// Returns [`DbError`] if any database operation fails.
pub fn upsert_communities(
    conn: &Connection,
    communities: &[CommunityStats],
) -> Result<u64, DbError> {
    if communities.is_empty() {
        return Ok(0);
    }

    let mut stmt = conn.prepare(
        "INSERT INTO community_stats (community, population, median_income, area_sqkm)
         VALUES (?, ?, ?, ?)
         ON CONFLICT (community) DO UPDATE SET
            population = EXCLUDED.population,
            median_income = EXCLUDED.median_income,
            area_sqkm = EXCLUDED.area_sqkm",
    )?;

    let mut total = 0u64;

    for stats in communities {
        let rows = stmt.execute(duckdb::params![
            stats.community,
            stats.population,
            stats.median_income,
            stats.area_sqkm,
        ])?;
        total += u64::try_from(rows).unwrap_or(0);
    }

    Ok(total)
}

/// Returns the number of stored incident rows.
///
/// # Errors
///
/// Returns [`DbError`] if the query fails.
pub fn incident_count(conn: &Connection) -> Result<u64, DbError> {
    let mut stmt = conn.prepare("SELECT COUNT(*) FROM crime_stats")?;
    let count: i64 = stmt.query_row([], |row| row.get(0))?;
    Ok(u64::try_from(count).unwrap_or(0))
}

/// Returns the number of stored demographic rows.
///
/// # Errors
///
/// Returns [`DbError`] if the query fails.
pub fn community_count(conn: &Connection) -> Result<u64, DbError> {
    let mut stmt = conn.prepare("SELECT COUNT(*) FROM community_stats")?;
    let count: i64 = stmt.query_row([], |row| row.get(0))?;
    Ok(u64::try_from(count).unwrap_or(0))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(community: &str, date: (i32, u32, u32), count: u32) -> IncidentRecord {
        IncidentRecord::new(
            "CENTRE",
            community,
            "Theft",
            NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
            count,
            -114.07,
            51.04,
        )
    }

    #[test]
    fn schema_creation_is_idempotent() {
        let conn = open_in_memory().unwrap();
        create_schema(&conn).unwrap();
        assert_eq!(incident_count(&conn).unwrap(), 0);
    }

    #[test]
    fn inserts_are_visible_to_queries() {
        let conn = open_in_memory().unwrap();
        let inserted = insert_incidents(
            &conn,
            &[record("Downtown", (2023, 1, 5), 4), record("Sunnyside", (2023, 1, 6), 2)],
        )
        .unwrap();
        assert_eq!(inserted, 2);
        assert_eq!(incident_count(&conn).unwrap(), 2);
    }

    #[test]
    fn duplicate_key_upserts_last_write() {
        let conn = open_in_memory().unwrap();
        insert_incidents(&conn, &[record("Downtown", (2023, 1, 5), 4)]).unwrap();
        insert_incidents(&conn, &[record("Downtown", (2023, 1, 5), 9)]).unwrap();

        assert_eq!(incident_count(&conn).unwrap(), 1);

        let mut stmt = conn
            .prepare("SELECT \"count\" FROM crime_stats WHERE community = ?")
            .unwrap();
        let count: i64 = stmt.query_row(["Downtown"], |row| row.get(0)).unwrap();
        assert_eq!(count, 9);
    }

    #[test]
    fn in_batch_duplicates_keep_last_occurrence() {
        let conn = open_in_memory().unwrap();
        insert_incidents(
            &conn,
            &[record("Downtown", (2023, 1, 5), 4), record("Downtown", (2023, 1, 5), 7)],
        )
        .unwrap();

        let mut stmt = conn
            .prepare("SELECT \"count\" FROM crime_stats WHERE community = ?")
            .unwrap();
        let count: i64 = stmt.query_row(["Downtown"], |row| row.get(0)).unwrap();
        assert_eq!(count, 7);
    }

    #[test]
    fn concurrent_read_only_handles_see_committed_data() {
        let path = std::env::temp_dir().join(format!("crime_stats_ro_{}.duckdb", std::process::id()));
        let _ = std::fs::remove_file(&path);

        let conn = open(&path).unwrap();
        insert_incidents(&conn, &[record("Downtown", (2023, 1, 5), 4)]).unwrap();
        drop(conn);

        let reader_a = open_read_only(&path).unwrap();
        let reader_b = open_read_only(&path).unwrap();
        assert_eq!(incident_count(&reader_a).unwrap(), 1);
        assert_eq!(incident_count(&reader_b).unwrap(), 1);

        drop(reader_a);
        drop(reader_b);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn upserts_community_demographics() {
        let conn = open_in_memory().unwrap();
        let stats = CommunityStats {
            community: "Downtown".to_string(),
            population: Some(50_000),
            median_income: Some(78_000.0),
            area_sqkm: Some(3.2),
        };
        upsert_communities(&conn, &[stats.clone()]).unwrap();
        upsert_communities(
            &conn,
            &[CommunityStats {
                population: Some(51_000),
                ..stats
            }],
        )
        .unwrap();

        assert_eq!(community_count(&conn).unwrap(), 1);

        let mut stmt = conn
            .prepare("SELECT population FROM community_stats WHERE community = ?")
            .unwrap();
        let population: i64 = stmt.query_row(["Downtown"], |row| row.get(0)).unwrap();
        assert_eq!(population, 51_000);
    }
}
