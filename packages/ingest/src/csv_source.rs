//! Delimited-file loaders for incident and demographic data.

use std::path::Path;

use chrono::NaiveDate;
use crime_stats_models::{CommunityStats, IncidentRecord};
use duckdb::Connection;

use crate::IngestError;

/// Columns that must be present in an incident CSV.
const REQUIRED_INCIDENT_COLUMNS: &[&str] =
    &["Community", "Category", "Count", "Year", "Month", "Date"];

/// Columns that must be present in a demographics CSV.
const REQUIRED_COMMUNITY_COLUMNS: &[&str] = &["Community", "Population"];

/// Header lookup by case-insensitive column name.
struct Columns {
    headers: Vec<String>,
}

impl Columns {
    fn from_reader<R: std::io::Read>(
        reader: &mut csv::Reader<R>,
        required: &[&str],
    ) -> Result<Self, IngestError> {
        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.trim().to_owned())
            .collect();

        let missing: Vec<String> = required
            .iter()
            .filter(|name| !headers.iter().any(|h| h.eq_ignore_ascii_case(name)))
            .map(|name| (*name).to_string())
            .collect();

        if missing.is_empty() {
            Ok(Self { headers })
        } else {
            Err(IngestError::MissingColumns { missing })
        }
    }

    fn index(&self, name: &str) -> Option<usize> {
        self.headers
            .iter()
            .position(|h| h.eq_ignore_ascii_case(name))
    }

    fn get<'a>(&self, record: &'a csv::StringRecord, name: &str) -> &'a str {
        self.index(name)
            .and_then(|i| record.get(i))
            .unwrap_or("")
            .trim()
    }
}

fn invalid_row(line: u64, message: impl Into<String>) -> IngestError {
    IngestError::InvalidRow {
        line,
        message: message.into(),
    }
}

fn parse_field<T: std::str::FromStr>(
    value: &str,
    name: &str,
    line: u64,
) -> Result<T, IngestError>
where
    T::Err: std::fmt::Display,
{
    value
        .parse()
        .map_err(|e| invalid_row(line, format!("{name} {value:?}: {e}")))
}

/// Loads incident records from a CSV file into the store.
///
/// Required columns: `Community, Category, Count, Year, Month, Date`;
/// a missing column fails the entire load before any insert. Optional
/// columns `Sector`, `Longitude`, `Latitude` default to empty/0.0.
/// `year` and `month` are re-derived from the parsed date rather than
/// trusted from the `Year`/`Month` columns, keeping the write-time
/// invariant regardless of what the file claims.
///
/// Returns the number of rows written.
///
/// # Errors
///
/// Returns [`IngestError`] if validation, parsing, or the store write
/// fails. On error nothing has been committed.
pub fn load_incidents_csv(conn: &Connection, path: &Path) -> Result<u64, IngestError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)?;
    let columns = Columns::from_reader(&mut reader, REQUIRED_INCIDENT_COLUMNS)?;

    let mut records: Vec<IncidentRecord> = Vec::new();

    for (i, result) in reader.records().enumerate() {
        let line = u64::try_from(i).unwrap_or(0) + 2;
        let row = result?;

        let date_str = columns.get(&row, "Date");
        let date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
            .map_err(|e| invalid_row(line, format!("Date {date_str:?}: {e}")))?;
        let count: u32 = parse_field(columns.get(&row, "Count"), "Count", line)?;

        let longitude = parse_optional_f64(columns.get(&row, "Longitude"), "Longitude", line)?;
        let latitude = parse_optional_f64(columns.get(&row, "Latitude"), "Latitude", line)?;

        records.push(IncidentRecord::new(
            columns.get(&row, "Sector"),
            columns.get(&row, "Community"),
            columns.get(&row, "Category"),
            date,
            count,
            longitude,
            latitude,
        ));
    }

    let written = crime_stats_database::store::insert_incidents(conn, &records)?;
    log::info!(
        "Loaded {written} incident rows from {}",
        path.display(),
    );

    Ok(written)
}

fn parse_optional_f64(value: &str, name: &str, line: u64) -> Result<f64, IngestError> {
    if value.is_empty() {
        Ok(0.0)
    } else {
        parse_field(value, name, line)
    }
}

/// Loads community demographic rows from a CSV file into the store.
///
/// Required columns: `Community, Population`; optional `MedianIncome`
/// and `AreaSqKm`. An empty population field loads as unknown (`NULL`),
/// which excludes the community from rate computation.
///
/// Returns the number of rows written.
///
/// # Errors
///
/// Returns [`IngestError`] if validation, parsing, or the store write
/// fails. On error nothing has been committed.
pub fn load_communities_csv(conn: &Connection, path: &Path) -> Result<u64, IngestError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)?;
    let columns = Columns::from_reader(&mut reader, REQUIRED_COMMUNITY_COLUMNS)?;

    let mut communities: Vec<CommunityStats> = Vec::new();

    for (i, result) in reader.records().enumerate() {
        let line = u64::try_from(i).unwrap_or(0) + 2;
        let row = result?;

        communities.push(CommunityStats {
            community: columns.get(&row, "Community").to_string(),
            population: parse_optional(columns.get(&row, "Population"), "Population", line)?,
            median_income: parse_optional(
                columns.get(&row, "MedianIncome"),
                "MedianIncome",
                line,
            )?,
            area_sqkm: parse_optional(columns.get(&row, "AreaSqKm"), "AreaSqKm", line)?,
        });
    }

    let written = crime_stats_database::store::upsert_communities(conn, &communities)?;
    log::info!(
        "Loaded {written} community rows from {}",
        path.display(),
    );

    Ok(written)
}

fn parse_optional<T: std::str::FromStr>(
    value: &str,
    name: &str,
    line: u64,
) -> Result<Option<T>, IngestError>
where
    T::Err: std::fmt::Display,
{
    if value.is_empty() {
        Ok(None)
    } else {
        parse_field(value, name, line).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use crime_stats_database::store;

    use super::*;

    fn temp_csv(name: &str, contents: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!("crime_stats_{}_{name}", std::process::id()));
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn loads_a_valid_incident_file() {
        let path = temp_csv(
            "valid.csv",
            "Sector,Community,Category,Count,Year,Month,Date,Longitude,Latitude\n\
             CENTRE,Downtown,Theft,4,2023,1,2023-01-05,-114.07,51.04\n\
             NORTH,Sunnyside,Assault,2,2023,2,2023-02-11,-114.10,51.06\n",
        );

        let conn = store::open_in_memory().unwrap();
        let written = load_incidents_csv(&conn, &path).unwrap();
        assert_eq!(written, 2);
        assert_eq!(store::incident_count(&conn).unwrap(), 2);
    }

    #[test]
    fn missing_required_column_fails_before_any_insert() {
        // No Category column.
        let path = temp_csv(
            "missing_col.csv",
            "Sector,Community,Count,Year,Month,Date\n\
             CENTRE,Downtown,4,2023,1,2023-01-05\n",
        );

        let conn = store::open_in_memory().unwrap();
        let err = load_incidents_csv(&conn, &path).unwrap_err();
        assert!(matches!(
            err,
            IngestError::MissingColumns { ref missing } if missing == &["Category"]
        ));
        assert_eq!(store::incident_count(&conn).unwrap(), 0);
    }

    #[test]
    fn bad_row_fails_the_whole_load() {
        let path = temp_csv(
            "bad_row.csv",
            "Community,Category,Count,Year,Month,Date\n\
             Downtown,Theft,4,2023,1,2023-01-05\n\
             Downtown,Theft,not-a-number,2023,1,2023-01-06\n",
        );

        let conn = store::open_in_memory().unwrap();
        let err = load_incidents_csv(&conn, &path).unwrap_err();
        assert!(matches!(err, IngestError::InvalidRow { line: 3, .. }));
        assert_eq!(store::incident_count(&conn).unwrap(), 0);
    }

    #[test]
    fn year_and_month_come_from_the_date_column() {
        // Year/Month columns lie; the parsed date wins.
        let path = temp_csv(
            "derived.csv",
            "Community,Category,Count,Year,Month,Date\n\
             Downtown,Theft,4,1999,12,2023-07-05\n",
        );

        let conn = store::open_in_memory().unwrap();
        load_incidents_csv(&conn, &path).unwrap();

        let mut stmt = conn
            .prepare("SELECT year, month FROM crime_stats")
            .unwrap();
        let (year, month): (i32, i32) = stmt
            .query_row([], |row| Ok((row.get(0)?, row.get(1)?)))
            .unwrap();
        assert_eq!((year, month), (2023, 7));
    }

    #[test]
    fn loads_communities_with_unknown_population() {
        let path = temp_csv(
            "communities.csv",
            "Community,Population,MedianIncome,AreaSqKm\n\
             Downtown,50000,78000.0,3.2\n\
             Newtown,,,\n",
        );

        let conn = store::open_in_memory().unwrap();
        let written = load_communities_csv(&conn, &path).unwrap();
        assert_eq!(written, 2);

        let mut stmt = conn
            .prepare("SELECT population FROM community_stats WHERE community = ?")
            .unwrap();
        let population: Option<i64> = stmt.query_row(["Newtown"], |row| row.get(0)).unwrap();
        assert_eq!(population, None);
    }
}
