//! Load -> analyze -> export pipeline.
//!
//! Ingestion runs first and fully completes before analysis starts; the
//! two analyses then run concurrently on blocking worker threads, each
//! with its own read-only store handle, and `try_join!` propagates the
//! first failure. Nothing here retries; this is a batch tool.

use std::path::{Path, PathBuf};

use chrono::Datelike;
use crime_stats_analytics::{analyze_crime_hotspots, calculate_crime_rate_trends};
use crime_stats_database::store;
use crime_stats_models::{HotspotRow, TrendRow};

/// Number of years of history included in the trend report, counting
/// back from the analysis year.
const TREND_LOOKBACK_YEARS: i32 = 3;

/// Resolved pipeline configuration.
pub struct Config {
    /// Incident CSV path.
    pub data: PathBuf,
    /// Optional demographics CSV path.
    pub communities: Option<PathBuf>,
    /// Analysis year; `None` means the current calendar year.
    pub year: Option<i32>,
    /// Active-month threshold for hotspot analysis.
    pub min_incidents: u32,
    /// Report output directory.
    pub output: PathBuf,
    /// Store file path.
    pub db: PathBuf,
}

/// Errors that abort the pipeline.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Store error.
    #[error(transparent)]
    Db(#[from] crime_stats_database::DbError),

    /// Ingestion error.
    #[error(transparent)]
    Ingest(#[from] crime_stats_ingest::IngestError),

    /// Analysis error.
    #[error(transparent)]
    Analytics(#[from] crime_stats_analytics::AnalyticsError),

    /// Report serialization error.
    #[error(transparent)]
    Report(#[from] crime_stats_report::ReportError),

    /// An analysis task panicked or was cancelled.
    #[error("Analysis task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    /// Output directory could not be created.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Runs the full batch workflow.
///
/// # Errors
///
/// Returns [`PipelineError`] on the first failing stage; later stages
/// do not run.
pub async fn run(config: Config) -> Result<(), PipelineError> {
    let year = config
        .year
        .unwrap_or_else(|| chrono::Local::now().year());

    load(&config)?;

    let (hotspots, trends) = analyze(&config.db, year, config.min_incidents).await?;
    export(&config.output, year, &hotspots, &trends)?;

    log::info!("Analysis for {year} completed successfully");
    Ok(())
}

/// Loads input files into the store, then releases the writer handle.
///
/// The incident CSV is optional in the sense that an absent file is a
/// warning, not an error (the store may already hold data from an
/// earlier run); a present-but-invalid file still fails the pipeline.
fn load(config: &Config) -> Result<(), PipelineError> {
    let conn = store::open(&config.db)?;

    if config.data.exists() {
        log::info!("Loading data from {}", config.data.display());
        crime_stats_ingest::load_incidents_csv(&conn, &config.data)?;
    } else {
        log::warn!("Data file not found at {}", config.data.display());
    }

    if let Some(communities) = &config.communities {
        crime_stats_ingest::load_communities_csv(&conn, communities)?;
    }

    log::info!(
        "Store ready: {} incident rows, {} communities",
        store::incident_count(&conn)?,
        store::community_count(&conn)?,
    );

    Ok(())
}

/// Runs both analyses concurrently, each on its own read-only handle.
async fn analyze(
    db: &Path,
    year: i32,
    min_incidents: u32,
) -> Result<(Vec<HotspotRow>, Vec<TrendRow>), PipelineError> {
    let hotspot_db = db.to_path_buf();
    let hotspot_task = tokio::task::spawn_blocking(move || -> Result<_, PipelineError> {
        let conn = store::open_read_only(&hotspot_db)?;
        Ok(analyze_crime_hotspots(&conn, year, min_incidents)?)
    });

    let trend_db = db.to_path_buf();
    let trend_task = tokio::task::spawn_blocking(move || -> Result<_, PipelineError> {
        let conn = store::open_read_only(&trend_db)?;
        Ok(calculate_crime_rate_trends(
            &conn,
            year - TREND_LOOKBACK_YEARS,
            year,
        )?)
    });

    let (hotspots, trends) = tokio::try_join!(hotspot_task, trend_task)?;
    Ok((hotspots?, trends?))
}

fn export(
    output: &Path,
    year: i32,
    hotspots: &[HotspotRow],
    trends: &[TrendRow],
) -> Result<(), PipelineError> {
    crime_stats_database::paths::ensure_dir(output)?;

    crime_stats_report::export::write_hotspots_csv(
        &output.join("hotspots_analysis.csv"),
        hotspots,
    )?;
    crime_stats_report::export::write_trends_csv(&output.join("crime_trends.csv"), trends)?;
    crime_stats_report::heatmap::write_heatmap(
        &output.join(format!("crime_heatmap_{year}.html")),
        year,
        hotspots,
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TempDirs {
        root: PathBuf,
    }

    impl TempDirs {
        fn new(name: &str) -> Self {
            let root = std::env::temp_dir()
                .join(format!("crime_stats_pipeline_{}_{name}", std::process::id()));
            let _ = std::fs::remove_dir_all(&root);
            std::fs::create_dir_all(&root).unwrap();
            Self { root }
        }

        fn path(&self, name: &str) -> PathBuf {
            self.root.join(name)
        }
    }

    impl Drop for TempDirs {
        fn drop(&mut self) {
            let _ = std::fs::remove_dir_all(&self.root);
        }
    }

    fn write_fixture_csvs(dirs: &TempDirs) -> (PathBuf, PathBuf) {
        let data = dirs.path("incidents.csv");
        std::fs::write(
            &data,
            "Sector,Community,Category,Count,Year,Month,Date,Longitude,Latitude\n\
             CENTRE,Downtown,Theft,10,2023,1,2023-01-05,-114.07,51.04\n\
             CENTRE,Downtown,Theft,8,2023,3,2023-03-05,-114.07,51.04\n\
             CENTRE,Downtown,Theft,500,2021,6,2021-06-15,-114.07,51.04\n",
        )
        .unwrap();

        let communities = dirs.path("communities.csv");
        std::fs::write(&communities, "Community,Population\nDowntown,50000\n").unwrap();

        (data, communities)
    }

    #[tokio::test]
    async fn runs_end_to_end_and_writes_all_three_reports() {
        let dirs = TempDirs::new("e2e");
        let (data, communities) = write_fixture_csvs(&dirs);
        let output = dirs.path("output");

        run(Config {
            data,
            communities: Some(communities),
            year: Some(2023),
            min_incidents: 5,
            output: output.clone(),
            db: dirs.path("store.duckdb"),
        })
        .await
        .unwrap();

        assert!(output.join("hotspots_analysis.csv").exists());
        assert!(output.join("crime_trends.csv").exists());
        assert!(output.join("crime_heatmap_2023.html").exists());

        let trends = std::fs::read_to_string(output.join("crime_trends.csv")).unwrap();
        // 500 incidents against 50,000 residents in 2021.
        assert!(trends.contains("2021,Downtown,500,50000,1000.0,"));
    }

    #[tokio::test]
    async fn missing_data_file_is_not_fatal() {
        let dirs = TempDirs::new("missing_data");
        let output = dirs.path("output");

        run(Config {
            data: dirs.path("does_not_exist.csv"),
            communities: None,
            year: Some(2023),
            min_incidents: 5,
            output,
            db: dirs.path("store.duckdb"),
        })
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn invalid_data_file_fails_the_pipeline() {
        let dirs = TempDirs::new("invalid_data");
        let data = dirs.path("incidents.csv");
        std::fs::write(&data, "Community,Count\nDowntown,4\n").unwrap();

        let err = run(Config {
            data,
            communities: None,
            year: Some(2023),
            min_incidents: 5,
            output: dirs.path("output"),
            db: dirs.path("store.duckdb"),
        })
        .await
        .unwrap_err();

        assert!(matches!(err, PipelineError::Ingest(_)));
    }
}
