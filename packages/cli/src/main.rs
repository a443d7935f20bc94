#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for the crime statistics toolchain.
//!
//! Runs the full batch workflow: load the incident CSV (if present),
//! optionally load community demographics, run the hotspot and trend
//! analyses concurrently, and write the report files. All errors are
//! caught here, logged, and reported as a non-zero exit status.

mod pipeline;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

#[derive(Parser)]
#[command(name = "crime_stats_cli", about = "Municipal crime statistics analysis tool")]
struct Cli {
    /// Path to the incident CSV. Skipped with a warning if the file
    /// does not exist.
    #[arg(long, default_value = "data/calgary_crime_stats.csv")]
    data: PathBuf,

    /// Path to a community demographics CSV (optional).
    #[arg(long)]
    communities: Option<PathBuf>,

    /// Analysis year. Defaults to the current calendar year.
    #[arg(long)]
    year: Option<i32>,

    /// Minimum monthly incident total for a month to count toward a
    /// hotspot.
    #[arg(long, default_value = "5")]
    min_incidents: u32,

    /// Output directory for report files.
    #[arg(long, default_value = "output")]
    output: PathBuf,

    /// Store file path. Overrides the `CRIME_STATS_DB` environment
    /// variable.
    #[arg(long)]
    db: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    pretty_env_logger::init();
    let cli = Cli::parse();

    let config = pipeline::Config {
        data: cli.data,
        communities: cli.communities,
        year: cli.year,
        min_incidents: cli.min_incidents,
        output: cli.output,
        db: cli.db.unwrap_or_else(crime_stats_database::paths::db_path),
    };

    match pipeline::run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("Fatal error: {e}");
            ExitCode::FAILURE
        }
    }
}
