//! awardpace - Cumulative NIH awards, this year against the last nine
//!
//! Fetches award notice dates from NIH RePORTER month by month, caches each
//! month on disk, and writes cumulative year-to-date charts.

use std::process::ExitCode;

use awardpace::cli::{Cli, RunConfig};
use awardpace::data::ReporterClient;
use awardpace::run::{run, RunOutcome};
use awardpace::ui;
use chrono::Local;
use clap::Parser;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // 0 = info, 1 = debug, 2+ = trace
    let filter = match cli.verbose {
        0 => EnvFilter::new("awardpace=info"),
        1 => EnvFilter::new("awardpace=debug"),
        _ => EnvFilter::new("awardpace=trace"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();

    match run_cli(&cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run_cli(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = RunConfig::from_cli(cli)?;
    let today = Local::now().date_naive();
    debug!(cache_dir = %config.cache_dir.display(), "starting run");

    match run(&config, today, ReporterClient::new()).await? {
        RunOutcome::NoData(_) => {
            println!("No grant data retrieved. Exiting.");
        }
        RunOutcome::Charts {
            current_year,
            awards_per_year,
            charts,
            ..
        } => {
            for (year, count) in &awards_per_year {
                println!("Year {}: {} awards processed.", year, count);
            }
            for chart in &charts {
                println!(
                    "Plots saved as {} and {}",
                    chart.files.html.display(),
                    chart.files.image.display()
                );
                if let Err(e) = ui::preview(chart.kind, &chart.series, current_year) {
                    warn!("Could not draw terminal preview: {}", e);
                }
            }
        }
    }

    Ok(())
}
