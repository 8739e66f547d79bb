//! Command-line interface parsing for awardpace
//!
//! This module handles parsing of CLI arguments using clap and turns them into
//! the `RunConfig` that drives a run.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use thiserror::Error;

use crate::cache::MonthCache;
use crate::data::Variant;

/// Number of years compared, including the current one
pub const HISTORY_YEARS: i32 = 10;

/// Error types for CLI argument parsing
#[derive(Debug, Error)]
pub enum CliError {
    /// Tick spacing must be at least one day
    #[error("Invalid tick interval: {0}. The interval must be at least 1 day")]
    InvalidTickInterval(usize),
}

/// Which comparison to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum VariantArg {
    /// Award counts through today
    #[default]
    Counts,
    /// Award counts and dollars through the most recent Monday
    Amounts,
}

impl From<VariantArg> for Variant {
    fn from(arg: VariantArg) -> Self {
        match arg {
            VariantArg::Counts => Variant::Counts,
            VariantArg::Amounts => Variant::Amounts,
        }
    }
}

/// awardpace - chart this year's NIH awards against the previous nine years
#[derive(Parser, Debug)]
#[command(name = "awardpace")]
#[command(about = "Cumulative year-to-date NIH awards compared with prior years")]
#[command(version)]
pub struct Cli {
    /// Interval (in days) between x-axis tick labels
    #[arg(long, value_name = "DAYS", default_value_t = 7)]
    pub tick_interval: usize,

    /// Which charts to produce
    ///
    /// counts: award counts through today.
    /// amounts: counts and dollar amounts through the most recent Monday,
    /// always refetching the current month.
    #[arg(long, value_enum, default_value_t = VariantArg::Counts)]
    pub variant: VariantArg,

    /// Increase log output (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// Settings for a single run
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub tick_interval: usize,
    pub variant: Variant,
    /// Directory holding the per-month cache files
    pub cache_dir: PathBuf,
    /// Directory the chart files are written to
    pub output_dir: PathBuf,
    pub history_years: i32,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            tick_interval: 7,
            variant: Variant::Counts,
            cache_dir: MonthCache::default_dir(),
            output_dir: PathBuf::from("."),
            history_years: HISTORY_YEARS,
        }
    }
}

impl RunConfig {
    /// Creates a RunConfig from parsed CLI arguments.
    ///
    /// # Returns
    /// * `Ok(RunConfig)` with the requested settings
    /// * `Err(CliError)` if the tick interval is zero
    pub fn from_cli(cli: &Cli) -> Result<Self, CliError> {
        if cli.tick_interval == 0 {
            return Err(CliError::InvalidTickInterval(cli.tick_interval));
        }
        Ok(RunConfig {
            tick_interval: cli.tick_interval,
            variant: cli.variant.into(),
            ..RunConfig::default()
        })
    }

    /// First year compared, given the current year
    pub fn start_year(&self, current_year: i32) -> i32 {
        current_year - (self.history_years - 1)
    }
}
