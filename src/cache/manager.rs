//! Month cache manager for persisting fetched awards to disk
//!
//! Provides a `MonthCache` that stores one JSON file per (year, month) holding
//! the date it was fetched and the raw award records.

use chrono::{Datelike, NaiveDate};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use tracing::debug;

use crate::data::AwardRecord;

/// Entries older than this many days are refetched
pub const MAX_AGE_DAYS: i64 = 7;

/// Format of `fetch_date` on disk
const FETCH_DATE_FORMAT: &str = "%Y-%m-%d";

/// On-disk layout of a cache file
#[derive(Debug, Serialize, Deserialize)]
struct CacheEntry<R> {
    /// Day the records were fetched (YYYY-MM-DD)
    fetch_date: String,
    /// The records as returned by the API
    grants: R,
}

/// Rules deciding whether a cached month can be reused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachePolicy {
    /// Maximum age of an entry in days
    pub max_age_days: i64,
    /// Treat the current calendar month as stale regardless of fetch date
    pub always_refresh_current_period: bool,
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self {
            max_age_days: MAX_AGE_DAYS,
            always_refresh_current_period: false,
        }
    }
}

/// Manages per-month award files in a cache directory
///
/// `today` is fixed at construction so that every lookup in a run uses the
/// same reference date.
#[derive(Debug, Clone)]
pub struct MonthCache {
    /// Directory where cache files are stored
    cache_dir: PathBuf,
    /// Reference date for fetch dates and staleness
    today: NaiveDate,
    policy: CachePolicy,
}

impl MonthCache {
    /// Creates a new MonthCache for the given directory
    pub fn new(cache_dir: impl Into<PathBuf>, today: NaiveDate, policy: CachePolicy) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            today,
            policy,
        }
    }

    /// Returns the default cache directory
    ///
    /// Uses `~/.cache/awardpace/` on Linux, or the equivalent platform path.
    /// Falls back to `./cache` when no home directory can be determined.
    pub fn default_dir() -> PathBuf {
        ProjectDirs::from("", "", "awardpace")
            .map(|dirs| dirs.cache_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("cache"))
    }

    /// Returns the path to the cache file for a year and month
    pub fn cache_path(&self, year: i32, month: u32) -> PathBuf {
        self.cache_dir.join(format!("grants_{}_{:02}.json", year, month))
    }

    /// Ensures the cache directory exists
    fn ensure_dir(&self) -> std::io::Result<()> {
        fs::create_dir_all(&self.cache_dir)
    }

    fn is_current_period(&self, year: i32, month: u32) -> bool {
        year == self.today.year() && month == self.today.month()
    }

    /// Reads the records cached for a year and month
    ///
    /// Returns `None` if the file is missing, cannot be parsed, lacks
    /// `fetch_date` or `grants`, is older than the maximum age, or belongs to
    /// the current month while the policy always refreshes it.
    pub fn read(&self, year: i32, month: u32) -> Option<Vec<AwardRecord>> {
        if self.policy.always_refresh_current_period && self.is_current_period(year, month) {
            debug!(year, month, "current month always refreshed");
            return None;
        }

        let path = self.cache_path(year, month);
        let content = fs::read_to_string(&path).ok()?;
        let entry: CacheEntry<Vec<AwardRecord>> = match serde_json::from_str(&content) {
            Ok(entry) => entry,
            Err(e) => {
                debug!(path = %path.display(), "unreadable cache entry: {}", e);
                return None;
            }
        };

        let fetch_date = match NaiveDate::parse_from_str(&entry.fetch_date, FETCH_DATE_FORMAT) {
            Ok(date) => date,
            Err(e) => {
                debug!(path = %path.display(), "bad fetch_date '{}': {}", entry.fetch_date, e);
                return None;
            }
        };

        let age = (self.today - fetch_date).num_days();
        if age > self.policy.max_age_days {
            debug!(year, month, age, "cache entry expired");
            return None;
        }

        Some(entry.grants)
    }

    /// Writes records for a year and month, stamped with today's date
    ///
    /// Overwrites any previous entry and creates the directory if needed.
    pub fn write(&self, year: i32, month: u32, records: &[AwardRecord]) -> std::io::Result<()> {
        self.write_dated(year, month, records, self.today)
    }

    /// Writes records with an explicit fetch date
    pub fn write_dated(
        &self,
        year: i32,
        month: u32,
        records: &[AwardRecord],
        fetch_date: NaiveDate,
    ) -> std::io::Result<()> {
        self.ensure_dir()?;

        let entry = CacheEntry {
            fetch_date: fetch_date.format(FETCH_DATE_FORMAT).to_string(),
            grants: records,
        };

        let json = serde_json::to_string(&entry)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;

        fs::write(self.cache_path(year, month), json)
    }
}
