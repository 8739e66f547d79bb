//! Month-by-month collection of award records
//!
//! Walks every (year, month) from January through the cutoff month for each
//! year in range, preferring the month cache and falling back to the API.
//! Records are reduced to day-of-year points keyed by their award year.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use tracing::{info, warn};

use crate::cache::MonthCache;
use crate::data::{AwardRecord, Cutoff, MonthFetcher, PageSource, RecordError};

/// Where a month's records came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    Hit,
    Miss,
}

impl std::fmt::Display for CacheStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheStatus::Hit => write!(f, "hit"),
            CacheStatus::Miss => write!(f, "miss"),
        }
    }
}

/// A record that parsed and falls inside the cutoff
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AwardPoint {
    pub year: i32,
    pub day_of_year: u32,
    pub amount: f64,
}

/// Converts one record into a point, or `None` if it falls after the cutoff
pub fn classify(record: &AwardRecord, cutoff: &Cutoff) -> Result<Option<AwardPoint>, RecordError> {
    let date = record.notice_date()?;
    if cutoff.excludes(date) {
        return Ok(None);
    }
    Ok(Some(AwardPoint {
        year: date.year(),
        day_of_year: date.ordinal(),
        amount: record.amount_or_zero(),
    }))
}

/// Tally of what happened during a collection run
#[derive(Debug, Default)]
pub struct CollectReport {
    pub months: usize,
    pub cache_hits: usize,
    pub cache_misses: usize,
    /// Months whose fetch ended early on an error
    pub failed_months: Vec<(i32, u32)>,
    /// Months whose total exceeded the offset ceiling
    pub truncated_months: Vec<(i32, u32)>,
    /// Records without an award date
    pub missing_dates: usize,
    /// Records whose award date could not be parsed
    pub invalid_dates: Vec<String>,
    /// Records after the cutoff (month, day)
    pub after_cutoff: usize,
    /// Records kept
    pub kept: usize,
}

impl CollectReport {
    fn record(&mut self, outcome: &Result<Option<AwardPoint>, RecordError>) {
        match outcome {
            Ok(Some(_)) => self.kept += 1,
            Ok(None) => self.after_cutoff += 1,
            Err(RecordError::MissingDate) => self.missing_dates += 1,
            Err(e) => {
                if let Some(value) = e.invalid_value() {
                    self.invalid_dates.push(value.to_string());
                }
            }
        }
    }
}

/// Day-of-year points per award year
#[derive(Debug, Default)]
pub struct Collected {
    /// Day of year of every kept award, by year
    pub counts: BTreeMap<i32, Vec<u32>>,
    /// Day of year and dollar amount of every kept award, by year
    pub amounts: BTreeMap<i32, Vec<(u32, f64)>>,
    pub report: CollectReport,
}

impl Collected {
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    fn push(&mut self, point: AwardPoint) {
        self.counts.entry(point.year).or_default().push(point.day_of_year);
        self.amounts
            .entry(point.year)
            .or_default()
            .push((point.day_of_year, point.amount));
    }
}

/// Drives the month cache and fetcher across the year/month grid
pub struct Collector<S> {
    cache: MonthCache,
    fetcher: MonthFetcher<S>,
}

impl<S: PageSource> Collector<S> {
    pub fn new(cache: MonthCache, fetcher: MonthFetcher<S>) -> Self {
        Self { cache, fetcher }
    }

    /// The month cache consulted before every fetch
    pub fn cache(&self) -> &MonthCache {
        &self.cache
    }

    /// The fetcher used for cache misses
    pub fn fetcher(&self) -> &MonthFetcher<S> {
        &self.fetcher
    }

    /// Returns the records for one month, from cache when valid
    async fn month_records(
        &self,
        year: i32,
        month: u32,
        report: &mut CollectReport,
    ) -> (Vec<AwardRecord>, CacheStatus) {
        if let Some(records) = self.cache.read(year, month) {
            return (records, CacheStatus::Hit);
        }

        let month_start = match NaiveDate::from_ymd_opt(year, month, 1) {
            Some(date) => date,
            None => return (Vec::new(), CacheStatus::Miss),
        };
        let fetch = self.fetcher.fetch(month_start).await;
        if fetch.error.is_some() {
            report.failed_months.push((year, month));
        }
        if fetch.truncated {
            report.truncated_months.push((year, month));
        }

        if let Err(e) = self.cache.write(year, month, &fetch.records) {
            warn!("Could not cache {}-{:02}: {}", year, month, e);
        }
        (fetch.records, CacheStatus::Miss)
    }

    /// Collects award points for every year from `start_year` to `current_year`
    ///
    /// Months run from January through the cutoff month. Records dated after
    /// the cutoff's month and day are dropped in every year.
    pub async fn collect(&self, start_year: i32, current_year: i32, cutoff: Cutoff) -> Collected {
        let mut collected = Collected::default();
        let month_limit = cutoff.month();
        let years = (current_year - start_year + 1).max(0) as usize;
        let total_months = years * month_limit as usize;

        let mut index = 0;
        for year in start_year..=current_year {
            for month in 1..=month_limit {
                index += 1;
                info!("[{}/{}] Fetching grants for {}-{:02}...", index, total_months, year, month);

                let (records, status) = self.month_records(year, month, &mut collected.report).await;
                info!("Fetched {} grants ({}).", records.len(), status);

                collected.report.months += 1;
                match status {
                    CacheStatus::Hit => collected.report.cache_hits += 1,
                    CacheStatus::Miss => collected.report.cache_misses += 1,
                }

                for record in &records {
                    let outcome = classify(record, &cutoff);
                    collected.report.record(&outcome);
                    match outcome {
                        Ok(Some(point)) => collected.push(point),
                        Ok(None) => {}
                        Err(RecordError::MissingDate) => {}
                        Err(e) => warn!("{}", e),
                    }
                }
            }
        }

        collected
    }
}
