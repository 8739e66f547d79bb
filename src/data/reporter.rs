//! NIH RePORTER project search client
//!
//! Pages through the `projects/search` endpoint one calendar month at a time.
//! Requests are strictly sequential with a fixed delay between pages, and a
//! failed page ends the month with whatever was already collected.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{Datelike, NaiveDate};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use super::AwardRecord;

/// Base URL for the RePORTER project search API
pub const REPORTER_SEARCH_URL: &str = "https://api.reporter.nih.gov/v2/projects/search";

/// Largest page the API will return
pub const PAGE_LIMIT: u64 = 500;

/// The API refuses offsets past this point
pub const MAX_OFFSET: u64 = 15_000;

/// Pause between consecutive page requests
pub const PAGE_DELAY: Duration = Duration::from_millis(100);

/// Errors that can occur when fetching a page of results
#[derive(Debug, Error)]
pub enum FetchError {
    /// HTTP request failed or returned a non-success status
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// Failed to parse the JSON response
    #[error("Failed to parse API response: {0}")]
    ParseError(String),
}

/// Request body for `projects/search`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchQuery {
    pub criteria: Criteria,
    pub offset: u64,
    pub limit: u64,
    pub fields: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Criteria {
    pub award_notice_date: DateRange,
}

/// Dates are serialized as `YYYY-MM-DD`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DateRange {
    pub from_date: NaiveDate,
    pub to_date: NaiveDate,
}

/// Response body from `projects/search`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub results: Vec<AwardRecord>,
    #[serde(default)]
    pub meta: SearchMeta,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchMeta {
    /// Total number of matching records across all pages
    #[serde(default)]
    pub total: u64,
}

/// Anything that can answer a single search query
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn search(&self, query: &SearchQuery) -> Result<SearchResponse, FetchError>;
}

/// HTTP client for the RePORTER API
#[derive(Debug, Clone)]
pub struct ReporterClient {
    http_client: Client,
    base_url: String,
}

impl ReporterClient {
    /// Creates a client pointed at the public RePORTER API
    pub fn new() -> Self {
        Self::with_base_url(REPORTER_SEARCH_URL)
    }

    /// Creates a client with a custom search URL
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            http_client: Client::new(),
            base_url: base_url.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl Default for ReporterClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PageSource for ReporterClient {
    async fn search(&self, query: &SearchQuery) -> Result<SearchResponse, FetchError> {
        let response = self
            .http_client
            .post(&self.base_url)
            .json(query)
            .send()
            .await?
            .error_for_status()?;
        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| FetchError::ParseError(e.to_string()))
    }
}

/// Result of fetching one month of awards
#[derive(Debug, Default)]
pub struct MonthFetch {
    /// Records collected, possibly partial
    pub records: Vec<AwardRecord>,
    /// Total the API reported for the month
    pub reported_total: u64,
    /// Number of page requests issued
    pub pages: u32,
    /// True when the reported total exceeded the offset ceiling
    pub truncated: bool,
    /// The error that ended the fetch early, if any
    pub error: Option<FetchError>,
}

impl MonthFetch {
    pub fn is_complete(&self) -> bool {
        self.error.is_none() && !self.truncated
    }
}

/// First day of the month after `date`
pub fn next_month_start(date: NaiveDate) -> NaiveDate {
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    // Day 1 always exists
    NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(date)
}

/// Pages through one month of awards from a `PageSource`
#[derive(Debug, Clone)]
pub struct MonthFetcher<S> {
    source: S,
    fields: Vec<String>,
    page_limit: u64,
    max_offset: u64,
    page_delay: Duration,
}

impl<S: PageSource> MonthFetcher<S> {
    pub fn new(source: S, fields: &[&str]) -> Self {
        Self {
            source,
            fields: fields.iter().map(|f| f.to_string()).collect(),
            page_limit: PAGE_LIMIT,
            max_offset: MAX_OFFSET,
            page_delay: PAGE_DELAY,
        }
    }

    /// Overrides the pause between pages
    pub fn with_page_delay(mut self, page_delay: Duration) -> Self {
        self.page_delay = page_delay;
        self
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    fn query(&self, from_date: NaiveDate, to_date: NaiveDate, offset: u64) -> SearchQuery {
        SearchQuery {
            criteria: Criteria {
                award_notice_date: DateRange { from_date, to_date },
            },
            offset,
            limit: self.page_limit,
            fields: self.fields.clone(),
        }
    }

    /// Fetches every award issued in the month starting at `month_start`
    ///
    /// Stops once `offset >= min(total, 15000)`. A failed request ends the
    /// month early and the error is returned alongside the partial records.
    pub async fn fetch(&self, month_start: NaiveDate) -> MonthFetch {
        let to_date = next_month_start(month_start);
        let mut fetch = MonthFetch::default();
        let mut offset = 0;

        loop {
            let query = self.query(month_start, to_date, offset);
            debug!(from = %month_start, to = %to_date, offset, "requesting page");

            let page = match self.source.search(&query).await {
                Ok(page) => page,
                Err(e) => {
                    warn!("Error fetching data for {} to {}: {}", month_start, to_date, e);
                    fetch.error = Some(e);
                    break;
                }
            };
            fetch.pages += 1;

            let total = page.meta.total;
            if offset == 0 {
                fetch.reported_total = total;
                if total > self.max_offset {
                    warn!(
                        "Query for {} returned {} awards. This exceeds the maximum supported offset of {}.",
                        month_start, total, self.max_offset
                    );
                    fetch.truncated = true;
                }
            }

            fetch.records.extend(page.results);
            offset += self.page_limit;
            if offset >= total.min(self.max_offset) {
                break;
            }
            tokio::time::sleep(self.page_delay).await;
        }

        fetch
    }
}
