//! Core data models for awardpace
//!
//! This module contains the award record as returned by NIH RePORTER, the
//! year-to-date cutoff shared across all compared years, and the client used
//! to page through the search API.

pub mod reporter;

pub use reporter::{
    next_month_start, FetchError, MonthFetch, MonthFetcher, PageSource, ReporterClient,
    SearchQuery, SearchResponse,
};

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Format of `award_notice_date` in API responses
pub const AWARD_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// A single project record from the RePORTER search API
///
/// Only the fields the aggregation reads are typed. Everything else the API
/// returns is kept in `extra` so a record survives the cache unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AwardRecord {
    /// When the award was formally issued (`YYYY-MM-DDTHH:MM:SSZ`)
    ///
    /// Kept as raw JSON so a record with an unexpected type here is skipped
    /// on its own instead of failing the whole page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub award_notice_date: Option<Value>,
    /// Award dollar amount, only requested by the amounts variant
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub award_amount: Option<Value>,
    /// Any other fields returned by the API
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Reasons a record cannot contribute to the aggregation
#[derive(Debug, Error)]
pub enum RecordError {
    /// The record has no award notice date
    #[error("record has no award_notice_date")]
    MissingDate,

    /// The award notice date does not match the API format
    #[error("could not parse award_notice_date '{value}': {source}")]
    InvalidDate {
        value: String,
        #[source]
        source: chrono::ParseError,
    },

    /// The award notice date is not a JSON string
    #[error("award_notice_date {value} is not a string")]
    NotAString { value: String },
}

impl RecordError {
    /// The offending date value, for malformed dates
    pub fn invalid_value(&self) -> Option<&str> {
        match self {
            RecordError::MissingDate => None,
            RecordError::InvalidDate { value, .. } | RecordError::NotAString { value } => {
                Some(value)
            }
        }
    }
}

impl AwardRecord {
    /// Creates a record with only an award notice date
    pub fn with_date(award_notice_date: impl Into<String>) -> Self {
        Self {
            award_notice_date: Some(Value::String(award_notice_date.into())),
            award_amount: None,
            extra: Map::new(),
        }
    }

    /// Sets the award amount
    pub fn amount(mut self, amount: f64) -> Self {
        self.award_amount = Some(Value::from(amount));
        self
    }

    /// Parses the award notice date into a calendar date
    pub fn notice_date(&self) -> Result<NaiveDate, RecordError> {
        let raw = match &self.award_notice_date {
            None | Some(Value::Null) => return Err(RecordError::MissingDate),
            Some(Value::String(s)) if s.is_empty() => return Err(RecordError::MissingDate),
            Some(Value::String(s)) => s.as_str(),
            Some(other) => {
                return Err(RecordError::NotAString {
                    value: other.to_string(),
                })
            }
        };
        NaiveDateTime::parse_from_str(raw, AWARD_DATE_FORMAT)
            .map(|dt| dt.date())
            .map_err(|source| RecordError::InvalidDate {
                value: raw.to_string(),
                source,
            })
    }

    /// Award amount in dollars, 0 when missing or not numeric
    pub fn amount_or_zero(&self) -> f64 {
        match &self.award_amount {
            Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
            Some(Value::String(s)) => s.trim().parse().unwrap_or(0.0),
            _ => 0.0,
        }
    }
}

/// Which comparison the run produces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Variant {
    /// Award counts through today
    #[default]
    Counts,
    /// Award counts and dollar amounts through the most recent Monday
    Amounts,
}

impl Variant {
    /// API fields requested for this variant
    pub fn fields(&self) -> &'static [&'static str] {
        match self {
            Variant::Counts => &["award_notice_date"],
            Variant::Amounts => &["award_notice_date", "award_amount"],
        }
    }

    /// Whether the current calendar month bypasses the cache
    pub fn always_refresh_current_period(&self) -> bool {
        matches!(self, Variant::Amounts)
    }

    /// Cutoff date for this variant as seen from `today`
    pub fn cutoff(&self, today: NaiveDate) -> Cutoff {
        match self {
            Variant::Counts => Cutoff::new(today),
            Variant::Amounts => Cutoff::most_recent_monday(today),
        }
    }
}

/// Last `(month, day)` included in the year-to-date comparison
///
/// The comparison is on month and day only so the same cutoff applies to
/// every year being overlaid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cutoff {
    date: NaiveDate,
}

impl Cutoff {
    /// Cutoff at `date` itself, the last day that is included
    pub fn new(date: NaiveDate) -> Self {
        Self { date }
    }

    /// Cutoff at the most recent Monday on or before `today`
    pub fn most_recent_monday(today: NaiveDate) -> Self {
        let back = today.weekday().num_days_from_monday() as i64;
        Self::new(today - Duration::days(back))
    }

    /// The cutoff date, in the year it was computed for
    pub fn date(&self) -> NaiveDate {
        self.date
    }

    /// Last calendar month (1-12) that needs to be collected in each year
    pub fn month(&self) -> u32 {
        self.date.month()
    }

    /// Number of days in each series (day-of-year of the cutoff date)
    pub fn days(&self) -> usize {
        self.date.ordinal() as usize
    }

    /// True if `date` falls after the cutoff, ignoring the year
    pub fn excludes(&self, date: NaiveDate) -> bool {
        (date.month(), date.day()) > (self.date.month(), self.date.day())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Weekday;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_notice_date_parses_api_format() {
        let record = AwardRecord::with_date("2024-03-15T00:00:00Z");
        assert_eq!(record.notice_date().unwrap(), date(2024, 3, 15));
    }

    #[test]
    fn test_notice_date_missing() {
        let record: AwardRecord = serde_json::from_str(r#"{"award_notice_date": null}"#).unwrap();
        assert!(matches!(record.notice_date(), Err(RecordError::MissingDate)));
    }

    #[test]
    fn test_notice_date_invalid() {
        let record = AwardRecord::with_date("15/03/2024");
        let err = record.notice_date().unwrap_err();
        assert!(matches!(err, RecordError::InvalidDate { .. }));
        assert!(err.to_string().contains("15/03/2024"));
    }

    #[test]
    fn test_notice_date_rejects_non_string_values() {
        let records: Vec<AwardRecord> = serde_json::from_str(
            r#"[{"award_notice_date": 20240503}, {"award_notice_date": {"d": 1}}]"#,
        )
        .unwrap();

        let err = records[0].notice_date().unwrap_err();
        assert!(matches!(err, RecordError::NotAString { .. }));
        assert_eq!(err.invalid_value(), Some("20240503"));
        assert!(matches!(records[1].notice_date(), Err(RecordError::NotAString { .. })));
    }

    #[test]
    fn test_amount_defaults_to_zero() {
        let record: AwardRecord = serde_json::from_str(
            r#"{"award_notice_date": "2024-01-02T00:00:00Z", "award_amount": "n/a"}"#,
        )
        .unwrap();
        assert_eq!(record.amount_or_zero(), 0.0);
        assert_eq!(AwardRecord::with_date("2024-01-02T00:00:00Z").amount_or_zero(), 0.0);
    }

    #[test]
    fn test_amount_accepts_numbers_and_numeric_strings() {
        let record = AwardRecord::with_date("2024-01-02T00:00:00Z").amount(1250.5);
        assert_eq!(record.amount_or_zero(), 1250.5);

        let record: AwardRecord =
            serde_json::from_str(r#"{"award_notice_date": "2024-01-02T00:00:00Z", "award_amount": "300"}"#)
                .unwrap();
        assert_eq!(record.amount_or_zero(), 300.0);
    }

    #[test]
    fn test_unknown_fields_are_preserved() {
        let json = r#"{"award_notice_date":"2024-01-02T00:00:00Z","appl_id":10101,"project_title":"X"}"#;
        let record: AwardRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.extra.get("appl_id"), Some(&Value::from(10101)));

        let back: Value = serde_json::to_value(&record).unwrap();
        assert_eq!(back["project_title"], "X");
        assert!(back.get("award_amount").is_none());
    }

    #[test]
    fn test_cutoff_excludes_by_month_and_day_only() {
        let cutoff = Cutoff::new(date(2026, 3, 10));
        assert!(!cutoff.excludes(date(2019, 3, 10)));
        assert!(cutoff.excludes(date(2019, 3, 11)));
        assert!(cutoff.excludes(date(2026, 4, 1)));
        assert!(!cutoff.excludes(date(2020, 2, 29)));
    }

    #[test]
    fn test_most_recent_monday() {
        // 2026-10-15 is a Thursday
        let cutoff = Cutoff::most_recent_monday(date(2026, 10, 15));
        assert_eq!(cutoff.date(), date(2026, 10, 12));
        assert_eq!(cutoff.date().weekday(), Weekday::Mon);

        let monday = date(2026, 10, 12);
        assert_eq!(Cutoff::most_recent_monday(monday).date(), monday);
    }

    #[test]
    fn test_cutoff_days_is_day_of_year() {
        assert_eq!(Cutoff::new(date(2026, 1, 1)).days(), 1);
        assert_eq!(Cutoff::new(date(2026, 3, 1)).days(), 60);
        assert_eq!(Cutoff::new(date(2024, 3, 1)).days(), 61);
    }

    #[test]
    fn test_variant_policies() {
        assert!(!Variant::Counts.always_refresh_current_period());
        assert!(Variant::Amounts.always_refresh_current_period());
        assert_eq!(Variant::Counts.fields(), &["award_notice_date"]);
        assert!(Variant::Amounts.fields().contains(&"award_amount"));

        let today = date(2026, 10, 15);
        assert_eq!(Variant::Counts.cutoff(today).date(), today);
        assert_eq!(Variant::Amounts.cutoff(today).date(), date(2026, 10, 12));
    }
}
