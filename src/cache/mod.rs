//! Cache module for storing fetched award months on disk
//!
//! Each (year, month) is a flat JSON file stamped with the date it was fetched.
//! Entries older than a week are refetched, and the current month can be
//! forced to refresh on every run.

mod manager;

pub use manager::{CachePolicy, MonthCache, MAX_AGE_DAYS};
