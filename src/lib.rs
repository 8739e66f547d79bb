//! awardpace library
//!
//! Month cache, RePORTER client, collection, aggregation and chart export,
//! exposed for the binary and for integration tests.

pub mod aggregate;
pub mod cache;
pub mod cli;
pub mod collect;
pub mod data;
pub mod export;
pub mod run;
pub mod ui;
