//! One end-to-end run: collect, aggregate, export

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::aggregate::{cumulative_amounts, cumulative_counts, CumulativeSeries};
use crate::cache::{CachePolicy, MonthCache};
use crate::cli::RunConfig;
use crate::collect::{CollectReport, Collector};
use crate::data::{MonthFetcher, PageSource, Variant};
use crate::export::{export_chart, ChartKind, ExportError, ExportedChart};

/// Errors that end a run
#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Export(#[from] ExportError),
}

/// A finished chart and where it was written
#[derive(Debug)]
pub struct RenderedChart {
    pub kind: ChartKind,
    pub series: CumulativeSeries,
    pub files: ExportedChart,
}

/// What a run produced
#[derive(Debug)]
pub enum RunOutcome {
    /// No award made it through collection; nothing was written
    NoData(CollectReport),
    Charts {
        current_year: i32,
        /// Number of kept awards per year
        awards_per_year: BTreeMap<i32, usize>,
        charts: Vec<RenderedChart>,
        report: CollectReport,
    },
}

/// Charts produced by a variant
fn chart_kinds(variant: Variant) -> &'static [ChartKind] {
    match variant {
        Variant::Counts => &[ChartKind::Counts],
        Variant::Amounts => &[ChartKind::Counts, ChartKind::Amounts],
    }
}

/// Runs the comparison as of `today` against `source`
pub async fn run<S: PageSource>(
    config: &RunConfig,
    today: NaiveDate,
    source: S,
) -> Result<RunOutcome, RunError> {
    let variant = config.variant;
    let cutoff = variant.cutoff(today);
    let current_year = cutoff.date().year();
    let start_year = config.start_year(current_year);

    let policy = CachePolicy {
        always_refresh_current_period: variant.always_refresh_current_period(),
        ..CachePolicy::default()
    };
    let cache = MonthCache::new(config.cache_dir.clone(), today, policy);
    let fetcher = MonthFetcher::new(source, variant.fields());
    let collector = Collector::new(cache, fetcher);

    info!(
        "Fetching grant data from {} to {} for days up to {:02}-{:02}...",
        start_year,
        current_year,
        cutoff.month(),
        cutoff.date().day()
    );
    let collected = collector.collect(start_year, current_year, cutoff).await;

    let report = &collected.report;
    if !report.failed_months.is_empty() {
        warn!("{} month(s) were only partially fetched", report.failed_months.len());
    }
    if !report.truncated_months.is_empty() {
        warn!(
            "{} month(s) exceeded the API offset limit and were truncated",
            report.truncated_months.len()
        );
    }
    if !report.invalid_dates.is_empty() {
        warn!("Skipped {} award(s) with unparsable dates", report.invalid_dates.len());
    }

    if collected.is_empty() {
        return Ok(RunOutcome::NoData(collected.report));
    }

    let awards_per_year = collected
        .counts
        .iter()
        .map(|(year, days)| (*year, days.len()))
        .collect();

    let mut charts = Vec::new();
    for kind in chart_kinds(variant) {
        let series = match kind {
            ChartKind::Counts => cumulative_counts(&collected.counts, cutoff.days()),
            ChartKind::Amounts => cumulative_amounts(&collected.amounts, cutoff.days()),
        };
        let files = export_chart(
            *kind,
            &series,
            current_year,
            config.tick_interval,
            &config.output_dir,
        )?;
        debug!(html = %files.html.display(), image = %files.image.display(), "chart exported");
        charts.push(RenderedChart {
            kind: *kind,
            series,
            files,
        });
    }

    Ok(RunOutcome::Charts {
        current_year,
        awards_per_year,
        charts,
        report: collected.report,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chart_kinds_per_variant() {
        assert_eq!(chart_kinds(Variant::Counts), &[ChartKind::Counts]);
        assert_eq!(
            chart_kinds(Variant::Amounts),
            &[ChartKind::Counts, ChartKind::Amounts]
        );
    }
}
