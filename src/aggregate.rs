//! Day-of-year binning and cumulative totals
//!
//! Every year is binned onto the same `1..=cutoff` axis so the series can be
//! overlaid. Labels come from a fixed leap reference year and carry only the
//! month and day.

use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate};

/// Year used to label the shared x-axis
const REFERENCE_YEAR: i32 = 2000;

/// Cumulative series for each year over a shared set of day labels
#[derive(Debug, Clone, PartialEq)]
pub struct CumulativeSeries {
    /// One label per day, `Jan 01` through the cutoff
    pub labels: Vec<String>,
    /// Running totals per year, each `labels.len()` long
    pub years: BTreeMap<i32, Vec<f64>>,
}

impl CumulativeSeries {
    pub fn days(&self) -> usize {
        self.labels.len()
    }

    /// Returns the labels and running totals for one year
    pub fn get(&self, year: i32) -> Option<(&[String], &[f64])> {
        self.years
            .get(&year)
            .map(|values| (self.labels.as_slice(), values.as_slice()))
    }

    /// Largest final value across all years
    pub fn max_value(&self) -> f64 {
        self.years
            .values()
            .filter_map(|values| values.last().copied())
            .fold(0.0, f64::max)
    }
}

/// Month/day labels for days `1..=cutoff`
pub fn day_labels(cutoff: usize) -> Vec<String> {
    let start = NaiveDate::from_ymd_opt(REFERENCE_YEAR, 1, 1).unwrap_or_default();
    (0..cutoff)
        .map(|i| (start + Duration::days(i as i64)).format("%b %d").to_string())
        .collect()
}

/// Sums weighted day-of-year points into a dense bucket per day
///
/// Days outside `1..=cutoff` are ignored.
pub fn bucket<I>(points: I, cutoff: usize) -> Vec<f64>
where
    I: IntoIterator<Item = (u32, f64)>,
{
    let mut buckets = vec![0.0; cutoff];
    for (day, weight) in points {
        let day = day as usize;
        if (1..=cutoff).contains(&day) {
            buckets[day - 1] += weight;
        }
    }
    buckets
}

/// Running prefix sum
pub fn cumulative(buckets: &[f64]) -> Vec<f64> {
    buckets
        .iter()
        .scan(0.0, |total, value| {
            *total += value;
            Some(*total)
        })
        .collect()
}

fn aggregate<I, F>(by_year: &BTreeMap<i32, I>, cutoff: usize, points: F) -> CumulativeSeries
where
    F: Fn(&I) -> Vec<(u32, f64)>,
{
    let years = by_year
        .iter()
        .map(|(year, items)| (*year, cumulative(&bucket(points(items), cutoff))))
        .collect();
    CumulativeSeries {
        labels: day_labels(cutoff),
        years,
    }
}

/// Cumulative award counts per year
pub fn cumulative_counts(days_by_year: &BTreeMap<i32, Vec<u32>>, cutoff: usize) -> CumulativeSeries {
    aggregate(days_by_year, cutoff, |days| {
        days.iter().map(|day| (*day, 1.0)).collect()
    })
}

/// Cumulative award dollars per year
pub fn cumulative_amounts(
    amounts_by_year: &BTreeMap<i32, Vec<(u32, f64)>>,
    cutoff: usize,
) -> CumulativeSeries {
    aggregate(amounts_by_year, cutoff, |points| points.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_day_labels_use_month_and_day() {
        let labels = day_labels(61);
        assert_eq!(labels.len(), 61);
        assert_eq!(labels[0], "Jan 01");
        assert_eq!(labels[31], "Feb 01");
        assert_eq!(labels[59], "Feb 29");
        assert_eq!(labels[60], "Mar 01");
    }

    #[test]
    fn test_bucket_day_45_of_60() {
        let buckets = bucket([(45, 1.0)], 60);
        assert_eq!(buckets.len(), 60);
        assert_eq!(buckets[44], 1.0);
        assert_eq!(buckets.iter().sum::<f64>(), 1.0);
    }

    #[test]
    fn test_bucket_ignores_out_of_range_days() {
        let buckets = bucket([(0, 1.0), (31, 1.0), (1, 2.0), (30, 4.0)], 30);
        assert_eq!(buckets[0], 2.0);
        assert_eq!(buckets[29], 4.0);
        assert_eq!(buckets.iter().sum::<f64>(), 6.0);
    }

    #[test]
    fn test_cumulative_is_prefix_sum() {
        let buckets = bucket([(3, 1.0), (45, 1.0), (45, 1.0), (50, 1.0)], 60);
        let totals = cumulative(&buckets);
        let prefix: f64 = buckets[..=44].iter().sum();
        assert_eq!(totals[44], prefix);
        assert_eq!(totals[44], 3.0);
        assert_eq!(totals[59], 4.0);
    }

    #[test]
    fn test_counts_are_non_decreasing() {
        let mut by_year = BTreeMap::new();
        by_year.insert(2020, vec![5, 1, 30, 30, 12, 99]);
        by_year.insert(2021, vec![]);
        let series = cumulative_counts(&by_year, 30);

        for values in series.years.values() {
            assert_eq!(values.len(), 30);
            assert!(values.windows(2).all(|w| w[0] <= w[1]));
        }
        assert_eq!(series.years[&2020][29], 5.0);
        assert_eq!(series.years[&2021][29], 0.0);
    }

    #[test]
    fn test_counts_end_to_end_shape() {
        let mut by_year = BTreeMap::new();
        by_year.insert(2024, vec![10, 20]);
        let series = cumulative_counts(&by_year, 30);
        let (labels, values) = series.get(2024).unwrap();

        assert_eq!(labels.len(), 30);
        assert!(values[..9].iter().all(|v| *v == 0.0));
        assert!(values[9..19].iter().all(|v| *v == 1.0));
        assert!(values[19..].iter().all(|v| *v == 2.0));
    }

    #[test]
    fn test_amounts_sum_into_buckets() {
        let mut by_year = BTreeMap::new();
        by_year.insert(2023, vec![(2, 1000.0), (2, 500.0), (4, 250.0)]);
        let series = cumulative_amounts(&by_year, 5);

        assert_eq!(series.years[&2023], vec![0.0, 1500.0, 1500.0, 1750.0, 1750.0]);
        assert_eq!(series.max_value(), 1750.0);
    }

    #[test]
    fn test_labels_shared_across_years() {
        let mut by_year = BTreeMap::new();
        by_year.insert(2019, vec![1]);
        by_year.insert(2024, vec![2]);
        let series = cumulative_counts(&by_year, 10);

        let (a, _) = series.get(2019).unwrap();
        let (b, _) = series.get(2024).unwrap();
        assert_eq!(a, b);
        assert_eq!(series.days(), 10);
    }
}
