use chrono::{Datelike, Duration, NaiveDate};
use funnel_core::types::{FunnelRecord, StepTotals};
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// A derived, disposable view of historical records: the recent window at
/// full fidelity plus weekly aggregates for everything older. Recomputed
/// from the raw store each run, never persisted as authoritative data.
#[derive(Debug, Clone)]
pub struct HistoricalWindow {
    /// Records within the last `keep_last_n_days`, untouched.
    pub recent: Vec<FunnelRecord>,
    /// One synthetic record per (week, dimension-value combination) for
    /// older records, dated at the week's Monday.
    pub summarized: Vec<FunnelRecord>,
    /// Row count before summarization, for reduction logging.
    pub original_rows: usize,
}

impl HistoricalWindow {
    pub fn total_rows(&self) -> usize {
        self.recent.len() + self.summarized.len()
    }

    /// Flatten into a single record set for downstream analysis.
    pub fn into_records(self) -> Vec<FunnelRecord> {
        let mut records = self.recent;
        records.extend(self.summarized);
        records
    }
}

/// Partition records against `reference_date` and collapse everything older
/// than `keep_last_n_days` into per-bucket aggregates.
///
/// The output row count is bounded by `buckets x distinct dimension-value
/// combinations` regardless of raw input size, and every dimension value
/// observed in the older partition survives in at least one aggregate.
pub fn summarize(
    records: Vec<FunnelRecord>,
    reference_date: NaiveDate,
    keep_last_n_days: i64,
) -> HistoricalWindow {
    let original_rows = records.len();
    let cutoff = reference_date - Duration::days(keep_last_n_days);

    let mut recent = Vec::new();
    // Grouping key is (week start, exact dimension-value combination);
    // BTreeMap keeps the combination hashable and order-insensitive.
    let mut buckets: HashMap<(NaiveDate, BTreeMap<String, String>), StepTotals> = HashMap::new();

    for record in records {
        if record.date >= cutoff {
            recent.push(record);
            continue;
        }
        let key = (week_start(record.date), record.dimensions.clone().into_iter().collect());
        buckets.entry(key).or_default().accumulate(&record);
    }

    let summarized: Vec<FunnelRecord> = buckets
        .into_iter()
        .map(|((week, dimensions), totals)| FunnelRecord {
            dimensions: dimensions.into_iter().collect(),
            view_item: totals.view_item,
            add_to_cart: totals.add_to_cart,
            purchase: totals.purchase,
            date: week,
        })
        .collect();

    debug!(
        original_rows,
        recent_rows = recent.len(),
        summarized_rows = summarized.len(),
        "historical window built"
    );

    HistoricalWindow {
        recent,
        summarized,
        original_rows,
    }
}

/// Monday of the ISO week containing `date`.
fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap as StdHashMap;

    fn record(date: NaiveDate, channel: &str, view: u64) -> FunnelRecord {
        FunnelRecord {
            dimensions: StdHashMap::from([("channel".to_string(), channel.to_string())]),
            view_item: view,
            add_to_cart: view / 5,
            purchase: view / 50,
            date,
        }
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_recent_records_kept_verbatim() {
        let reference = day(2025, 6, 30);
        let recent = record(day(2025, 6, 20), "Social", 100);
        let old = record(day(2025, 3, 1), "Social", 100);
        let window = summarize(vec![recent.clone(), old], reference, 30);
        assert_eq!(window.recent, vec![recent]);
        assert_eq!(window.summarized.len(), 1);
    }

    #[test]
    fn test_cutoff_is_inclusive_of_window_edge() {
        let reference = day(2025, 6, 30);
        let edge = record(day(2025, 5, 31), "Social", 100);
        let window = summarize(vec![edge.clone()], reference, 30);
        assert_eq!(window.recent, vec![edge]);
        assert!(window.summarized.is_empty());
    }

    #[test]
    fn test_older_records_collapse_per_week_and_combination() {
        let reference = day(2025, 6, 30);
        // Three records in the same ISO week for the same channel, one for
        // a different channel: two aggregates expected.
        let records = vec![
            record(day(2025, 3, 3), "Social", 100),
            record(day(2025, 3, 4), "Social", 100),
            record(day(2025, 3, 9), "Social", 100), // Sunday, same week
            record(day(2025, 3, 4), "Email", 40),
        ];
        let window = summarize(records, reference, 30);
        assert!(window.recent.is_empty());
        assert_eq!(window.summarized.len(), 2);

        let social = window
            .summarized
            .iter()
            .find(|r| r.dimensions["channel"] == "Social")
            .unwrap();
        assert_eq!(social.view_item, 300);
        assert_eq!(social.date, day(2025, 3, 3)); // Monday of that week
    }

    #[test]
    fn test_row_count_bounded_by_buckets_not_input_size() {
        let reference = day(2025, 6, 30);
        // Same four ISO weeks and two channels whether we feed 10 rows or
        // 10,000 rows.
        let build = |rows_per_day: usize| {
            let mut records = Vec::new();
            for week in 0..4 {
                for channel in ["Social", "Email"] {
                    let date = day(2025, 1, 6) + Duration::days(week * 7);
                    for _ in 0..rows_per_day {
                        records.push(record(date, channel, 10));
                    }
                }
            }
            records
        };

        let small = summarize(build(1), reference, 30);
        let large = summarize(build(1_250), reference, 30);
        assert_eq!(small.summarized.len(), 8);
        assert_eq!(large.summarized.len(), 8);
        assert_eq!(large.original_rows, 10_000);
    }

    #[test]
    fn test_counts_survive_summarization_exactly() {
        let reference = day(2025, 6, 30);
        let records = vec![
            record(day(2025, 2, 3), "Social", 120),
            record(day(2025, 2, 5), "Social", 80),
        ];
        let window = summarize(records, reference, 30);
        let agg = &window.summarized[0];
        assert_eq!(agg.view_item, 200);
        assert_eq!(agg.add_to_cart, 40);
        assert_eq!(agg.purchase, 3); // 120/50 + 80/50 = 2 + 1
    }

    #[test]
    fn test_no_older_value_is_dropped() {
        let reference = day(2025, 6, 30);
        let mut records = Vec::new();
        for (i, channel) in ["Social", "Email", "Direct", "Referral"].iter().enumerate() {
            records.push(record(day(2025, 1, 6) + Duration::days(i as i64 * 7), channel, 50));
        }
        let window = summarize(records, reference, 30);
        let mut seen: Vec<&str> = window
            .summarized
            .iter()
            .map(|r| r.dimensions["channel"].as_str())
            .collect();
        seen.sort_unstable();
        assert_eq!(seen, vec!["Direct", "Email", "Referral", "Social"]);
    }

    #[test]
    fn test_into_records_concatenates_partitions() {
        let reference = day(2025, 6, 30);
        let records = vec![
            record(day(2025, 6, 25), "Social", 100),
            record(day(2025, 1, 8), "Social", 100),
        ];
        let window = summarize(records, reference, 30);
        assert_eq!(window.total_rows(), 2);
        assert_eq!(window.into_records().len(), 2);
    }
}
