//! Per-dimension breakdowns: group records by one dimension's value and
//! compute conversion metrics per distinct value.

use funnel_core::types::{DimensionMetric, FunnelRecord, StepTotals, NOT_SET};
use funnel_core::{FunnelError, FunnelResult};
use std::collections::HashMap;
use tracing::warn;

/// dimension -> value -> metric, for every dimension that aggregated cleanly.
pub type DimensionBreakdowns = HashMap<String, HashMap<String, DimensionMetric>>;

/// Group records by the value of `dimension` and compute a metric per
/// distinct value with the same sum-then-divide rule as the baseline, scoped
/// to the group. Records without a value for the dimension are bucketed
/// under `"(not set)"`. A dimension no record carries at all is an error.
pub fn aggregate_dimension(
    records: &[FunnelRecord],
    dimension: &str,
    min_sample_size: u64,
) -> FunnelResult<HashMap<String, DimensionMetric>> {
    let mut groups: HashMap<&str, StepTotals> = HashMap::new();
    let mut seen = false;

    for record in records {
        let value = match record.dimensions.get(dimension) {
            Some(value) => {
                seen = true;
                value.as_str()
            }
            None => NOT_SET,
        };
        groups.entry(value).or_default().accumulate(record);
    }

    if !seen {
        return Err(FunnelError::UnknownDimension {
            dimension: dimension.to_string(),
            records: records.len(),
        });
    }

    Ok(groups
        .into_iter()
        .map(|(value, totals)| {
            (
                value.to_string(),
                DimensionMetric::from_totals(totals, min_sample_size),
            )
        })
        .collect())
}

/// Aggregate every requested dimension independently. One dimension failing
/// must not abort the others, so failures are collected and returned
/// alongside the successful breakdowns.
pub fn aggregate_dimensions(
    records: &[FunnelRecord],
    dimensions: &[String],
    min_sample_size: u64,
) -> (DimensionBreakdowns, Vec<(String, FunnelError)>) {
    let mut breakdowns = HashMap::new();
    let mut failures = Vec::new();

    for dimension in dimensions {
        match aggregate_dimension(records, dimension, min_sample_size) {
            Ok(metrics) => {
                breakdowns.insert(dimension.clone(), metrics);
            }
            Err(error) => {
                warn!(dimension = %dimension, error = %error, "dimension aggregation failed");
                failures.push((dimension.clone(), error));
            }
        }
    }

    (breakdowns, failures)
}
