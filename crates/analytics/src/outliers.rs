//! Outlier detection: flag dimension values whose stage rates deviate from
//! baseline beyond the reporting threshold.

use crate::dimensions::DimensionBreakdowns;
use funnel_core::types::{BaselineRates, FunnelStage, Outlier, Performance, Severity};

/// Severity bands by absolute deviation, evaluated top-down. Kept as data so
/// the thresholds are testable in isolation.
pub const SEVERITY_BANDS: &[(f64, Severity)] = &[
    (0.50, Severity::Critical),
    (0.35, Severity::High),
    (0.20, Severity::Medium),
];

/// Map an absolute deviation to its severity band, if it clears the lowest.
pub fn classify_severity(deviation: f64) -> Option<Severity> {
    let magnitude = deviation.abs();
    SEVERITY_BANDS
        .iter()
        .find(|(lower_bound, _)| magnitude >= *lower_bound)
        .map(|(_, severity)| *severity)
}

/// Evaluate every (dimension, value) against baseline at both stage rates
/// independently and emit one outlier per stage whose |deviation| clears
/// `threshold`. A stage whose baseline rate is zero has no defined deviation
/// and is skipped. Output order is unspecified; ranking is the consumer's
/// concern.
pub fn detect_outliers(
    baseline: &BaselineRates,
    breakdowns: &DimensionBreakdowns,
    threshold: f64,
) -> Vec<Outlier> {
    let mut outliers = Vec::new();

    for (dimension, values) in breakdowns {
        for (value, metric) in values {
            for stage in [FunnelStage::ViewToCart, FunnelStage::CartToPurchase] {
                let baseline_rate = baseline.stage_rate(stage);
                if baseline_rate == 0.0 {
                    continue;
                }

                let metric_rate = metric.stage_rate(stage);
                let deviation = (metric_rate - baseline_rate) / baseline_rate;
                if deviation.abs() < threshold {
                    continue;
                }
                let Some(severity) = classify_severity(deviation) else {
                    continue;
                };

                outliers.push(Outlier {
                    dimension: dimension.clone(),
                    value: value.clone(),
                    stage,
                    metric_rate,
                    baseline_rate,
                    deviation,
                    severity,
                    performance: if deviation > 0.0 {
                        Performance::Above
                    } else {
                        Performance::Below
                    },
                    low_confidence: metric.low_sample,
                    sample_size: metric.sample_size,
                });
            }
        }
    }

    outliers
}

/// Sort outliers by |deviation| descending, most significant first.
pub fn rank_by_deviation(outliers: &mut [Outlier]) {
    outliers.sort_by(|a, b| {
        b.deviation
            .abs()
            .partial_cmp(&a.deviation.abs())
            .unwrap_or(std::cmp::Ordering::Equal)
    });
}

/// Positive outliers worth capitalizing on, highest deviation first.
pub fn top_opportunities(outliers: &[Outlier], limit: usize) -> Vec<Outlier> {
    let mut opportunities: Vec<Outlier> = outliers
        .iter()
        .filter(|o| o.performance == Performance::Above)
        .cloned()
        .collect();
    rank_by_deviation(&mut opportunities);
    opportunities.truncate(limit);
    opportunities
}

/// Negative outliers to address, worst severity first, then |deviation|.
pub fn critical_issues(outliers: &[Outlier], limit: usize) -> Vec<Outlier> {
    let mut issues: Vec<Outlier> = outliers
        .iter()
        .filter(|o| o.performance == Performance::Below)
        .cloned()
        .collect();
    issues.sort_by(|a, b| {
        b.severity.cmp(&a.severity).then(
            b.deviation
                .abs()
                .partial_cmp(&a.deviation.abs())
                .unwrap_or(std::cmp::Ordering::Equal),
        )
    });
    issues.truncate(limit);
    issues
}
