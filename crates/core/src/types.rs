use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Bucket value for records that carry no value for a requested dimension.
/// Matches the upstream analytics convention so grouped output lines up with
/// what the reporting layer already displays.
pub const NOT_SET: &str = "(not set)";

/// One funnel observation: step counts for a single dimension-value
/// combination on a single date. Immutable once ingested.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunnelRecord {
    /// Dimension name -> value, e.g. {"channel": "Social"}.
    pub dimensions: HashMap<String, String>,
    pub view_item: u64,
    pub add_to_cart: u64,
    pub purchase: u64,
    pub date: NaiveDate,
}

impl FunnelRecord {
    pub fn totals(&self) -> StepTotals {
        StepTotals {
            view_item: self.view_item,
            add_to_cart: self.add_to_cart,
            purchase: self.purchase,
        }
    }
}

/// Summed step counts across a set of records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepTotals {
    pub view_item: u64,
    pub add_to_cart: u64,
    pub purchase: u64,
}

impl StepTotals {
    pub fn accumulate(&mut self, record: &FunnelRecord) {
        self.view_item += record.view_item;
        self.add_to_cart += record.add_to_cart;
        self.purchase += record.purchase;
    }

    pub fn merge(&mut self, other: StepTotals) {
        self.view_item += other.view_item;
        self.add_to_cart += other.add_to_cart;
        self.purchase += other.purchase;
    }

    pub fn view_to_cart_rate(&self) -> f64 {
        ratio(self.add_to_cart, self.view_item)
    }

    pub fn cart_to_purchase_rate(&self) -> f64 {
        ratio(self.purchase, self.add_to_cart)
    }

    pub fn overall_conversion_rate(&self) -> f64 {
        ratio(self.purchase, self.view_item)
    }
}

fn ratio(numerator: u64, denominator: u64) -> f64 {
    if denominator > 0 {
        numerator as f64 / denominator as f64
    } else {
        0.0
    }
}

/// Overall conversion rates summed across all records, the comparison point
/// for outlier detection. Computed fresh per analysis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaselineRates {
    pub view_to_cart_rate: f64,
    pub cart_to_purchase_rate: f64,
    pub overall_conversion_rate: f64,
    /// The summed step counts the rates were derived from.
    pub totals: StepTotals,
}

/// Per (dimension, value) conversion metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionMetric {
    pub view_item: u64,
    pub add_to_cart: u64,
    pub purchase: u64,
    pub view_to_cart_rate: f64,
    pub cart_to_purchase_rate: f64,
    pub overall_conversion_rate: f64,
    pub view_to_cart_dropoff: u64,
    pub cart_to_purchase_dropoff: u64,
    pub sample_size: u64,
    /// Set when sample_size is below the configured minimum. The metric is
    /// still reported; downstream outliers carry a low_confidence tag.
    pub low_sample: bool,
}

impl DimensionMetric {
    pub fn from_totals(totals: StepTotals, min_sample_size: u64) -> Self {
        Self {
            view_item: totals.view_item,
            add_to_cart: totals.add_to_cart,
            purchase: totals.purchase,
            view_to_cart_rate: totals.view_to_cart_rate(),
            cart_to_purchase_rate: totals.cart_to_purchase_rate(),
            overall_conversion_rate: totals.overall_conversion_rate(),
            view_to_cart_dropoff: totals.view_item.saturating_sub(totals.add_to_cart),
            cart_to_purchase_dropoff: totals.add_to_cart.saturating_sub(totals.purchase),
            sample_size: totals.view_item,
            low_sample: totals.view_item < min_sample_size,
        }
    }

    pub fn stage_rate(&self, stage: FunnelStage) -> f64 {
        match stage {
            FunnelStage::ViewToCart => self.view_to_cart_rate,
            FunnelStage::CartToPurchase => self.cart_to_purchase_rate,
        }
    }
}

/// The two adjacent-step transitions of the funnel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FunnelStage {
    ViewToCart,
    CartToPurchase,
}

impl BaselineRates {
    pub fn stage_rate(&self, stage: FunnelStage) -> f64 {
        match stage {
            FunnelStage::ViewToCart => self.view_to_cart_rate,
            FunnelStage::CartToPurchase => self.cart_to_purchase_rate,
        }
    }
}

/// Severity tier assigned to an outlier. Ordering follows magnitude, so
/// `Medium < High < Critical`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Medium,
    High,
    Critical,
}

/// Whether a dimension value performs above or below baseline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Performance {
    Above,
    Below,
}

/// A dimension value whose stage rate deviates from baseline beyond the
/// reporting threshold. Owned by one analysis run, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Outlier {
    pub dimension: String,
    pub value: String,
    pub stage: FunnelStage,
    pub metric_rate: f64,
    pub baseline_rate: f64,
    /// Signed fraction: (metric_rate - baseline_rate) / baseline_rate.
    pub deviation: f64,
    pub severity: Severity,
    pub performance: Performance,
    /// Advisory flag carried from a low_sample metric, never dropped.
    pub low_confidence: bool,
    pub sample_size: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(view: u64, cart: u64, purchase: u64) -> FunnelRecord {
        FunnelRecord {
            dimensions: HashMap::new(),
            view_item: view,
            add_to_cart: cart,
            purchase,
            date: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
        }
    }

    #[test]
    fn test_totals_rates() {
        let mut totals = StepTotals::default();
        totals.accumulate(&record(100, 20, 5));
        totals.accumulate(&record(100, 20, 5));
        assert_eq!(totals.view_item, 200);
        assert!((totals.view_to_cart_rate() - 0.2).abs() < f64::EPSILON);
        assert!((totals.cart_to_purchase_rate() - 0.25).abs() < f64::EPSILON);
        assert!((totals.overall_conversion_rate() - 0.05).abs() < f64::EPSILON);
    }

    #[test]
    fn test_zero_denominators_yield_zero_rates() {
        let totals = StepTotals::default();
        assert_eq!(totals.view_to_cart_rate(), 0.0);
        assert_eq!(totals.cart_to_purchase_rate(), 0.0);
        assert_eq!(totals.overall_conversion_rate(), 0.0);
    }

    #[test]
    fn test_metric_flags_low_sample() {
        let metric = DimensionMetric::from_totals(record(10, 2, 1).totals(), 30);
        assert!(metric.low_sample);
        assert_eq!(metric.sample_size, 10);
        let metric = DimensionMetric::from_totals(record(100, 20, 5).totals(), 30);
        assert!(!metric.low_sample);
    }

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Medium < Severity::High);
        assert!(Severity::High < Severity::Critical);
    }
}
