//! Funnel metrics engine: baseline rates, per-dimension breakdowns, and
//! outlier detection against the baseline.

pub mod baseline;
pub mod dimensions;
pub mod mock;
pub mod outliers;

pub use baseline::calculate_baseline;
pub use dimensions::{aggregate_dimension, aggregate_dimensions, DimensionBreakdowns};
pub use outliers::{critical_issues, detect_outliers, rank_by_deviation, top_opportunities};
