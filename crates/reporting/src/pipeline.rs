//! End-to-end analysis pipeline: bound oversized history, compute baseline,
//! break down dimensions, and detect outliers, memoized behind the
//! fingerprint cache, then shape the result for the insight and persistence
//! layers.

use crate::insights::AnalysisInsights;
use crate::optimizer::{OptimizedPayload, PayloadOptimizer};
use chrono::{DateTime, NaiveDate, Utc};
use funnel_analytics::dimensions::DimensionBreakdowns;
use funnel_analytics::{aggregate_dimensions, calculate_baseline, detect_outliers};
use funnel_cache::{CacheOutcome, FingerprintCache, KeyInputs};
use funnel_core::config::AppConfig;
use funnel_core::types::{BaselineRates, FunnelRecord, Outlier};
use funnel_core::FunnelResult;
use funnel_history::summarize;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

/// One analysis run over a batch of records, as handed over by the request
/// layer.
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    pub property_id: String,
    pub date_range: (NaiveDate, NaiveDate),
    pub dimensions: Vec<String>,
    pub records: Vec<FunnelRecord>,
}

/// The full analysis result, the exact contract the insight generator
/// consumes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub report_id: Uuid,
    pub property_id: String,
    pub date_range: (NaiveDate, NaiveDate),
    pub baseline: BaselineRates,
    pub metrics: DimensionBreakdowns,
    pub outliers: Vec<Outlier>,
    /// dimension -> error text for dimensions that failed; the rest of the
    /// batch is unaffected.
    pub dimension_errors: HashMap<String, String>,
    pub computed_at: DateTime<Utc>,
}

/// What the persistence layer receives: the optimized payload plus cache
/// bookkeeping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredResult {
    pub payload: OptimizedPayload,
    pub cache_used: bool,
    pub cache_key: String,
    pub savings_percent: f64,
}

pub struct AnalysisEngine {
    config: AppConfig,
    cache: Arc<FingerprintCache>,
    optimizer: PayloadOptimizer,
}

impl AnalysisEngine {
    pub fn new(config: AppConfig, cache: Arc<FingerprintCache>) -> Self {
        let optimizer = PayloadOptimizer::new(config.optimizer.clone());
        Self {
            config,
            cache,
            optimizer,
        }
    }

    /// Run one analysis. The baseline is computed up front because it is
    /// part of the cache fingerprint; the per-dimension work behind it runs
    /// at most once per fingerprint within the TTL.
    pub async fn analyze(
        &self,
        request: AnalysisRequest,
    ) -> FunnelResult<CacheOutcome<AnalysisReport>> {
        let AnalysisRequest {
            property_id,
            date_range,
            dimensions,
            records,
        } = request;

        let records = if records.len() > self.config.history.summarize_over_rows {
            let window = summarize(records, date_range.1, self.config.history.keep_last_n_days);
            info!(
                original_rows = window.original_rows,
                bounded_rows = window.total_rows(),
                "summarized oversized history"
            );
            window.into_records()
        } else {
            records
        };

        let baseline = calculate_baseline(&records)?;

        let inputs = KeyInputs {
            property_id: property_id.clone(),
            dimensions: dimensions.clone(),
            date_range,
            baseline: baseline.clone(),
        };

        self.cache
            .get_or_compute(&inputs, || {
                debug!(
                    dimensions = dimensions.len(),
                    records = records.len(),
                    "computing analysis"
                );
                let (metrics, failures) = aggregate_dimensions(
                    &records,
                    &dimensions,
                    self.config.analysis.min_sample_size,
                );
                let outliers =
                    detect_outliers(&baseline, &metrics, self.config.analysis.outlier_threshold);
                Ok(AnalysisReport {
                    report_id: Uuid::new_v4(),
                    property_id,
                    date_range,
                    baseline: baseline.clone(),
                    metrics,
                    outliers,
                    dimension_errors: failures
                        .into_iter()
                        .map(|(dimension, error)| (dimension, error.to_string()))
                        .collect(),
                    computed_at: Utc::now(),
                })
            })
            .await
    }

    /// Shape a computed report and its narrative insights for persistence.
    pub fn prepare_for_storage(
        &self,
        outcome: &CacheOutcome<AnalysisReport>,
        insights: &AnalysisInsights,
    ) -> FunnelResult<StoredResult> {
        let (payload, stats) = self.optimizer.optimize(&outcome.payload, insights)?;
        Ok(StoredResult {
            payload,
            cache_used: outcome.cache_used,
            cache_key: outcome.cache_key.clone(),
            savings_percent: stats.savings_percent,
        })
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use funnel_cache::{MemoryStore, SystemClock};
    use funnel_core::types::{Performance, Severity};

    fn record(date: NaiveDate, channel: &str, view: u64, cart: u64, purchase: u64) -> FunnelRecord {
        FunnelRecord {
            dimensions: HashMap::from([("channel".to_string(), channel.to_string())]),
            view_item: view,
            add_to_cart: cart,
            purchase,
            date,
        }
    }

    fn engine() -> AnalysisEngine {
        engine_with(AppConfig::default())
    }

    fn engine_with(config: AppConfig) -> AnalysisEngine {
        let cache = Arc::new(FingerprintCache::new(
            Arc::new(MemoryStore::new(config.cache.max_entries)),
            Arc::new(SystemClock),
            &config.cache,
        ));
        AnalysisEngine::new(config, cache)
    }

    fn two_channel_request() -> AnalysisRequest {
        let date = NaiveDate::from_ymd_opt(2025, 6, 15).unwrap();
        AnalysisRequest {
            property_id: "476872592".to_string(),
            date_range: (date, date),
            dimensions: vec!["channel".to_string()],
            records: vec![
                record(date, "Social", 100, 10, 1),
                record(date, "Email", 100, 30, 5),
            ],
        }
    }

    #[tokio::test]
    async fn test_full_run_flags_divergent_channels() {
        let engine = engine();
        let outcome = engine.analyze(two_channel_request()).await.unwrap();
        assert!(!outcome.cache_used);

        let report = &outcome.payload;
        assert!((report.baseline.view_to_cart_rate - 0.20).abs() < 1e-12);

        let social = report
            .outliers
            .iter()
            .find(|o| o.value == "Social")
            .unwrap();
        assert_eq!(social.severity, Severity::Critical);
        assert_eq!(social.performance, Performance::Below);
    }

    #[tokio::test]
    async fn test_repeat_analysis_is_served_from_cache() {
        let engine = engine();
        let first = engine.analyze(two_channel_request()).await.unwrap();
        let second = engine.analyze(two_channel_request()).await.unwrap();
        assert!(!first.cache_used);
        assert!(second.cache_used);
        assert_eq!(first.cache_key, second.cache_key);
        assert_eq!(
            serde_json::to_value(&first.payload).unwrap(),
            serde_json::to_value(&second.payload).unwrap()
        );
    }

    #[tokio::test]
    async fn test_failing_dimension_does_not_abort_batch() {
        let engine = engine();
        let mut request = two_channel_request();
        request.dimensions.push("device".to_string());
        let outcome = engine.analyze(request).await.unwrap();
        let report = &outcome.payload;
        assert!(report.metrics.contains_key("channel"));
        assert!(report.dimension_errors.contains_key("device"));
    }

    #[tokio::test]
    async fn test_empty_input_fails_at_baseline() {
        let engine = engine();
        let mut request = two_channel_request();
        request.records.clear();
        let result = engine.analyze(request).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_oversized_history_is_bounded_without_changing_totals() {
        let mut config = AppConfig::default();
        config.history.summarize_over_rows = 10;
        let engine = engine_with(config);

        let end = NaiveDate::from_ymd_opt(2025, 6, 30).unwrap();
        let mut records = Vec::new();
        // 90 old records, far past the keep window.
        for i in 0..90 {
            records.push(record(end - Duration::days(100 + i % 7), "Social", 100, 12, 1));
        }
        records.push(record(end, "Email", 100, 30, 5));

        let request = AnalysisRequest {
            property_id: "476872592".to_string(),
            date_range: (end - Duration::days(120), end),
            dimensions: vec!["channel".to_string()],
            records,
        };
        let outcome = engine.analyze(request).await.unwrap();
        // Summarization collapses rows but must preserve summed counts.
        assert_eq!(outcome.payload.baseline.totals.view_item, 90 * 100 + 100);
        assert_eq!(outcome.payload.metrics["channel"]["Social"].view_item, 9_000);
    }

    #[tokio::test]
    async fn test_prepare_for_storage_carries_cache_bookkeeping() {
        let engine = engine();
        let outcome = engine.analyze(two_channel_request()).await.unwrap();
        let stored = engine
            .prepare_for_storage(&outcome, &AnalysisInsights::unavailable())
            .unwrap();
        assert!(!stored.cache_used);
        assert_eq!(stored.cache_key, outcome.cache_key);
        assert!(stored.savings_percent > 0.0);
        assert!(!stored.payload.top_outliers.is_empty());
    }
}
