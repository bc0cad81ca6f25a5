//! FunnelPulse — funnel conversion metrics, outlier detection, and bounded
//! result caching for ecommerce event funnels.
//!
//! Demo entry point: runs one analysis over mock upstream data and prints
//! the report and its storage payload as JSON. The HTTP surface and insight
//! generation live outside this binary.

use chrono::{Duration, Utc};
use clap::Parser;
use funnel_analytics::mock;
use funnel_cache::{CacheStore, FingerprintCache, MemoryStore, RedisStore, SystemClock};
use funnel_core::config::AppConfig;
use funnel_reporting::{AnalysisEngine, AnalysisInsights, AnalysisRequest};
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "funnel-pulse")]
#[command(about = "Funnel conversion analysis with outlier detection and result caching")]
#[command(version)]
struct Cli {
    /// Analytics property identifier
    #[arg(long, env = "FUNNEL_PULSE__PROPERTY_ID", default_value = "476872592")]
    property_id: String,

    /// Days of data to analyze
    #[arg(long, default_value_t = 30)]
    days: u32,

    /// Comma-separated dimensions to break down (defaults to all mock dimensions)
    #[arg(long, value_delimiter = ',')]
    dimensions: Vec<String>,

    /// Generate mock upstream data instead of reading an ingested batch
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    use_mock_data: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "funnel_pulse=info,funnel_reporting=info".into()),
        )
        .json()
        .init();

    let cli = Cli::parse();

    info!("FunnelPulse starting up");

    let config = AppConfig::load().unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load config, using defaults");
        AppConfig::default()
    });

    let store: Arc<dyn CacheStore> = match &config.cache.redis_url {
        Some(url) => match RedisStore::connect(url, config.cache.ttl_secs).await {
            Ok(store) => Arc::new(store),
            Err(e) => {
                warn!(error = %e, "Redis unavailable, falling back to in-memory cache");
                Arc::new(MemoryStore::new(config.cache.max_entries))
            }
        },
        None => Arc::new(MemoryStore::new(config.cache.max_entries)),
    };

    let cache = Arc::new(FingerprintCache::new(
        store,
        Arc::new(SystemClock),
        &config.cache,
    ));
    let engine = AnalysisEngine::new(config, cache);

    if !cli.use_mock_data {
        anyhow::bail!("no upstream connector configured; rerun with --use-mock-data");
    }

    let end_date = Utc::now().date_naive();
    let start_date = end_date - Duration::days(i64::from(cli.days) - 1);
    let records = mock::generate_mock_records(cli.days, end_date);
    let dimensions = if cli.dimensions.is_empty() {
        mock::mock_dimensions()
    } else {
        cli.dimensions.clone()
    };

    info!(
        property_id = %cli.property_id,
        records = records.len(),
        dimensions = dimensions.len(),
        "running analysis"
    );

    let outcome = engine
        .analyze(AnalysisRequest {
            property_id: cli.property_id,
            date_range: (start_date, end_date),
            dimensions,
            records,
        })
        .await?;

    info!(
        cache_used = outcome.cache_used,
        cache_key = %outcome.cache_key,
        outliers = outcome.payload.outliers.len(),
        "analysis complete"
    );

    // Narrative generation is an external collaborator; store without it.
    let stored = engine.prepare_for_storage(&outcome, &AnalysisInsights::unavailable())?;

    println!("{}", serde_json::to_string_pretty(&outcome.payload)?);
    println!("{}", serde_json::to_string_pretty(&stored)?);

    Ok(())
}
