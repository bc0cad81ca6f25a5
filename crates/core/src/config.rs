use serde::Deserialize;

/// Root application configuration. Loaded from environment variables with
/// the prefix `FUNNEL_PULSE__`.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub history: HistoryConfig,
    #[serde(default)]
    pub optimizer: OptimizerConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnalysisConfig {
    /// Minimum |deviation| from baseline for a value to be reported.
    #[serde(default = "default_outlier_threshold")]
    pub outlier_threshold: f64,
    /// view_item count under which a metric is flagged low_sample.
    #[serde(default = "default_min_sample_size")]
    pub min_sample_size: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_cache_ttl_secs")]
    pub ttl_secs: u64,
    /// Decimal places baseline rates are rounded to before fingerprinting,
    /// so float noise does not defeat cache hits.
    #[serde(default = "default_rate_precision")]
    pub rate_precision: u32,
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,
    /// When set, cache entries live in Redis instead of process memory.
    #[serde(default)]
    pub redis_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HistoryConfig {
    /// Days of history kept at full fidelity; older records are summarized.
    #[serde(default = "default_keep_last_n_days")]
    pub keep_last_n_days: i64,
    /// Row count above which the summarizer runs at all.
    #[serde(default = "default_summarize_over_rows")]
    pub summarize_over_rows: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OptimizerConfig {
    /// Cap on each ranked list field in the stored payload.
    #[serde(default = "default_top_n")]
    pub top_n: usize,
    #[serde(default = "default_max_text_len")]
    pub max_text_len: usize,
    #[serde(default = "default_max_action_len")]
    pub max_action_len: usize,
    #[serde(default = "default_max_impact_len")]
    pub max_impact_len: usize,
}

// Default functions
fn default_outlier_threshold() -> f64 {
    0.20
}
fn default_min_sample_size() -> u64 {
    30
}
fn default_cache_ttl_secs() -> u64 {
    86_400
}
fn default_rate_precision() -> u32 {
    4
}
fn default_max_entries() -> usize {
    100
}
fn default_keep_last_n_days() -> i64 {
    30
}
fn default_summarize_over_rows() -> usize {
    1_000
}
fn default_top_n() -> usize {
    5
}
fn default_max_text_len() -> usize {
    200
}
fn default_max_action_len() -> usize {
    150
}
fn default_max_impact_len() -> usize {
    100
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            outlier_threshold: default_outlier_threshold(),
            min_sample_size: default_min_sample_size(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_cache_ttl_secs(),
            rate_precision: default_rate_precision(),
            max_entries: default_max_entries(),
            redis_url: None,
        }
    }
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            keep_last_n_days: default_keep_last_n_days(),
            summarize_over_rows: default_summarize_over_rows(),
        }
    }
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            top_n: default_top_n(),
            max_text_len: default_max_text_len(),
            max_action_len: default_max_action_len(),
            max_impact_len: default_max_impact_len(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            analysis: AnalysisConfig::default(),
            cache: CacheConfig::default(),
            history: HistoryConfig::default(),
            optimizer: OptimizerConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the environment.
    pub fn load() -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder().add_source(
            config::Environment::with_prefix("FUNNEL_PULSE")
                .separator("__")
                .try_parsing(true)
                .list_separator(","),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }
}
