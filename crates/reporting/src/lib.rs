//! Report assembly: the analysis pipeline that wires summarization,
//! metrics, outlier detection, and caching together, plus the payload
//! optimizer that shrinks results for long-term storage.

pub mod insights;
pub mod optimizer;
pub mod pipeline;

pub use insights::AnalysisInsights;
pub use optimizer::{OptimizationStats, OptimizedPayload, PayloadOptimizer};
pub use pipeline::{AnalysisEngine, AnalysisReport, AnalysisRequest, StoredResult};
