//! Payload optimization for long-term storage: cap ranked list fields,
//! truncate free text, drop fields the report viewer never reads. Lossy and
//! one-way; the optimized shape is never fed back into analysis.

use crate::insights::{AnalysisInsights, CriticalIssue, Opportunity, Recommendation};
use crate::pipeline::AnalysisReport;
use funnel_analytics::rank_by_deviation;
use funnel_core::config::OptimizerConfig;
use funnel_core::types::{BaselineRates, Outlier};
use funnel_core::FunnelResult;
use serde::{Deserialize, Serialize};
use tracing::info;

// ─── Storage Shapes ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizedPayload {
    pub model: Option<String>,
    pub baseline: BaselineRates,
    /// Most significant outliers by |deviation|, capped to top-N.
    pub top_outliers: Vec<Outlier>,
    pub critical_issues: Vec<TrimmedIssue>,
    pub opportunities: Vec<TrimmedOpportunity>,
    pub recommendations: Vec<TrimmedRecommendation>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrimmedIssue {
    pub dimension: String,
    pub value: String,
    pub issue: String,
    pub impact: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrimmedOpportunity {
    pub dimension: String,
    pub value: String,
    pub opportunity: String,
    pub potential_lift: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrimmedRecommendation {
    pub priority: u32,
    pub action: String,
    pub impact: String,
    pub implementation: String,
}

/// Byte sizes before and after, reported to the caller for observability.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct OptimizationStats {
    pub original_size: usize,
    pub optimized_size: usize,
    pub savings_percent: f64,
}

// ─── Optimizer ──────────────────────────────────────────────────────────────

pub struct PayloadOptimizer {
    config: OptimizerConfig,
}

impl PayloadOptimizer {
    pub fn new(config: OptimizerConfig) -> Self {
        Self { config }
    }

    pub fn optimize(
        &self,
        report: &AnalysisReport,
        insights: &AnalysisInsights,
    ) -> FunnelResult<(OptimizedPayload, OptimizationStats)> {
        let original_size =
            serde_json::to_string(report)?.len() + serde_json::to_string(insights)?.len();

        let mut top_outliers = report.outliers.clone();
        rank_by_deviation(&mut top_outliers);
        top_outliers.truncate(self.config.top_n);

        let payload = OptimizedPayload {
            model: insights.model.clone(),
            baseline: report.baseline.clone(),
            top_outliers,
            critical_issues: self.trim_issues(&insights.critical_issues),
            opportunities: self.trim_opportunities(&insights.opportunities),
            recommendations: self.trim_recommendations(&insights.recommendations),
        };

        let optimized_size = serde_json::to_string(&payload)?.len();
        let savings_percent = if original_size > 0 {
            (original_size.saturating_sub(optimized_size)) as f64 / original_size as f64 * 100.0
        } else {
            0.0
        };
        info!(
            original_size,
            optimized_size,
            savings_percent,
            "storage payload optimized"
        );

        Ok((
            payload,
            OptimizationStats {
                original_size,
                optimized_size,
                savings_percent,
            },
        ))
    }

    fn trim_issues(&self, issues: &[CriticalIssue]) -> Vec<TrimmedIssue> {
        let mut ranked: Vec<&CriticalIssue> = issues.iter().collect();
        ranked.sort_by_key(|issue| impact_rank(&issue.impact));
        ranked
            .into_iter()
            .take(self.config.top_n)
            .map(|issue| TrimmedIssue {
                dimension: issue.dimension.clone(),
                value: issue.value.clone(),
                issue: truncate(&issue.issue, self.config.max_text_len),
                impact: issue.impact.clone(),
            })
            .collect()
    }

    fn trim_opportunities(&self, opportunities: &[Opportunity]) -> Vec<TrimmedOpportunity> {
        let mut ranked: Vec<&Opportunity> = opportunities.iter().collect();
        ranked.sort_by(|a, b| {
            parse_lift(&b.potential_lift)
                .partial_cmp(&parse_lift(&a.potential_lift))
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        ranked
            .into_iter()
            .take(self.config.top_n)
            .map(|opportunity| TrimmedOpportunity {
                dimension: opportunity.dimension.clone(),
                value: opportunity.value.clone(),
                opportunity: truncate(&opportunity.opportunity, self.config.max_text_len),
                potential_lift: opportunity.potential_lift.clone(),
            })
            .collect()
    }

    fn trim_recommendations(&self, recommendations: &[Recommendation]) -> Vec<TrimmedRecommendation> {
        let mut ranked: Vec<&Recommendation> = recommendations.iter().collect();
        ranked.sort_by_key(|rec| rec.priority);
        ranked
            .into_iter()
            .take(self.config.top_n)
            .map(|rec| TrimmedRecommendation {
                priority: rec.priority,
                action: truncate(&rec.action, self.config.max_action_len),
                impact: truncate(&rec.expected_impact, self.config.max_impact_len),
                implementation: rec.implementation.clone(),
            })
            .collect()
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        text.chars().take(max_chars).collect()
    }
}

fn impact_rank(impact: &str) -> u8 {
    match impact.to_ascii_lowercase().as_str() {
        "high" => 0,
        "medium" => 1,
        "low" => 2,
        _ => 3,
    }
}

/// Best-effort numeric read of a lift label like "+15%"; unparseable labels
/// rank last.
fn parse_lift(lift: &str) -> f64 {
    let cleaned: String = lift
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();
    cleaned.parse().unwrap_or(0.0)
}

// ─── Tests ──────────────────────────────────────────────────────────────────
