//! Narrative insight shapes produced by the external insight generator and
//! carried through to storage. The core never interprets the text; it only
//! ranks, caps, and truncates it.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisInsights {
    /// Identifier of the model that produced the narrative, when known.
    pub model: Option<String>,
    #[serde(default)]
    pub critical_issues: Vec<CriticalIssue>,
    #[serde(default)]
    pub opportunities: Vec<Opportunity>,
    #[serde(default)]
    pub recommendations: Vec<Recommendation>,
    #[serde(default)]
    pub suggested_tests: Vec<SuggestedTest>,
}

impl AnalysisInsights {
    /// Placeholder used when the insight generator is disabled or failed;
    /// the analysis result is still complete without narrative.
    pub fn unavailable() -> Self {
        Self {
            model: None,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CriticalIssue {
    pub dimension: String,
    pub value: String,
    pub issue: String,
    /// Free-form impact label from the generator: "high", "medium", "low".
    pub impact: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Opportunity {
    pub dimension: String,
    pub value: String,
    pub opportunity: String,
    /// e.g. "+15%".
    pub potential_lift: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recommendation {
    pub priority: u32,
    pub action: String,
    pub expected_impact: String,
    pub implementation: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuggestedTest {
    pub test_name: String,
    pub hypothesis: String,
    pub metric: String,
}
