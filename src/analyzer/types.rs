//! Analyzer candidate and decision types.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A scored capability considered during one analyzer call. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolCandidate {
    pub id: String,
    pub version: String,
    /// In [0, 0.8]
    pub estimated_improvement: f64,
    pub estimated_cost_usd: f64,
    pub input: Value,
    pub reasoning: String,
    /// Normalized value of information in [0, 1]
    pub voi_score: f64,
}

/// The analyzer's verdict for one loop iteration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzerDecision {
    pub use_tool: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voi_score: Option<f64>,
    pub reasoning: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_cost_usd: Option<f64>,
    /// Input to pass to the chosen tool
    #[serde(default)]
    pub input: Value,
}

impl AnalyzerDecision {
    /// Decision not to consult any tool.
    pub fn skip(reasoning: impl Into<String>) -> Self {
        Self {
            use_tool: false,
            tool_id: None,
            voi_score: None,
            reasoning: reasoning.into(),
            estimated_cost_usd: None,
            input: Value::Null,
        }
    }

    /// Decision not to use the best candidate, keeping its score for the record.
    pub fn reject(candidate: &ToolCandidate, reasoning: impl Into<String>) -> Self {
        Self {
            use_tool: false,
            tool_id: Some(candidate.id.clone()),
            voi_score: Some(candidate.voi_score),
            reasoning: reasoning.into(),
            estimated_cost_usd: Some(candidate.estimated_cost_usd),
            input: Value::Null,
        }
    }

    /// Decision to invoke the given candidate.
    pub fn invoke(candidate: ToolCandidate) -> Self {
        Self {
            use_tool: true,
            tool_id: Some(candidate.id),
            voi_score: Some(candidate.voi_score),
            reasoning: candidate.reasoning,
            estimated_cost_usd: Some(candidate.estimated_cost_usd),
            input: candidate.input,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate() -> ToolCandidate {
        ToolCandidate {
            id: "web-search".into(),
            version: "1.0.0".into(),
            estimated_improvement: 0.4,
            estimated_cost_usd: 0.05,
            input: serde_json::json!({"q": "x"}),
            reasoning: "large confidence gap".into(),
            voi_score: 0.67,
        }
    }

    #[test]
    fn test_skip() {
        let decision = AnalyzerDecision::skip("confident enough");
        assert!(!decision.use_tool);
        assert!(decision.tool_id.is_none());
        assert!(decision.voi_score.is_none());
    }

    #[test]
    fn test_invoke_carries_input() {
        let decision = AnalyzerDecision::invoke(candidate());
        assert!(decision.use_tool);
        assert_eq!(decision.tool_id.as_deref(), Some("web-search"));
        assert_eq!(decision.input["q"], "x");
    }

    #[test]
    fn test_reject_keeps_score() {
        let decision = AnalyzerDecision::reject(&candidate(), "below threshold");
        assert!(!decision.use_tool);
        assert_eq!(decision.voi_score, Some(0.67));
    }
}
