//! Reasoning results held by an agent loop.

use serde::{Deserialize, Serialize};

/// The agent's current answer and its self-assessed quality.
///
/// Never mutated in place by the loop: integration produces a new value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReasoningResult {
    pub content: String,
    /// Always within [0, 1].
    pub confidence: f64,
    pub needs_improvement: bool,
    pub reasoning: String,
    pub cost_usd: f64,
    pub tokens_used: u64,
}

impl ReasoningResult {
    pub fn new(content: impl Into<String>, confidence: f64) -> Self {
        Self {
            content: content.into(),
            confidence: clamp_confidence(confidence),
            needs_improvement: false,
            reasoning: String::new(),
            cost_usd: 0.0,
            tokens_used: 0,
        }
    }

    pub fn with_needs_improvement(mut self, needs_improvement: bool) -> Self {
        self.needs_improvement = needs_improvement;
        self
    }

    pub fn with_reasoning(mut self, reasoning: impl Into<String>) -> Self {
        self.reasoning = reasoning.into();
        self
    }

    pub fn with_usage(mut self, cost_usd: f64, tokens_used: u64) -> Self {
        self.cost_usd = cost_usd.max(0.0);
        self.tokens_used = tokens_used;
        self
    }

    /// Gap between full confidence and the current confidence.
    pub fn confidence_gap(&self) -> f64 {
        1.0 - self.confidence
    }
}

pub(crate) fn clamp_confidence(confidence: f64) -> f64 {
    if confidence.is_nan() {
        0.0
    } else {
        confidence.clamp(0.0, 1.0)
    }
}
