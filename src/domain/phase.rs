//! Phase-level inputs and outputs.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::effect::SideEffect;
use super::output::Artifact;

/// Input handed to every agent of a phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhaseInput {
    pub phase: String,
    pub task: String,
    #[serde(default)]
    pub context: Value,
    /// Feedback from failed gate evaluations of earlier attempts
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hints: Option<PhaseHints>,
}

impl PhaseInput {
    pub fn new(phase: impl Into<String>, task: impl Into<String>) -> Self {
        Self {
            phase: phase.into(),
            task: task.into(),
            context: Value::Null,
            hints: None,
        }
    }

    pub fn with_context(mut self, context: Value) -> Self {
        self.context = context;
        self
    }

    /// Copy of this input carrying the given hints.
    pub fn with_hints(&self, hints: PhaseHints) -> Self {
        let mut enriched = self.clone();
        enriched.hints = Some(hints);
        enriched
    }
}

/// Structured retry guidance derived from gate decisions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhaseHints {
    /// Number of failed gate evaluations these hints summarize
    pub attempt: u32,
    pub failed_metrics: Vec<String>,
    pub required_actions: Vec<String>,
    pub recommendations: Vec<String>,
    pub reasons: Vec<String>,
}

impl PhaseHints {
    pub fn is_empty(&self) -> bool {
        self.failed_metrics.is_empty()
            && self.required_actions.is_empty()
            && self.recommendations.is_empty()
            && self.reasons.is_empty()
    }

    /// Fold newer hints into these, keeping first-seen order without duplicates.
    pub fn merge(&mut self, newer: PhaseHints) {
        self.attempt = self.attempt.max(newer.attempt);
        extend_unique(&mut self.failed_metrics, newer.failed_metrics);
        extend_unique(&mut self.required_actions, newer.required_actions);
        extend_unique(&mut self.recommendations, newer.recommendations);
        extend_unique(&mut self.reasons, newer.reasons);
    }
}

fn extend_unique(target: &mut Vec<String>, items: Vec<String>) {
    for item in items {
        if !target.contains(&item) {
            target.push(item);
        }
    }
}

/// Aggregated result of one phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhaseOutput {
    pub phase: String,
    pub success: bool,
    pub artifacts: Vec<Artifact>,
    pub cost_usd: f64,
    pub tokens_used: u64,
    pub succeeded_agents: Vec<String>,
    pub failed_agents: Vec<String>,
    #[serde(default)]
    pub side_effects: Vec<SideEffect>,
    /// Number of fan-out executions, including gate retries
    #[serde(default)]
    pub attempts: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gate_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PhaseOutput {
    /// A failed phase with no aggregated content.
    pub fn failed(phase: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            phase: phase.into(),
            success: false,
            artifacts: Vec::new(),
            cost_usd: 0.0,
            tokens_used: 0,
            succeeded_agents: Vec::new(),
            failed_agents: Vec::new(),
            side_effects: Vec::new(),
            attempts: 1,
            gate_score: None,
            error: Some(error.into()),
        }
    }
}
