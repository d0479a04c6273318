//! Agent outputs exchanged between an agent loop and its coordinator.

use serde::{Deserialize, Serialize};

use super::effect::SideEffect;

/// A typed piece of content emitted by an agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    #[serde(rename = "type")]
    pub artifact_type: String,
    pub content: String,
}

impl Artifact {
    pub fn new(artifact_type: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            artifact_type: artifact_type.into(),
            content: content.into(),
        }
    }
}

/// Why an agent loop stopped iterating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoopExit {
    /// Cost or token ceiling reached
    BudgetExhausted,
    /// Tool invocation cap reached
    IterationLimit,
    /// Analyzer found no tool worth its cost
    LowValue,
    /// Unhandled error in plan, reason, analyze, or artifact generation
    Failed,
}

impl LoopExit {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoopExit::BudgetExhausted => "budget_exhausted",
            LoopExit::IterationLimit => "iteration_limit",
            LoopExit::LowValue => "low_value",
            LoopExit::Failed => "failed",
        }
    }
}

impl std::fmt::Display for LoopExit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Result of one agent invocation. Immutable once returned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentOutput {
    pub agent_id: String,
    pub success: bool,
    pub artifacts: Vec<Artifact>,
    pub cost_usd: f64,
    pub tokens_used: u64,
    pub duration_ms: u64,
    pub tools_invoked: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub exit: LoopExit,
    pub iterations: u32,
    pub integrations: u32,
    #[serde(default)]
    pub side_effects: Vec<SideEffect>,
}

impl AgentOutput {
    /// Output for an agent that failed before producing artifacts.
    pub fn failure(agent_id: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            agent_id: agent_id.into(),
            success: false,
            artifacts: Vec::new(),
            cost_usd: 0.0,
            tokens_used: 0,
            duration_ms: 0,
            tools_invoked: Vec::new(),
            error: Some(error.into()),
            exit: LoopExit::Failed,
            iterations: 0,
            integrations: 0,
            side_effects: Vec::new(),
        }
    }
}
