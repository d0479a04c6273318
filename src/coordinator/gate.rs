//! Quality gate seam evaluated after fan-in.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::PhaseOutput;
use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GateStatus {
    Pass,
    /// Logged, never blocks
    Warn,
    Fail,
}

impl GateStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            GateStatus::Pass => "pass",
            GateStatus::Warn => "warn",
            GateStatus::Fail => "fail",
        }
    }

    pub fn is_blocking(&self) -> bool {
        *self == GateStatus::Fail
    }
}

impl std::fmt::Display for GateStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Human-readable explanation of a gate verdict.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GateDecision {
    pub reasons: Vec<String>,
    pub required_actions: Vec<String>,
    pub failed_metrics: Vec<String>,
    pub recommendations: Vec<String>,
}

impl GateDecision {
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reasons.push(reason.into());
        self
    }

    pub fn with_required_action(mut self, action: impl Into<String>) -> Self {
        self.required_actions.push(action.into());
        self
    }

    pub fn with_failed_metric(mut self, metric: impl Into<String>) -> Self {
        self.failed_metrics.push(metric.into());
        self
    }

    pub fn with_recommendation(mut self, recommendation: impl Into<String>) -> Self {
        self.recommendations.push(recommendation.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GateResult {
    pub status: GateStatus,
    pub overall_score: f64,
    #[serde(default)]
    pub decision: GateDecision,
}

impl GateResult {
    pub fn pass(overall_score: f64) -> Self {
        Self {
            status: GateStatus::Pass,
            overall_score,
            decision: GateDecision::default(),
        }
    }

    pub fn warn(overall_score: f64, decision: GateDecision) -> Self {
        Self {
            status: GateStatus::Warn,
            overall_score,
            decision,
        }
    }

    pub fn fail(overall_score: f64, decision: GateDecision) -> Self {
        Self {
            status: GateStatus::Fail,
            overall_score,
            decision,
        }
    }
}

/// External pass/warn/fail evaluation of a phase's aggregated output.
#[async_trait]
pub trait QualityGate: Send + Sync {
    async fn evaluate(&self, output: &PhaseOutput) -> Result<GateResult>;
}
