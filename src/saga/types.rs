//! Saga, steps, and step results.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::action::SagaAction;
use crate::id::{generate_saga_id, now_ms};
use crate::storage::HasId;

/// Default per-step timeout.
pub const DEFAULT_STEP_TIMEOUT: Duration = Duration::from_secs(300);

/// `PENDING -> RUNNING -> COMPLETED`, or
/// `RUNNING -> COMPENSATING -> {COMPENSATED | COMPENSATION_FAILED}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SagaStatus {
    Pending,
    Running,
    Completed,
    Compensating,
    Compensated,
    /// Needs an operator: a rollback action failed
    CompensationFailed,
}

impl SagaStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SagaStatus::Pending => "pending",
            SagaStatus::Running => "running",
            SagaStatus::Completed => "completed",
            SagaStatus::Compensating => "compensating",
            SagaStatus::Compensated => "compensated",
            SagaStatus::CompensationFailed => "compensation_failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SagaStatus::Completed | SagaStatus::Compensated | SagaStatus::CompensationFailed
        )
    }

    pub fn can_transition_to(&self, next: SagaStatus) -> bool {
        use SagaStatus::*;
        matches!(
            (self, next),
            (Pending, Running)
                | (Running, Completed)
                | (Running, Compensating)
                | (Compensating, Compensated)
                | (Compensating, CompensationFailed)
        )
    }
}

impl std::fmt::Display for SagaStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for SagaStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(SagaStatus::Pending),
            "running" => Ok(SagaStatus::Running),
            "completed" => Ok(SagaStatus::Completed),
            "compensating" => Ok(SagaStatus::Compensating),
            "compensated" => Ok(SagaStatus::Compensated),
            "compensation_failed" => Ok(SagaStatus::CompensationFailed),
            other => Err(format!("unknown saga status: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Success,
    Failed,
    Compensated,
    CompensationFailed,
}

impl StepStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StepStatus::Success => "success",
            StepStatus::Failed => "failed",
            StepStatus::Compensated => "compensated",
            StepStatus::CompensationFailed => "compensation_failed",
        }
    }
}

/// One recorded forward or compensation outcome. Appended, never edited.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepResult {
    pub step_id: String,
    pub status: StepStatus,
    /// Forward attempts made, or 1 for a compensation
    pub attempts: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub duration_ms: u64,
    pub recorded_at: u64,
}

/// A forward action paired with its compensation.
#[derive(Clone)]
pub struct SagaStep {
    pub id: String,
    pub name: String,
    pub action: Arc<dyn SagaAction>,
    pub compensation: Arc<dyn SagaAction>,
    pub timeout: Duration,
    /// Non-critical retryable steps get exactly one more forward attempt
    pub retryable: bool,
    /// Critical steps abort on first failure, never retried
    pub critical: bool,
}

impl SagaStep {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        action: Arc<dyn SagaAction>,
        compensation: Arc<dyn SagaAction>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            action,
            compensation,
            timeout: DEFAULT_STEP_TIMEOUT,
            retryable: true,
            critical: false,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn retryable(mut self, retryable: bool) -> Self {
        self.retryable = retryable;
        self
    }

    pub fn critical(mut self, critical: bool) -> Self {
        self.critical = critical;
        self
    }

    /// Forward attempts allowed before the failure is final.
    pub fn max_attempts(&self) -> u32 {
        if self.retryable && !self.critical { 2 } else { 1 }
    }
}

impl std::fmt::Debug for SagaStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SagaStep")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("timeout", &self.timeout)
            .field("retryable", &self.retryable)
            .field("critical", &self.critical)
            .finish_non_exhaustive()
    }
}

/// An ordered list of reversible steps and what happened to them.
#[derive(Debug, Clone)]
pub struct Saga {
    pub id: String,
    pub name: String,
    steps: Vec<SagaStep>,
    pub status: SagaStatus,
    pub step_results: Vec<StepResult>,
    pub error: Option<String>,
    pub created_at: u64,
    pub updated_at: u64,
}

impl Saga {
    pub fn new(name: impl Into<String>, steps: Vec<SagaStep>) -> Self {
        let now = now_ms();
        Self {
            id: generate_saga_id(),
            name: name.into(),
            steps,
            status: SagaStatus::Pending,
            step_results: Vec::new(),
            error: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Steps in execution order.
    pub fn steps(&self) -> &[SagaStep] {
        &self.steps
    }

    /// Results recorded for one step, in the order they happened.
    pub fn results_for(&self, step_id: &str) -> Vec<&StepResult> {
        self.step_results.iter().filter(|r| r.step_id == step_id).collect()
    }

    /// Step ids in the order their compensations ran.
    pub fn compensation_order(&self) -> Vec<&str> {
        self.step_results
            .iter()
            .filter(|r| matches!(r.status, StepStatus::Compensated | StepStatus::CompensationFailed))
            .map(|r| r.step_id.as_str())
            .collect()
    }

    /// Serializable snapshot.
    pub fn record(&self) -> SagaRecord {
        SagaRecord {
            id: self.id.clone(),
            name: self.name.clone(),
            status: self.status,
            step_ids: self.steps.iter().map(|s| s.id.clone()).collect(),
            step_results: self.step_results.clone(),
            error: self.error.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Persisted, inspectable view of a saga.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SagaRecord {
    pub id: String,
    pub name: String,
    pub status: SagaStatus,
    pub step_ids: Vec<String>,
    pub step_results: Vec<StepResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub created_at: u64,
    pub updated_at: u64,
}

impl HasId for SagaRecord {
    fn id(&self) -> &str {
        &self.id
    }
}
