//! Per-phase agent behavior.

use async_trait::async_trait;

use crate::domain::{Artifact, ExecutionPlan, PhaseInput, ReasoningResult, SideEffect};
use crate::error::Result;

/// The domain-specific half of an agent: how it plans, reasons, and emits artifacts.
///
/// Each concrete phase agent is a value implementing this trait, built with its
/// own prompts and settings. The execution loop supplies everything else.
#[async_trait]
pub trait AgentStrategy: Send + Sync {
    /// Stable identifier, unique within a phase
    fn id(&self) -> &str;

    async fn plan(&self, input: &PhaseInput) -> Result<ExecutionPlan>;

    /// Produce the initial result. Its reported cost and tokens are charged immediately.
    async fn reason(&self, input: &PhaseInput, plan: &ExecutionPlan) -> Result<ReasoningResult>;

    async fn generate_artifacts(&self, input: &PhaseInput, result: &ReasoningResult) -> Result<Vec<Artifact>>;

    /// Side effects the emitted artifacts caused outside the pipeline.
    fn side_effects(&self, _artifacts: &[Artifact]) -> Vec<SideEffect> {
        Vec::new()
    }
}
