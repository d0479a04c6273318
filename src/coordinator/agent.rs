//! What the coordinator fans out to.

use async_trait::async_trait;

use crate::domain::{AgentOutput, PhaseInput};

/// One agent of a phase. Runs to completion and always reports an output.
#[async_trait]
pub trait PhaseAgent: Send + Sync {
    fn id(&self) -> &str;

    async fn run(&self, input: &PhaseInput) -> AgentOutput;
}
