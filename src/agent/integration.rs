//! Folding verified tool output into the current result.

use crate::domain::ReasoningResult;
use crate::verifier::VerifierResult;

use super::invoker::ToolInvocationResult;

/// Builds the replacement result after a verified improvement.
pub trait IntegrationStrategy: Send + Sync {
    fn integrate(
        &self,
        current: &ReasoningResult,
        tool: &ToolInvocationResult,
        verification: &VerifierResult,
    ) -> ReasoningResult;
}

/// Adopt the candidate content and raise confidence by a fixed step, capped at 1.0.
#[derive(Debug, Clone, Copy)]
pub struct DefaultIntegration {
    pub confidence_increment: f64,
}

impl Default for DefaultIntegration {
    fn default() -> Self {
        Self {
            confidence_increment: 0.1,
        }
    }
}

impl DefaultIntegration {
    pub fn new(confidence_increment: f64) -> Self {
        Self {
            confidence_increment: confidence_increment.max(0.0),
        }
    }
}

impl IntegrationStrategy for DefaultIntegration {
    fn integrate(
        &self,
        current: &ReasoningResult,
        tool: &ToolInvocationResult,
        verification: &VerifierResult,
    ) -> ReasoningResult {
        let confidence = (current.confidence + self.confidence_increment).min(1.0);
        ReasoningResult::new(tool.content(), confidence)
            .with_needs_improvement(current.needs_improvement)
            .with_reasoning(format!(
                "{} | integrated tool output (delta {:+.2})",
                current.reasoning, verification.delta
            ))
            .with_usage(current.cost_usd + tool.cost_usd, current.tokens_used + tool.tokens_used)
    }
}
