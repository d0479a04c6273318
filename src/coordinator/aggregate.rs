//! Fan-in aggregation of agent outputs.

use crate::domain::{AgentOutput, Artifact, PhaseOutput, SideEffect};

/// Combines the successful outputs of one fan-out into a phase output.
pub trait Aggregator: Send + Sync {
    fn aggregate(&self, phase: &str, outputs: &[AgentOutput]) -> PhaseOutput;
}

/// Sums spend and concatenates artifacts grouped by type.
///
/// Types appear in first-seen order; within a type, artifacts keep the order
/// of the outputs they came from.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConcatAggregator;

impl Aggregator for ConcatAggregator {
    fn aggregate(&self, phase: &str, outputs: &[AgentOutput]) -> PhaseOutput {
        let mut groups: Vec<(String, Vec<Artifact>)> = Vec::new();
        for artifact in outputs.iter().flat_map(|o| o.artifacts.iter()) {
            match groups.iter_mut().find(|(t, _)| *t == artifact.artifact_type) {
                Some((_, group)) => group.push(artifact.clone()),
                None => groups.push((artifact.artifact_type.clone(), vec![artifact.clone()])),
            }
        }

        PhaseOutput {
            phase: phase.to_string(),
            success: true,
            artifacts: groups.into_iter().flat_map(|(_, group)| group).collect(),
            cost_usd: outputs.iter().map(|o| o.cost_usd).sum(),
            tokens_used: outputs.iter().map(|o| o.tokens_used).sum(),
            succeeded_agents: outputs.iter().map(|o| o.agent_id.clone()).collect(),
            failed_agents: Vec::new(),
            side_effects: collect_side_effects(outputs),
            attempts: 1,
            gate_score: None,
            error: None,
        }
    }
}

/// Side effects of all outputs, deduplicated in first-seen order.
pub fn collect_side_effects(outputs: &[AgentOutput]) -> Vec<SideEffect> {
    let mut effects: Vec<SideEffect> = Vec::new();
    for effect in outputs.iter().flat_map(|o| o.side_effects.iter()) {
        if !effects.contains(effect) {
            effects.push(effect.clone());
        }
    }
    effects
}
