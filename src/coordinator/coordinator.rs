//! Batched fan-out/fan-in over the agents of one phase.

use std::sync::Arc;

use futures::future::join_all;
use log::{info, warn};
use serde::{Deserialize, Serialize};

use super::agent::PhaseAgent;
use super::aggregate::{Aggregator, ConcatAggregator, collect_side_effects};
use crate::domain::{AgentOutput, EventRecord, PhaseInput, PhaseOutput};
use crate::events::{EventSink, LogEventSink, emit};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CoordinatorConfig {
    /// Agents running at once. 0 is treated as 1.
    pub max_concurrency: usize,
    /// Successful agents needed for the phase to aggregate
    pub min_required_agents: usize,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            max_concurrency: 4,
            min_required_agents: 1,
        }
    }
}

/// Batch sizes used to dispatch `agent_count` agents.
///
/// A single batch when the limit covers every agent, otherwise sequential
/// batches of `max_concurrency` with the remainder last.
pub fn batch_sizes(agent_count: usize, max_concurrency: usize) -> Vec<usize> {
    let limit = max_concurrency.max(1);
    (0..agent_count)
        .step_by(limit)
        .map(|start| limit.min(agent_count - start))
        .collect()
}

/// Runs every agent of a phase with bounded parallelism and partial-failure tolerance.
pub struct PhaseCoordinator {
    agents: Vec<Arc<dyn PhaseAgent>>,
    aggregator: Arc<dyn Aggregator>,
    events: Arc<dyn EventSink>,
    config: CoordinatorConfig,
}

impl PhaseCoordinator {
    pub fn new(agents: Vec<Arc<dyn PhaseAgent>>, config: CoordinatorConfig) -> Self {
        Self {
            agents,
            aggregator: Arc::new(ConcatAggregator),
            events: Arc::new(LogEventSink),
            config,
        }
    }

    pub fn with_aggregator(mut self, aggregator: Arc<dyn Aggregator>) -> Self {
        self.aggregator = aggregator;
        self
    }

    pub fn with_events(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = events;
        self
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    pub fn agent_count(&self) -> usize {
        self.agents.len()
    }

    /// Run all agents and collect one output per agent, in agent order.
    ///
    /// Each batch settles completely, failures included, before the next starts.
    /// A panicking agent task becomes a failed output; siblings are unaffected.
    pub async fn fan_out(&self, input: &PhaseInput) -> Vec<AgentOutput> {
        let input = Arc::new(input.clone());
        let mut outputs = Vec::with_capacity(self.agents.len());
        let plan = batch_sizes(self.agents.len(), self.config.max_concurrency);
        let mut start = 0;

        for (index, size) in plan.into_iter().enumerate() {
            let batch = &self.agents[start..start + size];
            start += size;
            tracing::debug!(phase = %input.phase, batch = index + 1, size = batch.len(), "Dispatching batch");
            emit(
                self.events.as_ref(),
                EventRecord::batch_dispatched(&input.phase, index + 1, batch.len()),
            );

            let handles: Vec<_> = batch
                .iter()
                .map(|agent| {
                    let agent = Arc::clone(agent);
                    let input = Arc::clone(&input);
                    tokio::spawn(async move { agent.run(&input).await })
                })
                .collect();

            for (agent, joined) in batch.iter().zip(join_all(handles).await) {
                match joined {
                    Ok(output) => outputs.push(output),
                    Err(e) => {
                        tracing::error!(agent = %agent.id(), error = ?e, "Agent task panicked");
                        outputs.push(AgentOutput::failure(agent.id(), format!("agent task aborted: {}", e)));
                    }
                }
            }
        }

        outputs
    }

    /// Fan out, then fan in. Never returns an error.
    ///
    /// With fewer than `min_required_agents` successes the phase fails without
    /// aggregation; the successful agents' side effects are still reported so
    /// they can be compensated.
    pub async fn execute(&self, input: &PhaseInput) -> PhaseOutput {
        let outputs = self.fan_out(input).await;
        self.settle(&input.phase, outputs)
    }

    fn settle(&self, phase: &str, outputs: Vec<AgentOutput>) -> PhaseOutput {
        let (succeeded, failed): (Vec<AgentOutput>, Vec<AgentOutput>) = outputs.into_iter().partition(|o| o.success);

        for output in &failed {
            warn!(
                "Agent {} failed in phase {}: {}",
                output.agent_id,
                phase,
                output.error.as_deref().unwrap_or("unknown error")
            );
        }

        let failed_ids: Vec<String> = failed.iter().map(|o| o.agent_id.clone()).collect();
        let failed_cost: f64 = failed.iter().map(|o| o.cost_usd).sum();
        let failed_tokens: u64 = failed.iter().map(|o| o.tokens_used).sum();

        if succeeded.len() < self.config.min_required_agents {
            let reason = format!(
                "only {} of {} agents succeeded, {} required",
                succeeded.len(),
                succeeded.len() + failed.len(),
                self.config.min_required_agents
            );
            warn!("Phase {} failed: {}", phase, reason);
            emit(self.events.as_ref(), EventRecord::phase_failed(phase, &reason));

            let mut output = PhaseOutput::failed(phase, reason);
            output.cost_usd = succeeded.iter().map(|o| o.cost_usd).sum::<f64>() + failed_cost;
            output.tokens_used = succeeded.iter().map(|o| o.tokens_used).sum::<u64>() + failed_tokens;
            output.succeeded_agents = succeeded.iter().map(|o| o.agent_id.clone()).collect();
            output.failed_agents = failed_ids;
            output.side_effects = collect_side_effects(&succeeded);
            return output;
        }

        let mut output = self.aggregator.aggregate(phase, &succeeded);
        output.cost_usd += failed_cost;
        output.tokens_used += failed_tokens;
        output.failed_agents = failed_ids;

        info!(
            "Phase {} fan-in: {} succeeded, {} failed, {} artifacts",
            phase,
            output.succeeded_agents.len(),
            output.failed_agents.len(),
            output.artifacts.len()
        );
        output
    }
}
