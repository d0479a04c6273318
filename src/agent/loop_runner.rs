//! Agent execution loop.
//!
//! One loop per agent invocation: plan, reason, then iterate analyze, invoke,
//! verify, and integrate until the budget, the invocation cap, or a low
//! value-of-information verdict stops it. Artifacts are produced exactly once
//! from whatever result is current at that point.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use super::checkpoint::{CheckpointStore, CheckpointThrottle};
use super::integration::{DefaultIntegration, IntegrationStrategy};
use super::invoker::{ToolInvoker, ToolRequest};
use super::state::LoopState;
use super::strategy::AgentStrategy;
use crate::analyzer::ToolAnalyzer;
use crate::coordinator::PhaseAgent;
use crate::domain::{AgentOutput, Budget, EventRecord, LoopExit, PhaseInput, ReasoningResult};
use crate::events::{EventSink, LogEventSink, emit};
use crate::id::checkpoint_token;
use crate::verifier::OutputVerifier;

/// Configuration for an agent loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentLoopConfig {
    pub max_cost_usd: f64,
    pub max_tokens: u64,
    /// Cap on tool invocations, failed ones included
    pub max_tool_invocations: u32,
    /// Nominal cost of one analyzer decision, charged on every call
    pub analyze_cost_usd: f64,
    /// Nominal cost of one verification, charged on every call
    pub verify_cost_usd: f64,
    pub confidence_increment: f64,
    pub checkpoint_cooldown_secs: u64,
}

impl Default for AgentLoopConfig {
    fn default() -> Self {
        Self {
            max_cost_usd: 1.0,
            max_tokens: 100_000,
            max_tool_invocations: 5,
            analyze_cost_usd: 0.01,
            verify_cost_usd: 0.01,
            confidence_increment: 0.1,
            checkpoint_cooldown_secs: 120,
        }
    }
}

/// Mutable bookkeeping for one run.
struct LoopRun {
    agent_id: String,
    state: LoopState,
    budget: Budget,
    iterations: u32,
    integrations: u32,
    tools_invoked: Vec<String>,
    started: Instant,
}

impl LoopRun {
    fn new(agent_id: &str, config: &AgentLoopConfig) -> Self {
        Self {
            agent_id: agent_id.to_string(),
            state: LoopState::Plan,
            budget: Budget::new(config.max_cost_usd, config.max_tokens),
            iterations: 0,
            integrations: 0,
            tools_invoked: Vec::new(),
            started: Instant::now(),
        }
    }

    fn enter(&mut self, next: LoopState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "invalid loop transition {} -> {}",
            self.state,
            next
        );
        debug!("Agent {}: {} -> {}", self.agent_id, self.state, next);
        self.state = next;
    }

    fn duration_ms(&self) -> u64 {
        self.started.elapsed().as_millis() as u64
    }
}

/// Runs one agent strategy through the analyze/invoke/verify/integrate cycle.
pub struct AgentLoop {
    strategy: Arc<dyn AgentStrategy>,
    analyzer: Arc<dyn ToolAnalyzer>,
    invoker: Arc<dyn ToolInvoker>,
    verifier: Arc<dyn OutputVerifier>,
    integration: Arc<dyn IntegrationStrategy>,
    checkpoints: Option<Arc<dyn CheckpointStore>>,
    throttle: Mutex<CheckpointThrottle>,
    events: Arc<dyn EventSink>,
    config: AgentLoopConfig,
}

impl AgentLoop {
    pub fn new(
        strategy: Arc<dyn AgentStrategy>,
        analyzer: Arc<dyn ToolAnalyzer>,
        invoker: Arc<dyn ToolInvoker>,
        verifier: Arc<dyn OutputVerifier>,
        config: AgentLoopConfig,
    ) -> Self {
        Self {
            strategy,
            analyzer,
            invoker,
            verifier,
            integration: Arc::new(DefaultIntegration::new(config.confidence_increment)),
            checkpoints: None,
            throttle: Mutex::new(CheckpointThrottle::new(Duration::from_secs(config.checkpoint_cooldown_secs))),
            events: Arc::new(LogEventSink),
            config,
        }
    }

    pub fn with_integration(mut self, integration: Arc<dyn IntegrationStrategy>) -> Self {
        self.integration = integration;
        self
    }

    pub fn with_checkpoints(mut self, store: Arc<dyn CheckpointStore>) -> Self {
        self.checkpoints = Some(store);
        self
    }

    pub fn with_events(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = events;
        self
    }

    pub fn config(&self) -> &AgentLoopConfig {
        &self.config
    }

    /// Execute the loop. Never returns an error: failures are reported in the output.
    pub async fn run(&self, input: &PhaseInput) -> AgentOutput {
        let mut run = LoopRun::new(self.strategy.id(), &self.config);
        emit(self.events.as_ref(), EventRecord::agent_started(&run.agent_id, &input.phase));

        // PLAN
        let plan = match self.strategy.plan(input).await {
            Ok(plan) => plan,
            Err(e) => return self.fail(run, format!("plan failed: {}", e)),
        };
        debug!("Agent {} planned: {}", run.agent_id, plan.actions().join(" -> "));

        // REASON
        run.enter(LoopState::Reason);
        let mut current = match self.strategy.reason(input, &plan).await {
            Ok(result) => result,
            Err(e) => return self.fail(run, format!("reason failed: {}", e)),
        };
        run.budget.charge(current.cost_usd, current.tokens_used);
        self.checkpoint(input, &run, &current).await;

        let exit = loop {
            if run.budget.is_exhausted() {
                break LoopExit::BudgetExhausted;
            }
            if run.iterations >= self.config.max_tool_invocations {
                break LoopExit::IterationLimit;
            }

            // ANALYZE
            run.enter(LoopState::Analyze);
            let decision = self.analyzer.analyze(&plan, &current, &run.budget).await;
            run.budget.charge_cost(self.config.analyze_cost_usd);
            let decision = match decision {
                Ok(decision) => decision,
                Err(e) => return self.fail(run, format!("analyze failed: {}", e)),
            };

            let voi = decision.voi_score.unwrap_or(0.0);
            let tool_id = match decision.tool_id {
                Some(id) if decision.use_tool && voi >= self.analyzer.voi_threshold() => id,
                _ => {
                    debug!("Agent {} stops: {}", run.agent_id, decision.reasoning);
                    break LoopExit::LowValue;
                }
            };

            // INVOKE
            run.enter(LoopState::Invoke);
            run.iterations += 1;
            run.tools_invoked.push(tool_id.clone());
            let request = ToolRequest {
                capability_id: tool_id.clone(),
                input: decision.input,
                budget: run.budget.clone(),
            };
            let result = match self.invoker.invoke(request).await {
                Ok(result) => result,
                Err(e) => {
                    warn!("Agent {}: tool {} failed: {}", run.agent_id, tool_id, e);
                    emit(
                        self.events.as_ref(),
                        EventRecord::tool_invoked(&run.agent_id, &tool_id, false, 0.0),
                    );
                    continue;
                }
            };
            run.budget.charge(result.cost_usd, result.tokens_used);
            emit(
                self.events.as_ref(),
                EventRecord::tool_invoked(&run.agent_id, &tool_id, result.success, result.cost_usd),
            );
            if !result.success {
                warn!(
                    "Agent {}: tool {} reported failure: {}",
                    run.agent_id,
                    tool_id,
                    result.error.as_deref().unwrap_or("unknown error")
                );
                continue;
            }

            // VERIFY
            run.enter(LoopState::Verify);
            let verification = self.verifier.compare(&current.content, &result.content()).await;
            run.budget.charge_cost(self.config.verify_cost_usd);

            match verification {
                Ok(v) if v.improved => {
                    run.enter(LoopState::Integrate);
                    current = self.integration.integrate(&current, &result, &v);
                    run.integrations += 1;
                    emit(
                        self.events.as_ref(),
                        EventRecord::improvement_integrated(&run.agent_id, &tool_id, v.delta),
                    );
                    self.checkpoint(input, &run, &current).await;
                }
                Ok(v) => {
                    run.enter(LoopState::Discard);
                    debug!("Agent {}: discarding {} output: {}", run.agent_id, tool_id, v.reasoning);
                }
                Err(e) => {
                    run.enter(LoopState::Discard);
                    warn!("Agent {}: verification failed, discarding {} output: {}", run.agent_id, tool_id, e);
                }
            }
        };

        // ARTIFACTS
        run.enter(LoopState::Artifacts);
        let artifacts = match self.strategy.generate_artifacts(input, &current).await {
            Ok(artifacts) => artifacts,
            Err(e) => return self.fail(run, format!("artifact generation failed: {}", e)),
        };
        let side_effects = self.strategy.side_effects(&artifacts);
        run.enter(LoopState::Done);

        info!(
            "Agent {} finished ({}): {} iterations, {} integrations, ${:.4}",
            run.agent_id, exit, run.iterations, run.integrations, run.budget.spent_cost_usd
        );
        emit(
            self.events.as_ref(),
            EventRecord::agent_completed(&run.agent_id, exit.as_str(), run.budget.spent_cost_usd, run.iterations),
        );

        AgentOutput {
            success: true,
            artifacts,
            cost_usd: run.budget.spent_cost_usd,
            tokens_used: run.budget.spent_tokens,
            duration_ms: run.duration_ms(),
            error: None,
            exit,
            iterations: run.iterations,
            integrations: run.integrations,
            side_effects,
            tools_invoked: run.tools_invoked,
            agent_id: run.agent_id,
        }
    }

    /// Terminal failure; spend so far is still reported.
    fn fail(&self, mut run: LoopRun, error: String) -> AgentOutput {
        run.enter(LoopState::Failed);
        warn!("Agent {} failed: {}", run.agent_id, error);
        emit(self.events.as_ref(), EventRecord::agent_failed(&run.agent_id, &error));

        AgentOutput {
            success: false,
            artifacts: Vec::new(),
            cost_usd: run.budget.spent_cost_usd,
            tokens_used: run.budget.spent_tokens,
            duration_ms: run.duration_ms(),
            error: Some(error),
            exit: LoopExit::Failed,
            iterations: run.iterations,
            integrations: run.integrations,
            side_effects: Vec::new(),
            tools_invoked: run.tools_invoked,
            agent_id: run.agent_id,
        }
    }

    /// Best-effort checkpoint, dropped inside the cooldown window.
    async fn checkpoint(&self, input: &PhaseInput, run: &LoopRun, current: &ReasoningResult) {
        let Some(store) = &self.checkpoints else {
            return;
        };

        let now = Instant::now();
        let allowed = match self.throttle.lock() {
            Ok(throttle) => throttle.should_write(now),
            Err(e) => {
                warn!("Checkpoint throttle poisoned: {}", e);
                false
            }
        };
        if !allowed {
            debug!("Agent {}: checkpoint inside cooldown, dropped", run.agent_id);
            return;
        }

        let token = checkpoint_token(&input.phase, &run.agent_id);
        let data = serde_json::json!({
            "phase": input.phase,
            "agentId": run.agent_id,
            "state": run.state,
            "iterations": run.iterations,
            "integrations": run.integrations,
            "budget": run.budget,
            "current": current,
        });

        match store.save(&token, &data).await {
            Ok(()) => {
                if let Ok(mut throttle) = self.throttle.lock() {
                    throttle.record_write(now);
                }
            }
            Err(e) => warn!("Agent {}: checkpoint {} failed: {}", run.agent_id, token, e),
        }
    }
}

#[async_trait]
impl PhaseAgent for AgentLoop {
    fn id(&self) -> &str {
        self.strategy.id()
    }

    async fn run(&self, input: &PhaseInput) -> AgentOutput {
        AgentLoop::run(self, input).await
    }
}
