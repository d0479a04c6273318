//! Gate-retry orchestration around the phase coordinator.
//!
//! A phase is executed, gated, and re-executed with accumulated hints until
//! the gate stops failing or retries run out. A phase that fails for good
//! hands its side-effect ledger to the saga compensator.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use log::{info, warn};
use serde::{Deserialize, Serialize};

use super::coordinator::PhaseCoordinator;
use super::gate::{GateDecision, GateResult, QualityGate};
use super::hints::hints_from_gate;
use crate::domain::{EventRecord, PhaseInput, PhaseOutput};
use crate::events::{EventSink, LogEventSink, emit};
use crate::saga::{CompensationPlanner, Saga, SagaCompensator, SideEffectLedger};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GateRetryConfig {
    /// Re-executions allowed after the first failed gate
    pub max_gate_retries: u32,
}

impl Default for GateRetryConfig {
    fn default() -> Self {
        Self { max_gate_retries: 2 }
    }
}

/// Final outcome of a gated phase.
#[derive(Debug)]
pub struct PhaseReport {
    pub output: PhaseOutput,
    /// Present when the phase failed and its side effects were compensated
    pub saga: Option<Saga>,
}

impl PhaseReport {
    pub fn success(&self) -> bool {
        self.output.success
    }
}

pub struct GatedPhaseRunner {
    coordinator: PhaseCoordinator,
    gate: Arc<dyn QualityGate>,
    planner: Arc<dyn CompensationPlanner>,
    compensator: SagaCompensator,
    events: Arc<dyn EventSink>,
    config: GateRetryConfig,
    retry_count: AtomicU32,
}

impl GatedPhaseRunner {
    pub fn new(
        coordinator: PhaseCoordinator,
        gate: Arc<dyn QualityGate>,
        planner: Arc<dyn CompensationPlanner>,
        config: GateRetryConfig,
    ) -> Self {
        Self {
            coordinator,
            gate,
            planner,
            compensator: SagaCompensator::new(),
            events: Arc::new(LogEventSink),
            config,
            retry_count: AtomicU32::new(0),
        }
    }

    pub fn with_compensator(mut self, compensator: SagaCompensator) -> Self {
        self.compensator = compensator;
        self
    }

    pub fn with_events(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = events;
        self
    }

    pub fn config(&self) -> &GateRetryConfig {
        &self.config
    }

    /// Gate retries used since the last completed phase. Only a passing (or
    /// warning) gate resets it, so an exhausted runner stays exhausted.
    pub fn retry_count(&self) -> u32 {
        self.retry_count.load(Ordering::SeqCst)
    }

    /// Execute the phase until the gate passes or warns, retrying failed gates
    /// with hints. Never returns an error: every failure ends in compensation
    /// and a failed report.
    pub async fn run(&self, input: &PhaseInput) -> PhaseReport {
        let phase = input.phase.clone();

        let mut hints = input.hints.clone().unwrap_or_default();
        let mut ledger = SideEffectLedger::new();
        let mut attempts = 0u32;
        let mut cost_usd = 0.0;
        let mut tokens_used = 0u64;
        let mut current = input.clone();

        loop {
            attempts += 1;
            tracing::debug!(phase = %phase, attempt = attempts, "Executing phase");

            let mut output = self.coordinator.execute(&current).await;
            ledger.extend(output.side_effects.iter().cloned());
            cost_usd += output.cost_usd;
            tokens_used += output.tokens_used;

            output.attempts = attempts;
            output.cost_usd = cost_usd;
            output.tokens_used = tokens_used;
            output.side_effects = ledger.effects().to_vec();

            if !output.success {
                // Not enough agents to gate; retrying with hints would not help
                return self.fail(output, &ledger).await;
            }

            let result = match self.gate.evaluate(&output).await {
                Ok(result) => result,
                Err(e) => {
                    warn!("Gate evaluation for phase {} errored, treating as fail: {}", phase, e);
                    GateResult::fail(0.0, GateDecision::default().with_reason(format!("gate error: {}", e)))
                }
            };

            tracing::debug!(
                phase = %phase,
                attempt = attempts,
                status = %result.status,
                score = result.overall_score,
                "Gate evaluated"
            );
            emit(
                self.events.as_ref(),
                EventRecord::gate_evaluated(&phase, result.status.as_str(), result.overall_score, attempts),
            );
            output.gate_score = Some(result.overall_score);

            if !result.status.is_blocking() {
                if !result.decision.reasons.is_empty() {
                    warn!("Gate warned on phase {}: {}", phase, result.decision.reasons.join("; "));
                }
                self.retry_count.store(0, Ordering::SeqCst);
                info!("Phase {} passed gate after {} attempt(s)", phase, attempts);
                emit(
                    self.events.as_ref(),
                    EventRecord::phase_completed(&phase, attempts, output.cost_usd),
                );
                return PhaseReport { output, saga: None };
            }

            let retries = self.retry_count();
            if retries >= self.config.max_gate_retries {
                output.success = false;
                output.error = Some(gate_failure_message(attempts, &result));
                return self.fail(output, &ledger).await;
            }

            let retry = retries + 1;
            self.retry_count.store(retry, Ordering::SeqCst);
            hints.merge(hints_from_gate(&result, retry));
            info!(
                "Phase {} failed gate (score {:.1}), retry {}/{}",
                phase, result.overall_score, retry, self.config.max_gate_retries
            );
            emit(
                self.events.as_ref(),
                EventRecord::gate_retry(&phase, retry, self.config.max_gate_retries),
            );
            current = input.with_hints(hints.clone());
        }
    }

    async fn fail(&self, output: PhaseOutput, ledger: &SideEffectLedger) -> PhaseReport {
        let reason = output.error.clone().unwrap_or_else(|| "phase failed".to_string());
        warn!("Phase {} failed: {}", output.phase, reason);
        emit(self.events.as_ref(), EventRecord::phase_failed(&output.phase, &reason));

        tracing::debug!(phase = %output.phase, effects = ledger.len(), "Handing ledger to compensator");
        let saga = self.planner.plan(&output.phase, ledger);
        let saga = self.compensator.rollback(saga, reason).await;

        PhaseReport {
            output,
            saga: Some(saga),
        }
    }
}

fn gate_failure_message(attempts: u32, result: &GateResult) -> String {
    let mut message = format!(
        "gate failed after {} attempt(s) with score {:.1}",
        attempts, result.overall_score
    );
    if !result.decision.reasons.is_empty() {
        message.push_str(": ");
        message.push_str(&result.decision.reasons.join("; "));
    }
    message
}
