//! Saga execution with reverse-order compensation.
//!
//! Forward steps run strictly in order, each under its own timeout. The first
//! unrecoverable failure stops the forward pass and compensates every step
//! that succeeded, newest first. A failing compensation aborts the sweep and
//! leaves the saga in `CompensationFailed` for an operator to resolve.
//!
//! `rollback` skips the forward pass for steps that were applied before the
//! saga existed and goes straight to compensation.

use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{error, info, warn};
use serde::{Deserialize, Serialize};

use super::action::SagaAction;
use super::store::SagaStore;
use super::types::{Saga, SagaStatus, StepResult, StepStatus};
use crate::domain::EventRecord;
use crate::error::{PhasegateError, Result};
use crate::events::{EventSink, LogEventSink, emit};
use crate::id::now_ms;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SagaConfig {
    /// Timeout for steps built from configuration, e.g. rollback plans
    pub default_step_timeout_secs: u64,
}

impl Default for SagaConfig {
    fn default() -> Self {
        Self {
            default_step_timeout_secs: 300,
        }
    }
}

impl SagaConfig {
    pub fn default_step_timeout(&self) -> Duration {
        Duration::from_secs(self.default_step_timeout_secs)
    }
}

/// Runs sagas and records every transition.
pub struct SagaCompensator {
    store: Option<Arc<dyn SagaStore>>,
    events: Arc<dyn EventSink>,
}

impl Default for SagaCompensator {
    fn default() -> Self {
        Self::new()
    }
}

impl SagaCompensator {
    pub fn new() -> Self {
        Self {
            store: None,
            events: Arc::new(LogEventSink),
        }
    }

    pub fn with_store(mut self, store: Arc<dyn SagaStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_events(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = events;
        self
    }

    /// Run the saga to completion or through compensation. Never returns an error.
    pub async fn execute(&self, mut saga: Saga) -> Saga {
        if saga.status != SagaStatus::Pending {
            warn!("Saga {} already {}, not executing again", saga.id, saga.status);
            return saga;
        }
        info!("Saga {} ({}) starting with {} steps", saga.id, saga.name, saga.steps().len());
        self.transition(&mut saga, SagaStatus::Running);

        let mut completed: Vec<usize> = Vec::new();
        let mut failure: Option<String> = None;

        for index in 0..saga.steps().len() {
            let step = saga.steps()[index].clone();
            let started = Instant::now();
            let mut attempts = 1;
            let mut outcome = run_with_timeout(step.action.as_ref(), step.timeout).await;
            while attempts < step.max_attempts() {
                let Err(e) = &outcome else { break };
                warn!("Saga {}: step {} failed, retrying once: {}", saga.id, step.id, e);
                attempts += 1;
                outcome = run_with_timeout(step.action.as_ref(), step.timeout).await;
            }

            match outcome {
                Ok(()) => {
                    self.append(&mut saga, &step.id, StepStatus::Success, attempts, None, started);
                    completed.push(index);
                }
                Err(e) => {
                    let message = format!("step {} failed: {}", step.id, e);
                    warn!("Saga {}: {} (critical: {})", saga.id, message, step.critical);
                    self.append(&mut saga, &step.id, StepStatus::Failed, attempts, Some(e.to_string()), started);
                    failure = Some(message);
                    break;
                }
            }
        }

        let Some(failure) = failure else {
            self.transition(&mut saga, SagaStatus::Completed);
            info!("Saga {} completed", saga.id);
            return saga;
        };

        saga.error = Some(failure);
        self.compensate(saga, completed).await
    }

    /// Compensate a saga whose steps were already applied outside it, e.g. the
    /// side effects of a failed phase. No forward action runs: every step is
    /// recorded as succeeded and then compensated newest first.
    pub async fn rollback(&self, mut saga: Saga, reason: impl Into<String>) -> Saga {
        if saga.status != SagaStatus::Pending {
            warn!("Saga {} already {}, not rolling back again", saga.id, saga.status);
            return saga;
        }
        info!("Saga {} ({}) rolling back {} applied steps", saga.id, saga.name, saga.steps().len());
        self.transition(&mut saga, SagaStatus::Running);

        let applied: Vec<String> = saga.steps().iter().map(|s| s.id.clone()).collect();
        for step_id in &applied {
            self.append(&mut saga, step_id, StepStatus::Success, 0, None, Instant::now());
        }

        saga.error = Some(reason.into());
        let completed = (0..applied.len()).collect();
        self.compensate(saga, completed).await
    }

    async fn compensate(&self, mut saga: Saga, completed: Vec<usize>) -> Saga {
        self.transition(&mut saga, SagaStatus::Compensating);

        for index in completed.into_iter().rev() {
            let step = saga.steps()[index].clone();
            let started = Instant::now();

            match run_with_timeout(step.compensation.as_ref(), step.timeout).await {
                Ok(()) => {
                    self.append(&mut saga, &step.id, StepStatus::Compensated, 1, None, started);
                }
                Err(e) => {
                    error!(
                        "Saga {}: compensation of step {} failed, manual intervention required: {}",
                        saga.id, step.id, e
                    );
                    self.append(
                        &mut saga,
                        &step.id,
                        StepStatus::CompensationFailed,
                        1,
                        Some(e.to_string()),
                        started,
                    );
                    saga.error = Some(format!(
                        "{}; compensation of {} failed: {}",
                        saga.error.as_deref().unwrap_or("forward step failed"),
                        step.id,
                        e
                    ));
                    self.transition(&mut saga, SagaStatus::CompensationFailed);
                    return saga;
                }
            }
        }

        self.transition(&mut saga, SagaStatus::Compensated);
        info!("Saga {} compensated", saga.id);
        saga
    }

    fn append(
        &self,
        saga: &mut Saga,
        step_id: &str,
        status: StepStatus,
        attempts: u32,
        error: Option<String>,
        started: Instant,
    ) {
        saga.step_results.push(StepResult {
            step_id: step_id.to_string(),
            status,
            attempts,
            error,
            duration_ms: started.elapsed().as_millis() as u64,
            recorded_at: now_ms(),
        });
        saga.updated_at = now_ms();
        self.persist(saga);
        emit(
            self.events.as_ref(),
            EventRecord::saga_step_recorded(&saga.id, step_id, status.as_str()),
        );
    }

    fn transition(&self, saga: &mut Saga, next: SagaStatus) {
        let old = saga.status;
        debug_assert!(old.can_transition_to(next), "invalid saga transition {} -> {}", old, next);
        saga.status = next;
        saga.updated_at = now_ms();
        tracing::debug!(saga = %saga.id, from = %old, to = %next, "Saga status change");
        self.persist(saga);
        emit(
            self.events.as_ref(),
            EventRecord::saga_status_change(&saga.id, old.as_str(), next.as_str()),
        );
    }

    /// Store failures are logged; they never change the saga outcome.
    fn persist(&self, saga: &Saga) {
        if let Some(store) = &self.store {
            if let Err(e) = store.save(&saga.record()) {
                error!("Saga {}: failed to persist state {}: {}", saga.id, saga.status, e);
            }
        }
    }
}

/// Race an action against its timeout; a timeout is an ordinary failure.
async fn run_with_timeout(action: &dyn SagaAction, timeout: Duration) -> Result<()> {
    match tokio::time::timeout(timeout, action.execute()).await {
        Ok(result) => result,
        Err(_) => Err(PhasegateError::Timeout(timeout)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::saga::action::{action_fn, noop};
    use crate::saga::store::MemorySagaStore;
    use crate::saga::types::SagaStep;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};

    type Log = Arc<Mutex<Vec<String>>>;

    fn logging(log: &Log, entry: &str) -> Arc<dyn SagaAction> {
        let log = Arc::clone(log);
        let entry = entry.to_string();
        action_fn(move || {
            let log = Arc::clone(&log);
            let entry = entry.clone();
            async move {
                log.lock().unwrap().push(entry);
                Ok(())
            }
        })
    }

    fn failing(log: &Log, entry: &str) -> Arc<dyn SagaAction> {
        let log = Arc::clone(log);
        let entry = entry.to_string();
        action_fn(move || {
            let log = Arc::clone(&log);
            let entry = entry.clone();
            async move {
                log.lock().unwrap().push(entry.clone());
                Err(PhasegateError::SagaStep(format!("{} refused", entry)))
            }
        })
    }

    fn step(log: &Log, id: &str) -> SagaStep {
        SagaStep::new(
            id,
            format!("step {}", id),
            logging(log, &format!("do {}", id)),
            logging(log, &format!("undo {}", id)),
        )
    }

    fn entries(log: &Log) -> Vec<String> {
        log.lock().unwrap().clone()
    }

    #[tokio::test]
    async fn test_happy_path_completes() {
        let log: Log = Arc::default();
        let saga = Saga::new("deploy", vec![step(&log, "a"), step(&log, "b")]);
        let saga = SagaCompensator::new().execute(saga).await;

        assert_eq!(saga.status, SagaStatus::Completed);
        assert_eq!(entries(&log), vec!["do a", "do b"]);
        assert_eq!(saga.step_results.len(), 2);
        assert!(saga.error.is_none());
    }

    #[tokio::test]
    async fn test_failure_compensates_in_reverse() {
        let log: Log = Arc::default();
        let c = SagaStep::new("c", "step c", failing(&log, "do c"), logging(&log, "undo c")).retryable(false);
        let saga = Saga::new("deploy", vec![step(&log, "a"), step(&log, "b"), c]);
        let saga = SagaCompensator::new().execute(saga).await;

        assert_eq!(saga.status, SagaStatus::Compensated);
        assert_eq!(entries(&log), vec!["do a", "do b", "do c", "undo b", "undo a"]);
        assert_eq!(saga.compensation_order(), vec!["b", "a"]);
        assert!(saga.error.unwrap().contains("step c failed"));
    }

    #[tokio::test]
    async fn test_retryable_step_gets_one_retry() {
        let log: Log = Arc::default();
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);
        let flaky = action_fn(move || {
            let counter = Arc::clone(&counter);
            async move {
                if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err(PhasegateError::SagaStep("transient".into()))
                } else {
                    Ok(())
                }
            }
        });
        let saga = Saga::new(
            "deploy",
            vec![SagaStep::new("flaky", "flaky", flaky, noop()), step(&log, "b")],
        );
        let saga = SagaCompensator::new().execute(saga).await;

        assert_eq!(saga.status, SagaStatus::Completed);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(saga.results_for("flaky")[0].attempts, 2);
    }

    #[tokio::test]
    async fn test_retryable_step_failing_twice_compensates() {
        let log: Log = Arc::default();
        let b = SagaStep::new("b", "step b", failing(&log, "do b"), logging(&log, "undo b"));
        let saga = Saga::new("deploy", vec![step(&log, "a"), b]);
        let saga = SagaCompensator::new().execute(saga).await;

        assert_eq!(saga.status, SagaStatus::Compensated);
        assert_eq!(entries(&log), vec!["do a", "do b", "do b", "undo a"]);
    }

    #[tokio::test]
    async fn test_critical_step_not_retried() {
        let log: Log = Arc::default();
        let b = SagaStep::new("b", "migrate", failing(&log, "do b"), logging(&log, "undo b")).critical(true);
        let saga = Saga::new("deploy", vec![step(&log, "a"), b, step(&log, "c")]);
        let saga = SagaCompensator::new().execute(saga).await;

        assert_eq!(saga.status, SagaStatus::Compensated);
        assert_eq!(entries(&log), vec!["do a", "do b", "undo a"]);
        assert_eq!(saga.results_for("b")[0].attempts, 1);
        assert!(saga.results_for("c").is_empty());
    }

    #[tokio::test]
    async fn test_compensation_failure_aborts_sweep() {
        let log: Log = Arc::default();
        let b = SagaStep::new("b", "step b", logging(&log, "do b"), failing(&log, "undo b"));
        let c = SagaStep::new("c", "step c", failing(&log, "do c"), noop()).retryable(false);
        let saga = Saga::new("deploy", vec![step(&log, "a"), b, c]);
        let saga = SagaCompensator::new().execute(saga).await;

        assert_eq!(saga.status, SagaStatus::CompensationFailed);
        // a is never compensated
        assert_eq!(entries(&log), vec!["do a", "do b", "do c", "undo b"]);
        assert_eq!(saga.compensation_order(), vec!["b"]);
        assert!(saga.error.unwrap().contains("compensation of b failed"));
    }

    #[tokio::test]
    async fn test_timeout_is_step_failure() {
        let log: Log = Arc::default();
        let slow = action_fn(|| async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        });
        let stuck = SagaStep::new("stuck", "stuck", slow, noop())
            .with_timeout(Duration::from_millis(20))
            .retryable(false);
        let saga = Saga::new("deploy", vec![step(&log, "a"), stuck]);
        let saga = SagaCompensator::new().execute(saga).await;

        assert_eq!(saga.status, SagaStatus::Compensated);
        assert!(saga.results_for("stuck")[0].error.as_ref().unwrap().contains("Timed out"));
        assert_eq!(entries(&log), vec!["do a", "undo a"]);
    }

    #[tokio::test]
    async fn test_every_transition_persisted() {
        let log: Log = Arc::default();
        let store = Arc::new(MemorySagaStore::new());
        let b = SagaStep::new("b", "step b", failing(&log, "do b"), noop()).retryable(false);
        let saga = Saga::new("deploy", vec![step(&log, "a"), b]);
        let saga = SagaCompensator::new().with_store(store.clone()).execute(saga).await;

        let statuses: Vec<SagaStatus> = store.history().iter().map(|r| r.status).collect();
        // running, a success, b failed, compensating, a compensated, compensated
        assert_eq!(
            statuses,
            vec![
                SagaStatus::Running,
                SagaStatus::Running,
                SagaStatus::Running,
                SagaStatus::Compensating,
                SagaStatus::Compensating,
                SagaStatus::Compensated,
            ]
        );
        let stored = store.get(&saga.id).unwrap().unwrap();
        assert_eq!(stored.step_results.len(), 3);
        assert_eq!(stored.status, SagaStatus::Compensated);
    }

    #[tokio::test]
    async fn test_executed_saga_is_not_rerun() {
        let log: Log = Arc::default();
        let compensator = SagaCompensator::new();
        let saga = compensator.execute(Saga::new("once", vec![step(&log, "a")])).await;
        let saga = compensator.execute(saga).await;

        assert_eq!(saga.status, SagaStatus::Completed);
        assert_eq!(entries(&log), vec!["do a"]);
    }

    #[tokio::test]
    async fn test_rollback_compensates_applied_steps_newest_first() {
        let log: Log = Arc::default();
        let store = Arc::new(MemorySagaStore::new());
        let saga = Saga::new("rollback design", vec![step(&log, "a"), step(&log, "b"), step(&log, "c")]);
        let saga = SagaCompensator::new()
            .with_store(store.clone())
            .rollback(saga, "gate failed")
            .await;

        assert_eq!(saga.status, SagaStatus::Compensated);
        assert_eq!(entries(&log), vec!["undo c", "undo b", "undo a"]);
        assert_eq!(saga.compensation_order(), vec!["c", "b", "a"]);
        assert_eq!(saga.results_for("a")[0].attempts, 0);
        assert_eq!(saga.error.as_deref(), Some("gate failed"));
        assert_eq!(store.get(&saga.id).unwrap().unwrap().status, SagaStatus::Compensated);
    }

    #[tokio::test]
    async fn test_rollback_failure_needs_operator() {
        let log: Log = Arc::default();
        let b = SagaStep::new("b", "step b", noop(), failing(&log, "undo b"));
        let saga = Saga::new("rollback design", vec![step(&log, "a"), b, step(&log, "c")]);
        let saga = SagaCompensator::new().rollback(saga, "gate failed").await;

        assert_eq!(saga.status, SagaStatus::CompensationFailed);
        // No forward action ran, and a is left for the operator
        assert_eq!(entries(&log), vec!["undo c", "undo b"]);
        assert!(saga.error.unwrap().contains("compensation of b failed"));
    }

    #[tokio::test]
    async fn test_empty_rollback_is_compensated() {
        let saga = SagaCompensator::new().rollback(Saga::new("nothing", Vec::new()), "phase failed").await;
        assert_eq!(saga.status, SagaStatus::Compensated);
    }

    #[tokio::test]
    async fn test_empty_saga_completes() {
        let saga = SagaCompensator::new().execute(Saga::new("nothing", Vec::new())).await;
        assert_eq!(saga.status, SagaStatus::Completed);
    }
}
