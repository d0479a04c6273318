//! Side-effect ledger and rollback planning.
//!
//! A phase that fails for good hands its ledger to a planner, which turns it
//! into a saga of already-applied steps whose compensations revert them.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::action::{SagaAction, noop};
use super::types::{DEFAULT_STEP_TIMEOUT, Saga, SagaStep};
use crate::domain::SideEffect;
use crate::error::Result;

/// Side effects in the order they were first seen, without duplicates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SideEffectLedger {
    effects: Vec<SideEffect>,
}

impl SideEffectLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false if the effect was already recorded.
    pub fn record(&mut self, effect: SideEffect) -> bool {
        if self.effects.contains(&effect) {
            return false;
        }
        self.effects.push(effect);
        true
    }

    pub fn extend(&mut self, effects: impl IntoIterator<Item = SideEffect>) {
        for effect in effects {
            self.record(effect);
        }
    }

    pub fn effects(&self) -> &[SideEffect] {
        &self.effects
    }

    pub fn len(&self) -> usize {
        self.effects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }
}

/// Builds the compensation saga for a failed phase.
pub trait CompensationPlanner: Send + Sync {
    fn plan(&self, phase: &str, ledger: &SideEffectLedger) -> Saga;
}

/// Undoes individual side effects in external systems.
#[async_trait]
pub trait SideEffectReverter: Send + Sync {
    /// Remove the effect: delete the artifact, roll back the migration, disable the flag.
    async fn revert(&self, effect: &SideEffect) -> Result<()>;
}

struct RevertAction {
    reverter: Arc<dyn SideEffectReverter>,
    effect: SideEffect,
}

#[async_trait]
impl SagaAction for RevertAction {
    async fn execute(&self) -> Result<()> {
        self.reverter.revert(&self.effect).await
    }
}

/// One already-applied step per effect, in ledger order, compensated by a revert.
///
/// Run the plan with [`SagaCompensator::rollback`](super::SagaCompensator::rollback)
/// so reverts happen newest first.
pub struct LedgerRollbackPlanner {
    reverter: Arc<dyn SideEffectReverter>,
    step_timeout: Duration,
}

impl LedgerRollbackPlanner {
    pub fn new(reverter: Arc<dyn SideEffectReverter>) -> Self {
        Self {
            reverter,
            step_timeout: DEFAULT_STEP_TIMEOUT,
        }
    }

    pub fn with_step_timeout(mut self, timeout: Duration) -> Self {
        self.step_timeout = timeout;
        self
    }
}

impl CompensationPlanner for LedgerRollbackPlanner {
    fn plan(&self, phase: &str, ledger: &SideEffectLedger) -> Saga {
        let steps = ledger
            .effects()
            .iter()
            .enumerate()
            .map(|(i, effect)| {
                let revert: Arc<dyn SagaAction> = Arc::new(RevertAction {
                    reverter: Arc::clone(&self.reverter),
                    effect: effect.clone(),
                });
                // Applied by the agent before the saga existed
                SagaStep::new(format!("effect-{}", i + 1), effect.to_string(), noop(), revert)
                    .with_timeout(self.step_timeout)
                    .retryable(false)
            })
            .collect();

        Saga::new(format!("rollback {}", phase), steps)
    }
}
