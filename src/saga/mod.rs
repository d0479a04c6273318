//! Saga compensator - ordered reversible steps with reverse-order rollback

mod action;
mod compensator;
mod ledger;
mod store;
mod types;

pub use action::{SagaAction, action_fn, noop};
pub use compensator::{SagaCompensator, SagaConfig};
pub use ledger::{CompensationPlanner, LedgerRollbackPlanner, SideEffectLedger, SideEffectReverter};
pub use store::{JsonlSagaStore, MemorySagaStore, SagaStore};
pub use types::{DEFAULT_STEP_TIMEOUT, Saga, SagaRecord, SagaStatus, SagaStep, StepResult, StepStatus};
