//! Phase coordination: batched fan-out/fan-in, quality gate, and gate retries

mod agent;
mod aggregate;
#[allow(clippy::module_inception)]
mod coordinator;
mod gate;
mod hints;
mod runner;

pub use agent::PhaseAgent;
pub use aggregate::{Aggregator, ConcatAggregator, collect_side_effects};
pub use coordinator::{CoordinatorConfig, PhaseCoordinator, batch_sizes};
pub use gate::{GateDecision, GateResult, GateStatus, QualityGate};
pub use hints::{HintFormatter, hints_from_gate};
pub use runner::{GateRetryConfig, GatedPhaseRunner, PhaseReport};
