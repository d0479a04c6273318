//! Domain types for Phasegate
//!
//! This module contains the value types shared by every component:
//! - Budget: cost and token ceilings for one agent invocation
//! - ExecutionPlan: the read-only step list an agent plans once
//! - ReasoningResult: an agent's current answer
//! - AgentOutput / PhaseOutput: results exchanged between agents, coordinator and callers
//! - SideEffect: reversible changes a phase applied
//! - EventRecord: audit events

pub mod budget;
pub mod effect;
pub mod event;
pub mod output;
pub mod phase;
pub mod plan;
pub mod reasoning;

pub use budget::Budget;
pub use effect::SideEffect;
pub use event::{EventRecord, event_types};
pub use output::{AgentOutput, Artifact, LoopExit};
pub use phase::{PhaseHints, PhaseInput, PhaseOutput};
pub use plan::{ExecutionPlan, PlanStep};
pub use reasoning::ReasoningResult;
