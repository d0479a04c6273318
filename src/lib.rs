//! Phasegate - gated multi-agent phase execution
//!
//! Agents run a budgeted plan/reason/analyze loop that consults tools only when
//! the expected value of information justifies the cost. A coordinator fans
//! agents out in bounded batches, a quality gate decides whether the phase is
//! good enough, and a saga compensator rolls back side effects of phases that
//! cannot be salvaged.

pub mod agent;
pub mod analyzer;
pub mod catalog;
pub mod coordinator;
pub mod domain;
pub mod error;
pub mod events;
pub mod id;
pub mod llm;
pub mod saga;
pub mod storage;
pub mod verifier;

pub use error::{PhasegateError, Result};
