//! Agent execution loop and the seams it drives
//!
//! - `AgentStrategy`: per-phase plan/reason/artifact behavior
//! - `ToolInvoker`: runs the capability the analyzer picked
//! - `IntegrationStrategy`: folds a verified improvement into the result
//! - `CheckpointStore`: throttled best-effort snapshots

mod checkpoint;
mod integration;
mod invoker;
mod loop_runner;
mod state;
mod strategy;

pub use checkpoint::{Checkpoint, CheckpointStore, CheckpointThrottle, JsonlCheckpointStore};
pub use integration::{DefaultIntegration, IntegrationStrategy};
pub use invoker::{ToolInvocationResult, ToolInvoker, ToolRequest};
pub use loop_runner::{AgentLoop, AgentLoopConfig};
pub use state::LoopState;
pub use strategy::AgentStrategy;
