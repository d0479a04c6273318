//! Event record types for audit and observability.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::id::{generate_event_id, now_ms};

/// Event type constants
pub mod event_types {
    pub const AGENT_STARTED: &str = "agent.started";
    pub const AGENT_TOOL_INVOKED: &str = "agent.tool_invoked";
    pub const AGENT_IMPROVEMENT_INTEGRATED: &str = "agent.improvement_integrated";
    pub const AGENT_COMPLETED: &str = "agent.completed";
    pub const AGENT_FAILED: &str = "agent.failed";
    pub const PHASE_BATCH_DISPATCHED: &str = "phase.batch_dispatched";
    pub const PHASE_COMPLETED: &str = "phase.completed";
    pub const PHASE_FAILED: &str = "phase.failed";
    pub const GATE_EVALUATED: &str = "gate.evaluated";
    pub const GATE_RETRY: &str = "gate.retry";
    pub const SAGA_STATUS_CHANGE: &str = "saga.status_change";
    pub const SAGA_STEP_RECORDED: &str = "saga.step_recorded";
}

/// General-purpose event log entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EventRecord {
    /// Unique event identifier
    pub id: String,
    /// Event type (e.g., "agent.started", "gate.evaluated")
    pub event_type: String,
    /// Agent id, phase name, or saga id the event is about
    pub subject: Option<String>,
    /// Event-specific payload data
    pub payload: Value,
    /// Unix timestamp in milliseconds
    pub created_at: u64,
}

impl EventRecord {
    /// Create a new event with the given type and payload
    pub fn new(event_type: &str, subject: Option<String>, payload: Value) -> Self {
        Self {
            id: generate_event_id(),
            event_type: event_type.to_string(),
            subject,
            payload,
            created_at: now_ms(),
        }
    }

    pub fn agent_started(agent_id: &str, phase: &str) -> Self {
        Self::new(
            event_types::AGENT_STARTED,
            Some(agent_id.to_string()),
            serde_json::json!({ "phase": phase }),
        )
    }

    pub fn tool_invoked(agent_id: &str, capability_id: &str, success: bool, cost_usd: f64) -> Self {
        Self::new(
            event_types::AGENT_TOOL_INVOKED,
            Some(agent_id.to_string()),
            serde_json::json!({
                "capability_id": capability_id,
                "success": success,
                "cost_usd": cost_usd
            }),
        )
    }

    pub fn improvement_integrated(agent_id: &str, capability_id: &str, delta: f64) -> Self {
        Self::new(
            event_types::AGENT_IMPROVEMENT_INTEGRATED,
            Some(agent_id.to_string()),
            serde_json::json!({ "capability_id": capability_id, "delta": delta }),
        )
    }

    pub fn agent_completed(agent_id: &str, exit: &str, cost_usd: f64, iterations: u32) -> Self {
        Self::new(
            event_types::AGENT_COMPLETED,
            Some(agent_id.to_string()),
            serde_json::json!({
                "exit": exit,
                "cost_usd": cost_usd,
                "iterations": iterations
            }),
        )
    }

    pub fn agent_failed(agent_id: &str, error: &str) -> Self {
        Self::new(
            event_types::AGENT_FAILED,
            Some(agent_id.to_string()),
            serde_json::json!({ "error": error }),
        )
    }

    pub fn batch_dispatched(phase: &str, batch: usize, size: usize) -> Self {
        Self::new(
            event_types::PHASE_BATCH_DISPATCHED,
            Some(phase.to_string()),
            serde_json::json!({ "batch": batch, "size": size }),
        )
    }

    pub fn phase_completed(phase: &str, attempts: u32, cost_usd: f64) -> Self {
        Self::new(
            event_types::PHASE_COMPLETED,
            Some(phase.to_string()),
            serde_json::json!({ "attempts": attempts, "cost_usd": cost_usd }),
        )
    }

    pub fn phase_failed(phase: &str, reason: &str) -> Self {
        Self::new(
            event_types::PHASE_FAILED,
            Some(phase.to_string()),
            serde_json::json!({ "reason": reason }),
        )
    }

    pub fn gate_evaluated(phase: &str, status: &str, score: f64, attempt: u32) -> Self {
        Self::new(
            event_types::GATE_EVALUATED,
            Some(phase.to_string()),
            serde_json::json!({
                "status": status,
                "score": score,
                "attempt": attempt
            }),
        )
    }

    pub fn gate_retry(phase: &str, retry: u32, max_retries: u32) -> Self {
        Self::new(
            event_types::GATE_RETRY,
            Some(phase.to_string()),
            serde_json::json!({ "retry": retry, "max_retries": max_retries }),
        )
    }

    pub fn saga_status_change(saga_id: &str, old_status: &str, new_status: &str) -> Self {
        Self::new(
            event_types::SAGA_STATUS_CHANGE,
            Some(saga_id.to_string()),
            serde_json::json!({
                "old_status": old_status,
                "new_status": new_status
            }),
        )
    }

    pub fn saga_step_recorded(saga_id: &str, step_id: &str, status: &str) -> Self {
        Self::new(
            event_types::SAGA_STEP_RECORDED,
            Some(saga_id.to_string()),
            serde_json::json!({ "step_id": step_id, "status": status }),
        )
    }

    /// Check if this is a saga-related event
    pub fn is_saga_event(&self) -> bool {
        self.event_type.starts_with("saga.")
    }
}
