//! ID generation utilities for Phasegate
//!
//! Provides functions for generating unique identifiers for phase runs, sagas, and events.

use rand::Rng;

/// Get current timestamp in milliseconds since Unix epoch
pub fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

fn random_suffix() -> u16 {
    rand::rng().random()
}

/// Generate a phase run ID
///
/// Format: `run-{timestamp_ms}-{random_hex}`
pub fn generate_run_id() -> String {
    format!("run-{}-{:04x}", now_ms(), random_suffix())
}

/// Generate a saga ID
///
/// Format: `saga-{timestamp_ms}-{random_hex}`
pub fn generate_saga_id() -> String {
    format!("saga-{}-{:04x}", now_ms(), random_suffix())
}

/// Generate an event ID
///
/// Format: `evt-{timestamp_ms}-{random_hex}`
pub fn generate_event_id() -> String {
    format!("evt-{}-{:04x}", now_ms(), random_suffix())
}

/// Build the checkpoint token for an agent within a phase
///
/// Format: `{phase}:{agent_id}`
pub fn checkpoint_token(phase: &str, agent_id: &str) -> String {
    format!("{}:{}", phase, agent_id)
}
