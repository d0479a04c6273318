//! Error types for Phasegate
//!
//! Centralized error handling using thiserror.

use thiserror::Error;

/// All error types that can occur in Phasegate
#[derive(Debug, Error)]
pub enum PhasegateError {
    /// Agent strategy failed during plan, reason, or artifact generation
    #[error("Agent error: {0}")]
    Agent(String),

    /// Capability catalogue could not be read
    #[error("Catalogue error: {0}")]
    Catalogue(String),

    /// Tool invocation error
    #[error("Tool error: {0}")]
    Tool(String),

    /// Scoring function error
    #[error("Scoring error: {0}")]
    Scoring(String),

    /// Quality gate evaluation error
    #[error("Gate error: {0}")]
    Gate(String),

    /// Checkpoint write error
    #[error("Checkpoint error: {0}")]
    Checkpoint(String),

    /// Saga step or compensation error
    #[error("Saga step error: {0}")]
    SagaStep(String),

    /// Record not found in storage
    #[error("Record not found: {0}")]
    NotFound(String),

    /// Invalid state transition or operation
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Storage/persistence error
    #[error("Storage error: {0}")]
    Storage(String),

    /// Operation exceeded its time limit
    #[error("Timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for Phasegate operations
pub type Result<T> = std::result::Result<T, PhasegateError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_agent_error() {
        let err = PhasegateError::Agent("planner returned no steps".to_string());
        assert_eq!(err.to_string(), "Agent error: planner returned no steps");
    }

    #[test]
    fn test_saga_step_error() {
        let err = PhasegateError::SagaStep("drop table refused".to_string());
        assert_eq!(err.to_string(), "Saga step error: drop table refused");
    }

    #[test]
    fn test_timeout_error() {
        let err = PhasegateError::Timeout(Duration::from_secs(5));
        assert_eq!(err.to_string(), "Timed out after 5s");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: PhasegateError = io_err.into();
        assert!(matches!(err, PhasegateError::Io(_)));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("invalid").unwrap_err();
        let err: PhasegateError = json_err.into();
        assert!(matches!(err, PhasegateError::Json(_)));
    }
}
