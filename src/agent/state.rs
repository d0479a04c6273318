//! Agent loop states.

use serde::{Deserialize, Serialize};

/// `PLAN -> REASON -> {ANALYZE -> (INVOKE -> VERIFY -> (INTEGRATE|DISCARD))}* -> ARTIFACTS -> DONE`,
/// with `FAILED` reachable from any non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoopState {
    Plan,
    Reason,
    Analyze,
    Invoke,
    Verify,
    Integrate,
    Discard,
    Artifacts,
    Done,
    Failed,
}

impl LoopState {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoopState::Plan => "plan",
            LoopState::Reason => "reason",
            LoopState::Analyze => "analyze",
            LoopState::Invoke => "invoke",
            LoopState::Verify => "verify",
            LoopState::Integrate => "integrate",
            LoopState::Discard => "discard",
            LoopState::Artifacts => "artifacts",
            LoopState::Done => "done",
            LoopState::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, LoopState::Done | LoopState::Failed)
    }

    /// Whether the loop may move from `self` to `next`.
    pub fn can_transition_to(&self, next: LoopState) -> bool {
        use LoopState::*;
        if self.is_terminal() {
            return false;
        }
        if next == Failed {
            return true;
        }
        matches!(
            (self, next),
            (Plan, Reason)
                | (Reason, Analyze)
                | (Reason, Artifacts)
                | (Analyze, Invoke)
                | (Analyze, Artifacts)
                // a failed invocation goes straight back to the guard
                | (Invoke, Verify)
                | (Invoke, Analyze)
                | (Invoke, Artifacts)
                | (Verify, Integrate)
                | (Verify, Discard)
                | (Integrate, Analyze)
                | (Integrate, Artifacts)
                | (Discard, Analyze)
                | (Discard, Artifacts)
                | (Artifacts, Done)
        )
    }
}

impl std::fmt::Display for LoopState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
