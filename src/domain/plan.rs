//! Execution plans produced once per agent invocation.

use serde::{Deserialize, Serialize};

/// One step of an execution plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanStep {
    pub id: String,
    pub action: String,
    pub description: String,
}

impl PlanStep {
    pub fn new(id: impl Into<String>, action: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            action: action.into(),
            description: description.into(),
        }
    }
}

/// Ordered, read-only sequence of steps for one phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionPlan {
    phase: String,
    steps: Vec<PlanStep>,
}

impl ExecutionPlan {
    pub fn new(phase: impl Into<String>, steps: Vec<PlanStep>) -> Self {
        Self {
            phase: phase.into(),
            steps,
        }
    }

    /// Phase this plan was produced for.
    pub fn phase(&self) -> &str {
        &self.phase
    }

    pub fn steps(&self) -> &[PlanStep] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Step actions in plan order.
    pub fn actions(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.action.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_preserves_order() {
        let plan = ExecutionPlan::new(
            "discovery",
            vec![
                PlanStep::new("1", "gather", "Collect requirements"),
                PlanStep::new("2", "draft", "Draft questions"),
            ],
        );
        assert_eq!(plan.phase(), "discovery");
        assert_eq!(plan.len(), 2);
        assert_eq!(plan.actions(), vec!["gather", "draft"]);
    }

    #[test]
    fn test_empty_plan() {
        let plan = ExecutionPlan::new("discovery", Vec::new());
        assert!(plan.is_empty());
    }
}
