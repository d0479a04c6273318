//! Retry hints derived from failed gate evaluations.

use super::gate::GateResult;
use crate::domain::PhaseHints;

/// Hints for the attempt following gate failure number `attempt`.
pub fn hints_from_gate(result: &GateResult, attempt: u32) -> PhaseHints {
    PhaseHints {
        attempt,
        failed_metrics: result.decision.failed_metrics.clone(),
        required_actions: result.decision.required_actions.clone(),
        recommendations: result.decision.recommendations.clone(),
        reasons: result.decision.reasons.clone(),
    }
}

/// Formatter for putting hints into agent prompts.
#[derive(Debug, Clone, Copy)]
pub struct HintFormatter {
    /// Maximum entries shown per section
    pub max_items_per_section: usize,
}

impl Default for HintFormatter {
    fn default() -> Self {
        Self {
            max_items_per_section: 10,
        }
    }
}

impl HintFormatter {
    pub fn with_max_items_per_section(mut self, max: usize) -> Self {
        self.max_items_per_section = max;
        self
    }

    /// Render hints as markdown. Empty hints render as an empty string.
    pub fn format(&self, hints: &PhaseHints) -> String {
        if hints.is_empty() {
            return String::new();
        }

        let mut output = format!("## Quality Gate Feedback (attempt {})\n\n", hints.attempt + 1);
        output.push_str("The previous attempt was rejected. Address these points first.\n\n");

        self.section(&mut output, "Required actions", &hints.required_actions);
        self.section(&mut output, "Failed metrics", &hints.failed_metrics);
        self.section(&mut output, "Reasons", &hints.reasons);
        self.section(&mut output, "Recommendations", &hints.recommendations);

        output
    }

    fn section(&self, output: &mut String, title: &str, items: &[String]) {
        if items.is_empty() {
            return;
        }
        output.push_str(&format!("**{}**:\n", title));
        for item in items.iter().take(self.max_items_per_section) {
            output.push_str(&format!("- {}\n", item));
        }
        if items.len() > self.max_items_per_section {
            output.push_str(&format!("- ... and {} more\n", items.len() - self.max_items_per_section));
        }
        output.push('\n');
    }
}
