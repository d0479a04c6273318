//! Value-of-information analyzer.
//!
//! Decides, once per agent loop iteration, whether consulting a capability is
//! worth its cost. Read-only: it never charges the budget itself.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use super::types::{AnalyzerDecision, ToolCandidate};
use super::voi::{self, DEFAULT_VOI_THRESHOLD, HIGH_CONFIDENCE};
use crate::catalog::{Capability, CapabilityCatalogue, CapabilityPolicy};
use crate::domain::{Budget, ExecutionPlan, ReasoningResult};
use crate::error::Result;

/// Decides whether an agent should consult a tool this iteration.
#[async_trait]
pub trait ToolAnalyzer: Send + Sync {
    async fn analyze(
        &self,
        plan: &ExecutionPlan,
        current: &ReasoningResult,
        budget: &Budget,
    ) -> Result<AnalyzerDecision>;

    /// Minimum VoI a tool decision needs before the agent acts on it.
    fn voi_threshold(&self) -> f64 {
        DEFAULT_VOI_THRESHOLD
    }
}

/// Configuration for the VoI analyzer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// Minimum normalized VoI for a tool to be used. 1.0 disables tool use.
    pub voi_threshold: f64,
    /// Improvement multiplier per capability category (default 1.0)
    pub category_multipliers: HashMap<String, f64>,
    /// Categories relevant to each phase. Phases without an entry accept all.
    pub phase_categories: HashMap<String, Vec<String>>,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            voi_threshold: DEFAULT_VOI_THRESHOLD,
            category_multipliers: HashMap::new(),
            phase_categories: HashMap::new(),
        }
    }
}

impl AnalyzerConfig {
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.voi_threshold = threshold;
        self
    }

    pub fn with_multiplier(mut self, category: impl Into<String>, multiplier: f64) -> Self {
        self.category_multipliers.insert(category.into(), multiplier);
        self
    }

    pub fn with_phase_categories(
        mut self,
        phase: impl Into<String>,
        categories: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.phase_categories
            .insert(phase.into(), categories.into_iter().map(Into::into).collect());
        self
    }

    fn multiplier(&self, category: &str) -> f64 {
        self.category_multipliers.get(category).copied().unwrap_or(1.0)
    }

    fn is_relevant(&self, phase: &str, category: &str) -> bool {
        match self.phase_categories.get(phase) {
            Some(categories) => categories.iter().any(|c| c == category),
            None => true,
        }
    }
}

/// Analyzer scoring catalogue capabilities by value of information.
pub struct VoiAnalyzer {
    catalogue: Arc<dyn CapabilityCatalogue>,
    policy: CapabilityPolicy,
    config: AnalyzerConfig,
}

impl VoiAnalyzer {
    pub fn new(catalogue: Arc<dyn CapabilityCatalogue>, policy: CapabilityPolicy, config: AnalyzerConfig) -> Self {
        Self {
            catalogue,
            policy,
            config,
        }
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Capabilities from the catalogue, or none if the lookup fails.
    async fn capabilities(&self) -> Vec<Capability> {
        match self.catalogue.list_approved_capabilities().await {
            Ok(caps) => caps,
            Err(e) => {
                warn!("Capability catalogue unavailable, continuing without candidates: {}", e);
                Vec::new()
            }
        }
    }

    /// Score every relevant, permitted, affordable capability in catalogue order.
    pub async fn candidates(
        &self,
        plan: &ExecutionPlan,
        current: &ReasoningResult,
        budget: &Budget,
    ) -> Vec<ToolCandidate> {
        let gap = current.confidence_gap();
        let ratio = budget.remaining_ratio();

        self.capabilities()
            .await
            .into_iter()
            .filter(|cap| self.config.is_relevant(plan.phase(), &cap.category))
            .filter(|cap| self.policy.is_allowed(&cap.id))
            .filter(|cap| budget.can_afford(cap.cost_estimate))
            .map(|cap| {
                let improvement = voi::estimated_improvement(gap, self.config.multiplier(&cap.category));
                let score = voi::voi_score(improvement, ratio, cap.cost_estimate);
                ToolCandidate {
                    reasoning: format!(
                        "{} ({}): gap {:.2}, improvement {:.2}, cost ${:.3}, budget left {:.0}%",
                        cap.id,
                        cap.category,
                        gap,
                        improvement,
                        cap.cost_estimate,
                        ratio * 100.0
                    ),
                    input: serde_json::json!({
                        "phase": plan.phase(),
                        "content": current.content,
                        "steps": plan.actions(),
                    }),
                    id: cap.id,
                    version: cap.version,
                    estimated_improvement: improvement,
                    estimated_cost_usd: cap.cost_estimate,
                    voi_score: score,
                }
            })
            .collect()
    }
}

#[async_trait]
impl ToolAnalyzer for VoiAnalyzer {
    async fn analyze(
        &self,
        plan: &ExecutionPlan,
        current: &ReasoningResult,
        budget: &Budget,
    ) -> Result<AnalyzerDecision> {
        if current.confidence > HIGH_CONFIDENCE && !current.needs_improvement {
            return Ok(AnalyzerDecision::skip(format!(
                "Confidence {:.2} is high and no improvement was requested",
                current.confidence
            )));
        }

        if self.config.voi_threshold >= 1.0 {
            return Ok(AnalyzerDecision::skip("Tool use disabled by VoI threshold"));
        }

        let mut candidates = self.candidates(plan, current, budget).await;
        if candidates.is_empty() {
            return Ok(AnalyzerDecision::skip("No relevant, permitted, affordable capabilities"));
        }

        // Stable: equal scores keep catalogue order
        candidates.sort_by(|a, b| b.voi_score.total_cmp(&a.voi_score));
        let best = candidates.swap_remove(0);
        debug!("Best candidate for phase {}: {}", plan.phase(), best.reasoning);

        if !self.policy.is_allowed(&best.id) {
            return Ok(AnalyzerDecision::reject(&best, format!("{} is denied by policy", best.id)));
        }

        if best.voi_score < self.config.voi_threshold {
            let reason = format!(
                "Best VoI {:.3} from {} is below threshold {:.3}",
                best.voi_score, best.id, self.config.voi_threshold
            );
            return Ok(AnalyzerDecision::reject(&best, reason));
        }

        Ok(AnalyzerDecision::invoke(best))
    }

    fn voi_threshold(&self) -> f64 {
        self.config.voi_threshold
    }
}
