//! Value-of-information scoring.
//!
//! ```text
//! estimated_improvement = min(confidence_gap * category_multiplier, 0.8)
//! voi                   = (estimated_improvement * remaining_budget_ratio) / (estimated_cost + 0.01)
//! voi_score             = min(voi / 10, 1.0)
//! ```

/// Confidence above which a result that does not need improvement skips scoring.
pub const HIGH_CONFIDENCE: f64 = 0.85;

/// Ceiling on the improvement any single tool is assumed to deliver.
pub const MAX_ESTIMATED_IMPROVEMENT: f64 = 0.8;

/// Added to the cost so free tools do not divide by zero.
pub const COST_EPSILON: f64 = 0.01;

/// Divisor that maps raw VoI onto [0, 1].
pub const VOI_NORMALIZER: f64 = 10.0;

/// Minimum normalized VoI for a tool to be worth consulting.
pub const DEFAULT_VOI_THRESHOLD: f64 = 0.3;

/// Expected gain from a tool given the current confidence gap.
pub fn estimated_improvement(confidence_gap: f64, category_multiplier: f64) -> f64 {
    (confidence_gap.max(0.0) * category_multiplier.max(0.0)).min(MAX_ESTIMATED_IMPROVEMENT)
}

/// Raw value of information.
pub fn raw_voi(estimated_improvement: f64, remaining_budget_ratio: f64, estimated_cost_usd: f64) -> f64 {
    let gain = estimated_improvement.max(0.0) * remaining_budget_ratio.clamp(0.0, 1.0);
    gain / (estimated_cost_usd.max(0.0) + COST_EPSILON)
}

/// Value of information normalized to [0, 1].
pub fn voi_score(estimated_improvement: f64, remaining_budget_ratio: f64, estimated_cost_usd: f64) -> f64 {
    (raw_voi(estimated_improvement, remaining_budget_ratio, estimated_cost_usd) / VOI_NORMALIZER).min(1.0)
}
