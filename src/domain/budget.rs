//! Budget tracking for a single agent invocation.

use serde::{Deserialize, Serialize};

/// Accumulated spend against a cost and token ceiling.
///
/// Spent values only ever grow: negative charges are clamped to zero.
/// Going over a ceiling is an ordinary exit condition for the owning loop,
/// never an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Budget {
    pub spent_cost_usd: f64,
    pub spent_tokens: u64,
    pub max_cost_usd: f64,
    pub max_tokens: u64,
}

impl Budget {
    /// Create an empty budget with the given ceilings.
    pub fn new(max_cost_usd: f64, max_tokens: u64) -> Self {
        Self {
            spent_cost_usd: 0.0,
            spent_tokens: 0,
            max_cost_usd: max_cost_usd.max(0.0),
            max_tokens,
        }
    }

    /// Add cost and tokens to the running totals.
    pub fn charge(&mut self, cost_usd: f64, tokens: u64) {
        if cost_usd.is_finite() && cost_usd > 0.0 {
            self.spent_cost_usd += cost_usd;
        }
        self.spent_tokens = self.spent_tokens.saturating_add(tokens);
    }

    /// Add cost only.
    pub fn charge_cost(&mut self, cost_usd: f64) {
        self.charge(cost_usd, 0);
    }

    pub fn remaining_cost_usd(&self) -> f64 {
        (self.max_cost_usd - self.spent_cost_usd).max(0.0)
    }

    pub fn remaining_tokens(&self) -> u64 {
        self.max_tokens.saturating_sub(self.spent_tokens)
    }

    /// Fraction of the cost ceiling still available, in [0, 1].
    pub fn remaining_ratio(&self) -> f64 {
        if self.max_cost_usd <= 0.0 {
            return 0.0;
        }
        (self.remaining_cost_usd() / self.max_cost_usd).clamp(0.0, 1.0)
    }

    /// True once either ceiling has been reached.
    pub fn is_exhausted(&self) -> bool {
        self.spent_cost_usd >= self.max_cost_usd || self.spent_tokens >= self.max_tokens
    }

    /// Whether a charge of `cost_usd` fits in what is left.
    pub fn can_afford(&self, cost_usd: f64) -> bool {
        cost_usd <= self.remaining_cost_usd()
    }
}
