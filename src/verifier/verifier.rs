//! Baseline vs candidate comparison.

use std::sync::Arc;

use async_trait::async_trait;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use super::dimension::{DimensionScore, DimensionScores};
use super::scorer::{HeuristicScorer, ScoringFunction};
use crate::error::Result;

/// Decides whether a candidate output genuinely improves on a baseline.
#[async_trait]
pub trait OutputVerifier: Send + Sync {
    async fn compare(&self, baseline: &str, candidate: &str) -> Result<VerifierResult>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VerifierConfig {
    /// Weighted points the candidate must gain to count as improved
    pub improvement_threshold: f64,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            improvement_threshold: 0.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifierResult {
    pub improved: bool,
    /// Weighted candidate score in [0, 100]
    pub score: f64,
    pub delta: f64,
    pub dimensions: Vec<DimensionScore>,
    pub reasoning: String,
    /// Name of the scorer that produced the numbers
    pub scorer: String,
}

/// Verifier scoring through an optional external function with a heuristic fallback.
pub struct Verifier {
    scorer: Option<Arc<dyn ScoringFunction>>,
    fallback: HeuristicScorer,
    config: VerifierConfig,
}

impl Verifier {
    /// Verifier that only uses the heuristic scorer.
    pub fn heuristic(config: VerifierConfig) -> Self {
        Self {
            scorer: None,
            fallback: HeuristicScorer::default(),
            config,
        }
    }

    pub fn new(scorer: Arc<dyn ScoringFunction>, config: VerifierConfig) -> Self {
        Self {
            scorer: Some(scorer),
            fallback: HeuristicScorer::default(),
            config,
        }
    }

    pub fn with_fallback(mut self, fallback: HeuristicScorer) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn config(&self) -> &VerifierConfig {
        &self.config
    }

    /// Score both sides with one scorer. Identical content is scored once.
    async fn score_pair(&self, baseline: &str, candidate: &str) -> (DimensionScores, DimensionScores, String) {
        if let Some(scorer) = &self.scorer {
            let scored = if baseline == candidate {
                scorer.score(baseline).await.map(|s| (s, s))
            } else {
                match scorer.score(baseline).await {
                    Ok(b) => scorer.score(candidate).await.map(|c| (b, c)),
                    Err(e) => Err(e),
                }
            };

            match scored {
                Ok((b, c)) => return (b.clamped(), c.clamped(), scorer.name().to_string()),
                Err(e) => warn!("Scorer {} failed, using heuristic for both sides: {}", scorer.name(), e),
            }
        }

        let b = self.fallback.score_sync(baseline);
        let c = if baseline == candidate {
            b
        } else {
            self.fallback.score_sync(candidate)
        };
        (b, c, self.fallback.name().to_string())
    }
}

#[async_trait]
impl OutputVerifier for Verifier {
    async fn compare(&self, baseline: &str, candidate: &str) -> Result<VerifierResult> {
        let (base, cand, scorer) = self.score_pair(baseline, candidate).await;

        let base_total = base.weighted();
        let cand_total = cand.weighted();
        let delta = cand_total - base_total;
        let improved = delta > self.config.improvement_threshold;

        let reasoning = format!(
            "Candidate {:.2} vs baseline {:.2} (delta {:+.2}, threshold {:.2}) via {}: {}",
            cand_total,
            base_total,
            delta,
            self.config.improvement_threshold,
            scorer,
            if improved { "improved" } else { "not improved" }
        );
        debug!("{}", reasoning);

        Ok(VerifierResult {
            improved,
            score: cand_total,
            delta,
            dimensions: DimensionScore::compare(&base, &cand),
            reasoning,
            scorer,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PhasegateError;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Returns a different score on every call.
    struct DriftingScorer {
        calls: AtomicU32,
    }

    #[async_trait]
    impl ScoringFunction for DriftingScorer {
        async fn score(&self, _content: &str) -> Result<DimensionScores> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) as f64;
            Ok(DimensionScores::new(10.0 * n, 50.0, 50.0, 50.0))
        }

        fn name(&self) -> &str {
            "drifting"
        }
    }

    /// Scores by content length; fails on content containing "boom".
    struct LengthScorer;

    #[async_trait]
    impl ScoringFunction for LengthScorer {
        async fn score(&self, content: &str) -> Result<DimensionScores> {
            if content.contains("boom") {
                return Err(PhasegateError::Scoring("judge unavailable".into()));
            }
            let v = content.len() as f64;
            Ok(DimensionScores::new(v, v, v, v))
        }

        fn name(&self) -> &str {
            "length"
        }
    }

    #[tokio::test]
    async fn test_identical_content_zero_delta() {
        let verifier = Verifier::new(
            Arc::new(DriftingScorer {
                calls: AtomicU32::new(0),
            }),
            VerifierConfig::default(),
        );
        let result = verifier.compare("same text", "same text").await.unwrap();
        assert_eq!(result.delta, 0.0);
        assert!(!result.improved);
    }

    #[tokio::test]
    async fn test_identical_content_heuristic() {
        let verifier = Verifier::heuristic(VerifierConfig::default());
        let result = verifier.compare("# A\n- b\n- c", "# A\n- b\n- c").await.unwrap();
        assert_eq!(result.delta, 0.0);
        assert!(!result.improved);
        assert_eq!(result.scorer, "heuristic");
    }

    #[tokio::test]
    async fn test_improvement_over_threshold() {
        let verifier = Verifier::new(Arc::new(LengthScorer), VerifierConfig::default());
        let result = verifier.compare("short", "a much longer answer").await.unwrap();
        assert!(result.improved);
        assert!((result.delta - 15.0).abs() < 1e-9);
        assert_eq!(result.dimensions.len(), 4);
        assert_eq!(result.scorer, "length");
    }

    #[tokio::test]
    async fn test_marginal_delta_not_improved() {
        let verifier = Verifier::new(Arc::new(LengthScorer), VerifierConfig { improvement_threshold: 0.5 });
        // one extra character is worth 1.0 weighted point
        let strict = Verifier::new(Arc::new(LengthScorer), VerifierConfig { improvement_threshold: 2.0 });
        assert!(verifier.compare("abc", "abcd").await.unwrap().improved);
        assert!(!strict.compare("abc", "abcd").await.unwrap().improved);
    }

    #[tokio::test]
    async fn test_regression_is_negative_delta() {
        let verifier = Verifier::new(Arc::new(LengthScorer), VerifierConfig::default());
        let result = verifier.compare("a longer baseline", "short").await.unwrap();
        assert!(result.delta < 0.0);
        assert!(!result.improved);
    }

    #[tokio::test]
    async fn test_scorer_failure_falls_back_for_both_sides() {
        let verifier = Verifier::new(Arc::new(LengthScorer), VerifierConfig::default());
        let result = verifier.compare("baseline", "candidate with boom").await.unwrap();
        assert_eq!(result.scorer, "heuristic");
        let heuristic = HeuristicScorer::default();
        let expected = heuristic.score_sync("candidate with boom").weighted() - heuristic.score_sync("baseline").weighted();
        assert!((result.delta - expected).abs() < 1e-9);
    }
}
