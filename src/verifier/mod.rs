//! Verifier - scores a candidate against a baseline on weighted quality dimensions

mod dimension;
mod judge;
mod scorer;
#[allow(clippy::module_inception)]
mod verifier;

pub use dimension::{DimensionScore, DimensionScores, QualityDimension};
pub use judge::{JudgeError, JudgeScorer};
pub use scorer::{HeuristicScorer, ScoringFunction};
pub use verifier::{OutputVerifier, Verifier, VerifierConfig, VerifierResult};
