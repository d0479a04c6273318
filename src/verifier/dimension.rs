//! Quality dimensions and their weights.

use serde::{Deserialize, Serialize};

/// One axis on which content is scored, each in [0, 100].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityDimension {
    Completeness,
    Accuracy,
    Clarity,
    Relevance,
}

impl QualityDimension {
    pub const ALL: [QualityDimension; 4] = [
        QualityDimension::Completeness,
        QualityDimension::Accuracy,
        QualityDimension::Clarity,
        QualityDimension::Relevance,
    ];

    /// Weights sum to 1.0.
    pub fn weight(&self) -> f64 {
        match self {
            QualityDimension::Completeness => 0.3,
            QualityDimension::Accuracy => 0.3,
            QualityDimension::Clarity => 0.2,
            QualityDimension::Relevance => 0.2,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            QualityDimension::Completeness => "completeness",
            QualityDimension::Accuracy => "accuracy",
            QualityDimension::Clarity => "clarity",
            QualityDimension::Relevance => "relevance",
        }
    }
}

impl std::fmt::Display for QualityDimension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Scores for one piece of content.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DimensionScores {
    pub completeness: f64,
    pub accuracy: f64,
    pub clarity: f64,
    pub relevance: f64,
}

impl DimensionScores {
    pub fn new(completeness: f64, accuracy: f64, clarity: f64, relevance: f64) -> Self {
        Self {
            completeness,
            accuracy,
            clarity,
            relevance,
        }
        .clamped()
    }

    /// Same scores with every dimension forced into [0, 100]; NaN becomes 0.
    pub fn clamped(self) -> Self {
        let clamp = |v: f64| if v.is_nan() { 0.0 } else { v.clamp(0.0, 100.0) };
        Self {
            completeness: clamp(self.completeness),
            accuracy: clamp(self.accuracy),
            clarity: clamp(self.clarity),
            relevance: clamp(self.relevance),
        }
    }

    pub fn get(&self, dimension: QualityDimension) -> f64 {
        match dimension {
            QualityDimension::Completeness => self.completeness,
            QualityDimension::Accuracy => self.accuracy,
            QualityDimension::Clarity => self.clarity,
            QualityDimension::Relevance => self.relevance,
        }
    }

    /// Weighted total in [0, 100].
    pub fn weighted(&self) -> f64 {
        QualityDimension::ALL.iter().map(|d| self.get(*d) * d.weight()).sum()
    }
}

/// Per-dimension comparison reported in a verifier result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DimensionScore {
    pub name: String,
    pub baseline_score: f64,
    pub new_score: f64,
    pub weight: f64,
}

impl DimensionScore {
    /// One entry per dimension, in `QualityDimension::ALL` order.
    pub fn compare(baseline: &DimensionScores, candidate: &DimensionScores) -> Vec<DimensionScore> {
        QualityDimension::ALL
            .iter()
            .map(|d| DimensionScore {
                name: d.as_str().to_string(),
                baseline_score: baseline.get(*d),
                new_score: candidate.get(*d),
                weight: d.weight(),
            })
            .collect()
    }

    pub fn delta(&self) -> f64 {
        self.new_score - self.baseline_score
    }
}
