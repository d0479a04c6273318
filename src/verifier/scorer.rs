//! Scoring functions: the external scorer seam and the heuristic fallback.

use async_trait::async_trait;

use super::dimension::DimensionScores;
use crate::error::Result;

/// Scores a piece of content on every quality dimension.
#[async_trait]
pub trait ScoringFunction: Send + Sync {
    async fn score(&self, content: &str) -> Result<DimensionScores>;

    /// Name used in verifier reasoning and logs
    fn name(&self) -> &str;
}

/// Deterministic scorer built from word counts and structural markers.
///
/// Always available, so the verifier falls back to it whenever the external
/// scoring function fails.
#[derive(Debug, Clone, Copy)]
pub struct HeuristicScorer {
    /// Word count at which completeness from length saturates
    pub target_words: usize,
}

impl Default for HeuristicScorer {
    fn default() -> Self {
        Self { target_words: 200 }
    }
}

/// Structural features of a text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Structure {
    words: usize,
    sentences: usize,
    headings: usize,
    list_items: usize,
    code_blocks: usize,
    numbers: usize,
    hedges: usize,
    placeholders: usize,
}

const HEDGE_WORDS: &[&str] = &["maybe", "perhaps", "possibly", "probably", "might"];
const PLACEHOLDERS: &[&str] = &["todo", "tbd", "fixme", "xxx", "..."];

fn analyze(content: &str) -> Structure {
    let mut s = Structure::default();
    let mut in_fence = false;

    for line in content.lines() {
        let trimmed = line.trim_start();
        if trimmed.starts_with("```") {
            if !in_fence {
                s.code_blocks += 1;
            }
            in_fence = !in_fence;
            continue;
        }
        if in_fence {
            continue;
        }
        if trimmed.starts_with('#') {
            s.headings += 1;
        } else if trimmed.starts_with("- ") || trimmed.starts_with("* ") || is_numbered(trimmed) {
            s.list_items += 1;
        }
    }

    for word in content.split_whitespace() {
        s.words += 1;
        let lower = word.to_lowercase();
        let bare = lower.trim_matches(|c: char| !c.is_alphanumeric() && c != '.');
        if HEDGE_WORDS.contains(&bare.trim_end_matches('.')) {
            s.hedges += 1;
        }
        if PLACEHOLDERS.iter().any(|p| bare == *p || bare.trim_end_matches('.') == *p) {
            s.placeholders += 1;
        }
        if word.chars().any(|c| c.is_ascii_digit()) {
            s.numbers += 1;
        }
        if word.ends_with('.') || word.ends_with('!') || word.ends_with('?') {
            s.sentences += 1;
        }
    }
    if s.words > 0 && s.sentences == 0 {
        s.sentences = 1;
    }
    s
}

fn is_numbered(line: &str) -> bool {
    let digits = line.chars().take_while(|c| c.is_ascii_digit()).count();
    digits > 0 && line[digits..].starts_with(". ")
}

impl HeuristicScorer {
    pub fn new(target_words: usize) -> Self {
        Self {
            target_words: target_words.max(1),
        }
    }

    pub fn score_sync(&self, content: &str) -> DimensionScores {
        let s = analyze(content);
        if s.words == 0 {
            return DimensionScores::default();
        }

        let length = (s.words as f64 / self.target_words as f64).min(1.0);
        let structure = ((s.headings + s.list_items + s.code_blocks) as f64 / 5.0).min(1.0);
        let placeholder_penalty = (s.placeholders as f64 * 10.0).min(40.0);

        let completeness = length * 75.0 + structure * 25.0 - placeholder_penalty;

        let specificity = (s.numbers + s.code_blocks * 3) as f64 / s.words as f64;
        let hedge_penalty = (s.hedges as f64 / s.words as f64 * 400.0).min(30.0);
        let accuracy = 55.0 + (specificity * 200.0).min(35.0) - hedge_penalty - placeholder_penalty / 2.0;

        let avg_sentence = s.words as f64 / s.sentences as f64;
        let sentence_fit = if (8.0..=25.0).contains(&avg_sentence) {
            1.0
        } else if avg_sentence < 8.0 {
            avg_sentence / 8.0
        } else {
            (25.0 / avg_sentence).max(0.2)
        };
        let clarity = sentence_fit * 70.0 + if s.headings > 0 { 15.0 } else { 0.0 } + if s.list_items > 0 { 15.0 } else { 0.0 };

        let relevance = 40.0 + length * 40.0 + structure * 20.0 - placeholder_penalty;

        DimensionScores::new(completeness, accuracy, clarity, relevance)
    }
}

#[async_trait]
impl ScoringFunction for HeuristicScorer {
    async fn score(&self, content: &str) -> Result<DimensionScores> {
        Ok(self.score_sync(content))
    }

    fn name(&self) -> &str {
        "heuristic"
    }
}
