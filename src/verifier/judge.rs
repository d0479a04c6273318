//! LLM-as-judge scoring.
//!
//! A separate model call rates content on each quality dimension. The judge
//! must answer with a JSON object; anything else is a parse failure and the
//! verifier falls back to the heuristic scorer.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use serde::Deserialize;
use thiserror::Error;

use super::dimension::{DimensionScores, QualityDimension};
use super::scorer::ScoringFunction;
use crate::error::{PhasegateError, Result};
use crate::llm::{CompletionRequest, LlmClient, LlmError};

/// Errors from LLM judge operations.
#[derive(Debug, Error)]
pub enum JudgeError {
    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Judge response parsing failed: {0}")]
    ParseFailed(String),

    #[error("Judge timed out after {0:?}")]
    Timeout(Duration),
}

impl From<JudgeError> for PhasegateError {
    fn from(err: JudgeError) -> Self {
        match err {
            JudgeError::Timeout(d) => PhasegateError::Timeout(d),
            other => PhasegateError::Scoring(other.to_string()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct JudgeScores {
    completeness: f64,
    accuracy: f64,
    clarity: f64,
    relevance: f64,
}

/// Scoring function backed by an LLM.
pub struct JudgeScorer {
    client: Arc<dyn LlmClient>,
    system_prompt: String,
    /// Subject line, e.g. "design document"
    subject: String,
    timeout: Duration,
    max_tokens: u32,
}

impl JudgeScorer {
    pub fn new(client: Arc<dyn LlmClient>) -> Self {
        Self {
            client,
            system_prompt: "You are a strict reviewer. Score content on each dimension from 0 to 100 and answer with JSON only."
                .to_string(),
            subject: "artifact".to_string(),
            timeout: Duration::from_secs(60),
            max_tokens: 300,
        }
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = subject.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Build the judge prompt.
    pub fn build_prompt(&self, content: &str) -> String {
        let mut prompt = format!("Rate the following {} on each quality dimension.\n\n", self.subject);

        prompt.push_str("## Dimensions\n\n");
        for dim in QualityDimension::ALL {
            prompt.push_str(&format!("- {} (weight {:.1})\n", dim, dim.weight()));
        }

        prompt.push_str("\n## Content to Evaluate\n\n```\n");
        prompt.push_str(content);
        prompt.push_str("\n```\n\n");

        prompt.push_str("Respond with EXACTLY one JSON object, for example:\n");
        prompt.push_str("{\"completeness\": 70, \"accuracy\": 80, \"clarity\": 65, \"relevance\": 90}");
        prompt
    }

    /// Score content, keeping the judge-specific error.
    pub async fn judge(&self, content: &str) -> std::result::Result<DimensionScores, JudgeError> {
        let request = CompletionRequest::single(self.system_prompt.clone(), self.build_prompt(content), self.max_tokens);

        let response = tokio::time::timeout(self.timeout, self.client.complete(request))
            .await
            .map_err(|_| JudgeError::Timeout(self.timeout))??;

        debug!("Judge used {} tokens", response.usage.total());

        let text = response
            .content
            .ok_or_else(|| JudgeError::ParseFailed("No content in response".to_string()))?;

        parse_judge_response(&text)
    }
}

#[async_trait]
impl ScoringFunction for JudgeScorer {
    async fn score(&self, content: &str) -> Result<DimensionScores> {
        Ok(self.judge(content).await?)
    }

    fn name(&self) -> &str {
        "llm-judge"
    }
}

/// Extract the first JSON object from the judge's reply.
fn parse_judge_response(response: &str) -> std::result::Result<DimensionScores, JudgeError> {
    let response = response.trim();
    let start = response.find('{');
    let end = response.rfind('}');

    let json = match (start, end) {
        (Some(s), Some(e)) if e > s => &response[s..=e],
        _ => {
            return Err(JudgeError::ParseFailed(format!(
                "No JSON object in judge response: {}",
                truncate_for_error(response, 100)
            )));
        }
    };

    let scores: JudgeScores =
        serde_json::from_str(json).map_err(|e| JudgeError::ParseFailed(format!("{}: {}", e, truncate_for_error(json, 100))))?;

    Ok(DimensionScores::new(
        scores.completeness,
        scores.accuracy,
        scores.clarity,
        scores.relevance,
    ))
}

/// Truncate text for error messages.
fn truncate_for_error(text: &str, max_len: usize) -> String {
    if text.len() <= max_len {
        return text.to_string();
    }
    let mut cut = max_len;
    while !text.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}...", &text[..cut])
}
