//! Value-of-information analyzer - decides whether a tool is worth consulting

#[allow(clippy::module_inception)]
mod analyzer;
mod types;
pub mod voi;

pub use analyzer::{AnalyzerConfig, ToolAnalyzer, VoiAnalyzer};
pub use types::{AnalyzerDecision, ToolCandidate};
