//! LLM client seam - the external scoring model behind the judge scorer
//!
//! No concrete provider lives here; callers inject an `LlmClient`.

mod client;

pub use client::{CompletionRequest, CompletionResponse, LlmClient, LlmError, Message, Role, TokenUsage};
