//! Tool invocation seam.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::Budget;
use crate::error::Result;

/// Request to run one capability.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolRequest {
    pub capability_id: String,
    pub input: Value,
    /// Snapshot of the caller's budget at invocation time
    pub budget: Budget,
}

/// Outcome of one invocation. Owned by the loop for a single iteration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolInvocationResult {
    pub success: bool,
    pub output: Value,
    pub cost_usd: f64,
    #[serde(default)]
    pub tokens_used: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ToolInvocationResult {
    pub fn ok(output: Value, cost_usd: f64) -> Self {
        Self {
            success: true,
            output,
            cost_usd,
            tokens_used: 0,
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>, cost_usd: f64) -> Self {
        Self {
            success: false,
            output: Value::Null,
            cost_usd,
            tokens_used: 0,
            error: Some(error.into()),
        }
    }

    pub fn with_tokens(mut self, tokens_used: u64) -> Self {
        self.tokens_used = tokens_used;
        self
    }

    /// Candidate content carried by the output.
    ///
    /// A string output is used as-is; an object's `content` string field is
    /// preferred; anything else is rendered as JSON.
    pub fn content(&self) -> String {
        match &self.output {
            Value::String(s) => s.clone(),
            Value::Object(map) => match map.get("content") {
                Some(Value::String(s)) => s.clone(),
                _ => self.output.to_string(),
            },
            Value::Null => String::new(),
            other => other.to_string(),
        }
    }
}

/// Runs capabilities chosen by the analyzer.
#[async_trait]
pub trait ToolInvoker: Send + Sync {
    async fn invoke(&self, request: ToolRequest) -> Result<ToolInvocationResult>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_content_from_string() {
        let result = ToolInvocationResult::ok(json!("refined text"), 0.1);
        assert_eq!(result.content(), "refined text");
    }

    #[test]
    fn test_content_from_object_field() {
        let result = ToolInvocationResult::ok(json!({"content": "refined", "sources": 3}), 0.1);
        assert_eq!(result.content(), "refined");
    }

    #[test]
    fn test_content_falls_back_to_json() {
        let result = ToolInvocationResult::ok(json!({"rows": [1, 2]}), 0.1);
        assert_eq!(result.content(), r#"{"rows":[1,2]}"#);
        assert_eq!(ToolInvocationResult::failed("down", 0.0).content(), "");
    }

    #[test]
    fn test_wire_shape() {
        let result = ToolInvocationResult::failed("rate limited", 0.02);
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["costUsd"], 0.02);
        assert_eq!(json["error"], "rate limited");
    }
}
