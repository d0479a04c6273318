//! Capability definitions
//!
//! A capability is an auxiliary tool an agent may consult to improve its result.

use serde::{Deserialize, Serialize};

/// An approved capability with its cost profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Capability {
    /// Capability identifier (e.g., "web-search")
    pub id: String,
    /// Version string as published by the catalogue
    pub version: String,
    /// Task category this capability serves (e.g., "research", "validation")
    pub category: String,
    /// Expected cost of one invocation in USD
    pub cost_estimate: f64,
    /// Human-readable description
    #[serde(default)]
    pub description: String,
}

impl Capability {
    /// Create a new capability
    pub fn new(id: impl Into<String>, category: impl Into<String>, cost_estimate: f64) -> Self {
        Self {
            id: id.into(),
            version: "1.0.0".to_string(),
            category: category.into(),
            cost_estimate: cost_estimate.max(0.0),
            description: String::new(),
        }
    }

    /// Set version
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Set description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}
