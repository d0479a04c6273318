//! Allow/deny policy for capabilities.

use serde::{Deserialize, Serialize};

/// Capability access policy. Deny always wins; an empty allow list allows everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CapabilityPolicy {
    pub allow: Vec<String>,
    pub deny: Vec<String>,
}

impl CapabilityPolicy {
    /// Policy that allows every capability.
    pub fn permissive() -> Self {
        Self::default()
    }

    pub fn with_allow(mut self, ids: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.allow.extend(ids.into_iter().map(Into::into));
        self
    }

    pub fn with_deny(mut self, ids: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.deny.extend(ids.into_iter().map(Into::into));
        self
    }

    pub fn is_allowed(&self, capability_id: &str) -> bool {
        if self.deny.iter().any(|d| d == capability_id) {
            return false;
        }
        self.allow.is_empty() || self.allow.iter().any(|a| a == capability_id)
    }
}
