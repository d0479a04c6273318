//! Capability catalogue loading from TOML configuration
//!
//! Loads approved capabilities from a TOML file. Entries keep file order so
//! candidate enumeration, and therefore analyzer tie-breaking, is deterministic.

use std::path::Path;

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::{PhasegateError, Result};

use super::capability::Capability;

/// Source of approved capabilities for the analyzer
#[async_trait]
pub trait CapabilityCatalogue: Send + Sync {
    /// List every approved capability in a stable order
    async fn list_approved_capabilities(&self) -> Result<Vec<Capability>>;
}

/// TOML representation of a capability
#[derive(Debug, Deserialize)]
struct TomlCapability {
    id: String,
    version: Option<String>,
    category: String,
    cost_estimate: f64,
    description: Option<String>,
    #[serde(default = "default_approved")]
    approved: bool,
}

fn default_approved() -> bool {
    true
}

/// TOML file structure
#[derive(Debug, Deserialize)]
struct TomlCatalogue {
    #[serde(rename = "capability", default)]
    capabilities: Vec<TomlCapability>,
}

/// Fixed in-process catalogue
#[derive(Debug, Clone, Default)]
pub struct StaticCatalogue {
    capabilities: Vec<Capability>,
}

impl StaticCatalogue {
    /// Create an empty catalogue
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from capabilities in the given order
    pub fn from_capabilities(capabilities: Vec<Capability>) -> Self {
        Self { capabilities }
    }

    /// Load catalogue from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| PhasegateError::Catalogue(format!("Failed to read catalogue file: {}", e)))?;
        Self::from_toml(&content)
    }

    /// Load catalogue from TOML string. Unapproved entries are skipped.
    pub fn from_toml(content: &str) -> Result<Self> {
        let catalogue: TomlCatalogue = toml::from_str(content)
            .map_err(|e| PhasegateError::Catalogue(format!("Failed to parse TOML: {}", e)))?;

        let mut capabilities: Vec<Capability> = Vec::new();
        for entry in catalogue.capabilities {
            if !entry.approved {
                continue;
            }
            if capabilities.iter().any(|c| c.id == entry.id) {
                return Err(PhasegateError::Catalogue(format!(
                    "Duplicate capability id '{}'",
                    entry.id
                )));
            }
            if !entry.cost_estimate.is_finite() || entry.cost_estimate < 0.0 {
                return Err(PhasegateError::Catalogue(format!(
                    "Invalid cost_estimate {} for capability '{}'",
                    entry.cost_estimate, entry.id
                )));
            }

            let mut cap = Capability::new(entry.id, entry.category, entry.cost_estimate);
            if let Some(version) = entry.version {
                cap = cap.with_version(version);
            }
            if let Some(description) = entry.description {
                cap = cap.with_description(description);
            }
            capabilities.push(cap);
        }

        Ok(Self { capabilities })
    }

    /// Get a capability by id
    pub fn get(&self, id: &str) -> Option<&Capability> {
        self.capabilities.iter().find(|c| c.id == id)
    }

    /// Get all capabilities in catalogue order
    pub fn all(&self) -> &[Capability] {
        &self.capabilities
    }

    pub fn len(&self) -> usize {
        self.capabilities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.capabilities.is_empty()
    }

    /// Append a capability
    pub fn add(&mut self, capability: Capability) {
        self.capabilities.push(capability);
    }
}

#[async_trait]
impl CapabilityCatalogue for StaticCatalogue {
    async fn list_approved_capabilities(&self) -> Result<Vec<Capability>> {
        Ok(self.capabilities.clone())
    }
}
