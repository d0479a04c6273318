//! Side effects a phase leaves behind in external systems.

use serde::{Deserialize, Serialize};

/// A reversible change applied while a phase ran.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SideEffect {
    /// An artifact was written to durable storage
    ArtifactCreated { id: String },
    /// A schema or data migration was applied
    MigrationApplied { id: String },
    /// A feature flag was switched on
    FlagEnabled { name: String },
}

impl SideEffect {
    pub fn kind(&self) -> &'static str {
        match self {
            SideEffect::ArtifactCreated { .. } => "artifact_created",
            SideEffect::MigrationApplied { .. } => "migration_applied",
            SideEffect::FlagEnabled { .. } => "flag_enabled",
        }
    }

    /// Identifier of the affected artifact, migration, or flag.
    pub fn target(&self) -> &str {
        match self {
            SideEffect::ArtifactCreated { id } | SideEffect::MigrationApplied { id } => id,
            SideEffect::FlagEnabled { name } => name,
        }
    }
}

impl std::fmt::Display for SideEffect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.kind(), self.target())
    }
}
