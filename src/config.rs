use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use phasegate::agent::AgentLoopConfig;
use phasegate::analyzer::AnalyzerConfig;
use phasegate::catalog::CapabilityPolicy;
use phasegate::coordinator::{CoordinatorConfig, GateRetryConfig};
use phasegate::saga::SagaConfig;
use phasegate::verifier::VerifierConfig;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub log_level: Option<String>,
    pub analyzer: AnalyzerConfig,
    pub verifier: VerifierConfig,
    pub agent: AgentLoopConfig,
    pub coordinator: CoordinatorConfig,
    pub gate: GateRetryConfig,
    pub saga: SagaConfig,
    pub catalogue: CatalogueConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogueConfig {
    /// TOML file listing approved capabilities
    pub path: Option<PathBuf>,
    pub policy: CapabilityPolicy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding saga and checkpoint JSONL files
    pub data_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: dirs::data_local_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("phasegate"),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: Some("info".to_string()),
            analyzer: AnalyzerConfig::default(),
            verifier: VerifierConfig::default(),
            agent: AgentLoopConfig::default(),
            coordinator: CoordinatorConfig::default(),
            gate: GateRetryConfig::default(),
            saga: SagaConfig::default(),
            catalogue: CatalogueConfig::default(),
            storage: StorageConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // ~/.config/phasegate/phasegate.yml
        let project_name = env!("CARGO_PKG_NAME");
        if let Some(config_dir) = dirs::config_dir() {
            let primary_config = config_dir.join(project_name).join(format!("{}.yml", project_name));
            if primary_config.exists() {
                match Self::load_from_file(&primary_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        log::warn!("Failed to load config from {}: {}", primary_config.display(), e);
                    }
                }
            }
        }

        let fallback_config = PathBuf::from(format!("{}.yml", project_name));
        if fallback_config.exists() {
            match Self::load_from_file(&fallback_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    log::warn!("Failed to load config from {}: {}", fallback_config.display(), e);
                }
            }
        }

        log::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Filter directives for env_logger. A non-empty `RUST_LOG` overrides `log_level`.
    pub fn log_filter(&self, rust_log: Option<String>) -> String {
        rust_log
            .filter(|v| !v.trim().is_empty())
            .or_else(|| self.log_level.clone())
            .unwrap_or_else(|| "info".to_string())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;
        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;
        log::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let yaml = r#"
coordinator:
  max_concurrency: 2
gate:
  max_gate_retries: 3
catalogue:
  policy:
    deny: ["shell-exec"]
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.coordinator.max_concurrency, 2);
        assert_eq!(config.coordinator.min_required_agents, 1);
        assert_eq!(config.gate.max_gate_retries, 3);
        assert_eq!(config.saga.default_step_timeout_secs, 300);
        assert!(!config.catalogue.policy.is_allowed("shell-exec"));
        assert!((config.analyzer.voi_threshold - 0.3).abs() < f64::EPSILON);
    }

    #[test]
    fn test_log_level_drives_filter() {
        let config: Config = serde_yaml::from_str("log_level: debug").unwrap();
        assert_eq!(config.log_filter(None), "debug");
        assert_eq!(config.log_filter(Some(String::new())), "debug");
        assert_eq!(config.log_filter(Some("phasegate=trace".into())), "phasegate=trace");

        let unset = Config {
            log_level: None,
            ..Config::default()
        };
        assert_eq!(unset.log_filter(None), "info");
    }

    #[test]
    fn test_load_explicit_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "agent:\n  max_tool_invocations: 2").unwrap();
        let config = Config::load(Some(&file.path().to_path_buf())).unwrap();
        assert_eq!(config.agent.max_tool_invocations, 2);
    }

    #[test]
    fn test_load_missing_explicit_file_errors() {
        let path = PathBuf::from("/nonexistent/phasegate.yml");
        assert!(Config::load(Some(&path)).is_err());
    }
}
