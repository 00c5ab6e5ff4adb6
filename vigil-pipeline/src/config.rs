//! Layered configuration: defaults, an optional config file, then
//! `VIGIL__*` environment overrides (highest precedence).

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{Result, StartupError};

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

fn default_max_concurrent_sources() -> usize {
    3
}

fn default_cycle_interval_minutes() -> u64 {
    60
}

fn default_request_timeout_secs() -> u64 {
    vigil_adapters_default_timeout()
}

fn vigil_adapters_default_timeout() -> u64 {
    vigil_adapters::DEFAULT_REQUEST_TIMEOUT_SECS
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub merge_strategy: vigil_core::MergeStrategy,
    #[serde(default)]
    pub data_type_hint: Option<String>,
}

fn default_true() -> bool {
    true
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            merge_strategy: vigil_core::MergeStrategy::default(),
            data_type_hint: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    #[serde(default = "default_max_concurrent_sources")]
    pub max_concurrent_sources: usize,
    #[serde(default = "default_cycle_interval_minutes")]
    pub cycle_interval_minutes: u64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default)]
    pub sources: BTreeMap<String, SourceConfig>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            max_concurrent_sources: default_max_concurrent_sources(),
            cycle_interval_minutes: default_cycle_interval_minutes(),
            request_timeout_secs: default_request_timeout_secs(),
            sources: BTreeMap::new(),
        }
    }
}

impl PipelineConfig {
    /// Load defaults, then `config/vigil.toml` if present, then
    /// `VIGIL__*` environment variables (e.g. `VIGIL__MAX_CONCURRENT_SOURCES=5`).
    pub fn load() -> Result<Self> {
        let builder = config::Config::builder()
            .add_source(config::Config::try_from(&PipelineConfig::default())?)
            .add_source(config::File::with_name("config/vigil").required(false))
            .add_source(
                config::Environment::with_prefix("VIGIL")
                    .separator("__")
                    .try_parsing(true),
            );

        builder.build()?.try_deserialize().map_err(StartupError::from)
    }

    pub fn source_config(&self, source: &str) -> SourceConfig {
        self.sources.get(source).cloned().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec_values() {
        let cfg = PipelineConfig::default();
        assert_eq!(cfg.max_concurrent_sources, 3);
        assert_eq!(cfg.cycle_interval_minutes, 60);
    }

    #[test]
    fn unknown_source_falls_back_to_default_config() {
        let cfg = PipelineConfig::default();
        let source_cfg = cfg.source_config("nvd");
        assert!(source_cfg.enabled);
    }
}
