use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

use super::StatsConfig;
use crate::error::{Result, StatsError};

/// Values given on the command line; they win over file and environment
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub proposals: Option<PathBuf>,
    pub opportunities: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub threads: Option<usize>,
    pub include_deleted: bool,
}

impl ConfigOverrides {
    pub fn apply(&self, config: &mut StatsConfig) {
        if let Some(path) = &self.proposals {
            config.input.proposals = path.clone();
        }
        if let Some(path) = &self.opportunities {
            config.input.opportunities = path.clone();
        }
        if let Some(path) = &self.output {
            config.output.path = path.clone();
        }
        if let Some(threads) = self.threads {
            config.threads = Some(threads);
        }
        if self.include_deleted {
            config.include_deleted = true;
        }
    }
}

/// Build the effective configuration: defaults, then the TOML file (if
/// given), then environment variables, then command-line overrides.
pub async fn load_config(path: Option<&Path>, overrides: &ConfigOverrides) -> Result<StatsConfig> {
    let mut config = match path {
        Some(path) => {
            let content = fs::read_to_string(path).await.map_err(|e| {
                StatsError::Config(format!("Cannot read {}: {}", path.display(), e))
            })?;
            debug!("Loaded configuration from {}", path.display());
            toml::from_str::<StatsConfig>(&content)?
        }
        None => StatsConfig::new(),
    };

    config.merge_env_vars();
    overrides.apply(&mut config);
    config.validate().into_result().map_err(|errors| {
        StatsError::Config(format!(
            "Configuration validation failed:\n{}",
            errors
                .iter()
                .map(|e| format!("  - {}", e))
                .collect::<Vec<_>>()
                .join("\n")
        ))
    })?;

    Ok(config)
}
