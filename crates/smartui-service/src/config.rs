//! Service configuration
//!
//! Layered: built-in defaults, then an optional TOML file (`SMARTUI_CONFIG`
//! or `smartui.toml`), then `SMARTUI__SECTION__KEY` environment variables.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use smartui_analyzer::AnalyzerConfig;
use smartui_common::SmartUiError;
use smartui_decision::DecisionConfig;

/// Config file used when `SMARTUI_CONFIG` is unset
pub const DEFAULT_CONFIG_FILE: &str = "smartui.toml";

/// Top-level service configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub analyzer: AnalyzerConfig,
    pub decision: DecisionConfig,
    pub service: ServiceSettings,
}

/// Settings of the facade itself
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceSettings {
    /// Recent interactions copied into each decision context
    pub history_slice: usize,
    /// Seconds between maintenance sweeps
    pub maintenance_interval_secs: u64,
    /// Record every handled command as an interaction
    pub record_commands: bool,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            history_slice: 50,
            maintenance_interval_secs: 60,
            record_commands: true,
        }
    }
}

impl ServiceConfig {
    /// Load `.env`, the config file and the environment
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let path = std::env::var("SMARTUI_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
        let config: Self = config::Config::builder()
            .add_source(config::File::with_name(&path).required(false))
            .add_source(
                config::Environment::with_prefix("SMARTUI")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .with_context(|| format!("failed to read configuration from {}", path))?
            .try_deserialize()
            .context("invalid configuration")?;

        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML document on top of the defaults
    pub fn from_toml(source: &str) -> Result<Self> {
        let config: Self = config::Config::builder()
            .add_source(config::File::from_str(source, config::FileFormat::Toml))
            .build()?
            .try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), SmartUiError> {
        self.analyzer.validate()?;
        self.decision.validate()?;
        if self.service.maintenance_interval_secs == 0 {
            return Err(SmartUiError::Config(
                "service.maintenance_interval_secs must be > 0".into(),
            ));
        }
        Ok(())
    }
}
