//! Panel configuration management

use anyhow::{Context, Result, anyhow};
use backend::WorkerConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PanelConfig {
    pub panel: PanelSettings,
    pub hid: HidSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PanelSettings {
    pub log_level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HidSettings {
    /// Hide interfaces on usage page 0x0001 (system-claimed input
    /// interfaces). If unset, enabled on macOS only.
    #[serde(default)]
    pub filter_system_interfaces: Option<bool>,
    /// Timeout for the response read after a command write
    #[serde(default = "default_response_timeout_ms")]
    pub response_timeout_ms: i32,
    /// Timeout for each listener poll read
    #[serde(default = "default_read_timeout_ms")]
    pub read_timeout_ms: i32,
}

fn default_response_timeout_ms() -> i32 {
    1000
}

fn default_read_timeout_ms() -> i32 {
    100
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            panel: PanelSettings {
                log_level: "info".to_string(),
            },
            hid: HidSettings {
                filter_system_interfaces: None,
                response_timeout_ms: default_response_timeout_ms(),
                read_timeout_ms: default_read_timeout_ms(),
            },
        }
    }
}

impl PanelConfig {
    /// Load configuration from the specified path
    pub fn load(path: Option<PathBuf>) -> Result<Self> {
        let config_path = if let Some(p) = path {
            p
        } else {
            let candidates = vec![
                Self::default_path(),
                PathBuf::from("/etc/hidpanel/config.toml"),
            ];

            candidates
                .into_iter()
                .find(|p| p.exists())
                .ok_or_else(|| anyhow!("No configuration file found, using defaults"))?
        };

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

        let config: PanelConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", config_path.display()))?;

        config.validate()?;

        tracing::info!("Loaded configuration from: {}", config_path.display());
        Ok(config)
    }

    /// Load configuration or return defaults if not found
    pub fn load_or_default() -> Self {
        match Self::load(None) {
            Ok(config) => config,
            Err(e) => {
                // Print to stderr since logging might not be initialized yet
                eprintln!("Config: {}", e);
                Self::default()
            }
        }
    }

    /// Save configuration to the specified path
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize configuration")?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        tracing::info!("Saved configuration to: {}", path.display());
        Ok(())
    }

    /// Get the default configuration file path
    pub fn default_path() -> PathBuf {
        if let Some(config_dir) = dirs::config_dir() {
            config_dir.join("hidpanel").join("config.toml")
        } else {
            PathBuf::from(".config/hidpanel/config.toml")
        }
    }

    /// Build the backend worker configuration
    pub fn worker_config(&self) -> WorkerConfig {
        let defaults = WorkerConfig::default();
        WorkerConfig {
            filter_system_interfaces: self
                .hid
                .filter_system_interfaces
                .unwrap_or(defaults.filter_system_interfaces),
            response_timeout_ms: self.hid.response_timeout_ms,
            read_timeout_ms: self.hid.read_timeout_ms,
        }
    }

    /// Validate configuration values
    fn validate(&self) -> Result<()> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.panel.log_level.as_str()) {
            return Err(anyhow!(
                "Invalid log level '{}', must be one of: {}",
                self.panel.log_level,
                valid_levels.join(", ")
            ));
        }

        if self.hid.response_timeout_ms <= 0 {
            return Err(anyhow!(
                "response_timeout_ms must be positive, got {}",
                self.hid.response_timeout_ms
            ));
        }
        if self.hid.read_timeout_ms <= 0 {
            return Err(anyhow!(
                "read_timeout_ms must be positive, got {}",
                self.hid.read_timeout_ms
            ));
        }

        Ok(())
    }
}
