//! Leadflow process configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Root configuration, loaded from `~/.leadflow/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeadflowConfig {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub automation: AutomationConfig,
    #[serde(default)]
    pub sender: SenderConfig,
}

impl Default for LeadflowConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig::default(),
            gateway: GatewayConfig::default(),
            automation: AutomationConfig::default(),
            sender: SenderConfig::default(),
        }
    }
}

impl LeadflowConfig {
    /// Load config from the default path, or defaults if absent.
    pub fn load() -> Result<Self> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load config from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            crate::error::LeadflowError::Config(format!("Failed to read config: {e}"))
        })?;
        let config: Self = toml::from_str(&content).map_err(|e| {
            crate::error::LeadflowError::Config(format!("Failed to parse config: {e}"))
        })?;
        Ok(config)
    }

    /// Save config to the default path.
    pub fn save(&self) -> Result<()> {
        let path = Self::default_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self).map_err(|e| {
            crate::error::LeadflowError::Config(format!("Failed to serialize config: {e}"))
        })?;
        std::fs::write(&path, content)?;
        Ok(())
    }

    /// Get the default config path.
    pub fn default_path() -> PathBuf {
        Self::home_dir().join("config.toml")
    }

    /// Get the Leadflow home directory.
    pub fn home_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".leadflow")
    }
}

/// SQLite database location.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: String,
}

fn default_db_path() -> String {
    "~/.leadflow/leadflow.db".into()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

/// HTTP gateway configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".into()
}
fn default_port() -> u16 {
    4600
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Automation engine tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutomationConfig {
    /// Cross-cycle retry cap; reaching it halts the lead.
    #[serde(default = "default_retry_cap")]
    pub retry_cap: u32,
    /// Minutes to wait before re-attempting a failed send.
    #[serde(default = "default_failure_backoff_mins")]
    pub failure_backoff_mins: i64,
    /// How often the runner scans for due leads.
    #[serde(default = "default_tick_interval_secs")]
    pub tick_interval_secs: u64,
}

fn default_retry_cap() -> u32 {
    crate::lead::DEFAULT_RETRY_CAP
}
fn default_failure_backoff_mins() -> i64 {
    10
}
fn default_tick_interval_secs() -> u64 {
    60
}

impl Default for AutomationConfig {
    fn default() -> Self {
        Self {
            retry_cap: default_retry_cap(),
            failure_backoff_mins: default_failure_backoff_mins(),
            tick_interval_secs: default_tick_interval_secs(),
        }
    }
}

/// Process-wide sender identity, used when a user's company settings leave
/// the sender blank.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SenderConfig {
    #[serde(default = "default_sender_name")]
    pub name: String,
    #[serde(default)]
    pub email: String,
}

fn default_sender_name() -> String {
    "Leadflow".into()
}

impl Default for SenderConfig {
    fn default() -> Self {
        Self {
            name: default_sender_name(),
            email: String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = LeadflowConfig::default();
        assert_eq!(config.gateway.port, 4600);
        assert_eq!(config.automation.retry_cap, 10);
        assert_eq!(config.automation.failure_backoff_mins, 10);
        assert_eq!(config.sender.name, "Leadflow");
    }

    #[test]
    fn test_config_from_toml() {
        let toml_str = r#"
            [gateway]
            port = 8080

            [automation]
            retry_cap = 5
            tick_interval_secs = 30

            [sender]
            name = "Acme Outreach"
            email = "hello@acme.example"
        "#;

        let config: LeadflowConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.gateway.port, 8080);
        assert_eq!(config.gateway.host, "127.0.0.1");
        assert_eq!(config.automation.retry_cap, 5);
        assert_eq!(config.automation.tick_interval_secs, 30);
        assert_eq!(config.sender.name, "Acme Outreach");
    }

    #[test]
    fn test_config_missing_fields_use_defaults() {
        let config: LeadflowConfig = toml::from_str("").unwrap();
        assert_eq!(config.gateway.port, 4600);
        assert_eq!(config.automation.tick_interval_secs, 60);
    }

    #[test]
    fn test_home_dir() {
        let home = LeadflowConfig::home_dir();
        assert!(home.to_string_lossy().contains("leadflow"));
    }
}
