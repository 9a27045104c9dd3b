//! Host configuration management

use crate::retry::RetryPolicy;
use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// System-wide configuration file, consulted after the per-user one
const SYSTEM_CONFIG_PATH: &str = "/etc/adb-usb-host/host.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HostConfig {
    #[serde(default)]
    pub general: GeneralSettings,
    #[serde(default)]
    pub usb: UsbSettings,
    #[serde(default)]
    pub auth: AuthSettings,
    #[serde(default)]
    pub retry: RetrySettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralSettings {
    #[serde(default = "GeneralSettings::default_log_level")]
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            log_level: Self::default_log_level(),
        }
    }
}

impl GeneralSettings {
    fn default_log_level() -> String {
        "info".to_string()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UsbSettings {
    /// Per-transfer timeout in milliseconds (0 = wait forever)
    #[serde(default)]
    pub transfer_timeout_ms: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthSettings {
    /// Private key used to sign AUTH tokens
    /// If None, uses the ADB default: ~/.android/adbkey
    #[serde(default)]
    pub key_path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrySettings {
    /// Handshake attempts per device, including the first
    #[serde(default = "RetrySettings::default_max_attempts")]
    pub max_attempts: u32,
    /// Delay before the second attempt, doubled after each failure
    #[serde(default = "RetrySettings::default_backoff_ms")]
    pub backoff_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: Self::default_max_attempts(),
            backoff_ms: Self::default_backoff_ms(),
        }
    }
}

impl RetrySettings {
    fn default_max_attempts() -> u32 {
        1
    }

    fn default_backoff_ms() -> u64 {
        500
    }
}

impl HostConfig {
    /// Load configuration from `path`, or from the first standard location
    /// that exists
    pub fn load(path: Option<PathBuf>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p,
            None => find_existing(&Self::search_paths())
                .ok_or_else(|| anyhow!("No configuration file found, using defaults"))?,
        };

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

        let config: HostConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", config_path.display()))?;

        config.validate()?;

        tracing::info!("Loaded configuration from: {}", config_path.display());
        Ok(config)
    }

    /// Load configuration or return defaults if not found
    pub fn load_or_default() -> Self {
        Self::load_first_or_default(&Self::search_paths())
    }

    /// Load the first of `candidates` that exists, or return defaults
    ///
    /// A file that exists but cannot be read, parsed or validated is
    /// reported and replaced by defaults.
    pub fn load_first_or_default(candidates: &[PathBuf]) -> Self {
        let Some(path) = find_existing(candidates) else {
            tracing::debug!("No configuration file found, using defaults");
            return Self::default();
        };

        match Self::load(Some(path)) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("Ignoring configuration, using defaults: {:#}", e);
                Self::default()
            }
        }
    }

    /// Standard locations, most specific first
    fn search_paths() -> Vec<PathBuf> {
        vec![Self::default_path(), PathBuf::from(SYSTEM_CONFIG_PATH)]
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
            config_dir.join("adb-usb-host").join("host.toml")
        } else {
            PathBuf::from(".config/adb-usb-host/host.toml")
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.general.log_level.as_str()) {
            return Err(anyhow!(
                "Invalid log level '{}', must be one of: {}",
                self.general.log_level,
                valid_levels.join(", ")
            ));
        }

        if self.retry.max_attempts == 0 {
            return Err(anyhow!("retry.max_attempts must be at least 1"));
        }

        if let Some(key_path) = &self.auth.key_path
            && key_path.trim().is_empty()
        {
            return Err(anyhow!("auth.key_path must not be empty"));
        }

        Ok(())
    }

    /// Private key location, tilde expanded
    pub fn key_path(&self) -> Result<PathBuf> {
        match &self.auth.key_path {
            Some(path) => Ok(PathBuf::from(shellexpand::tilde(path).as_ref())),
            None => common::default_adb_key_path().context("No ADB key path configured"),
        }
    }

    /// Per-transfer timeout; zero means wait forever
    pub fn transfer_timeout(&self) -> Duration {
        Duration::from_millis(self.usb.transfer_timeout_ms)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.retry.max_attempts,
            Duration::from_millis(self.retry.backoff_ms),
        )
    }
}

fn find_existing(candidates: &[PathBuf]) -> Option<PathBuf> {
    candidates.iter().find(|p| p.exists()).cloned()
}
