//! Configuration management for framepull.
//!
//! Credentials for the RTC engine plus harness defaults, stored as TOML in
//! the user's configuration directory. All values are static for the
//! lifetime of the process once loaded.

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use dirs::config_dir;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{APP_NAME, LogLevel, PullOptions};

/// Harness configuration.
///
/// The credential fields are consumed by the external RTC engine, not
/// interpreted by this code; they ship empty and are filled in by the
/// operator.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// RTC application id
    #[serde(default)]
    pub app_id: String,

    /// RTC join token
    #[serde(default)]
    pub token: String,

    /// Channel to join
    #[serde(default = "default_channel_id")]
    pub channel_id: String,

    /// Numeric user id
    #[serde(default = "default_user_id")]
    pub user_id: u32,

    /// App certificate for token generation
    #[serde(default)]
    pub certificate: String,

    /// Threshold for the async logger
    #[serde(default)]
    pub log_level: LogLevel,

    /// Where WAV captures land (system temp dir when unset)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<PathBuf>,

    /// How long the harness binary pulls before stopping, in seconds.
    /// Unset means run until interrupted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_secs: Option<u64>,

    /// Default session parameters for the harness binary.
    /// Kept last so the TOML table serializes after the scalar fields.
    #[serde(default)]
    pub pull: PullOptions,
}

fn default_channel_id() -> String {
    "zzz100".to_string()
}

fn default_user_id() -> u32 {
    652_313
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app_id: String::new(),
            token: String::new(),
            channel_id: default_channel_id(),
            user_id: default_user_id(),
            certificate: String::new(),
            log_level: LogLevel::default(),
            output_dir: None,
            run_secs: None,
            pull: PullOptions::default(),
        }
    }
}

impl Config {
    /// Whether the RTC credentials still need to be filled in by the
    /// operator.
    pub fn credentials_missing(&self) -> bool {
        self.app_id.is_empty()
    }

    /// Directory WAV captures are written to.
    pub fn output_dir(&self) -> PathBuf {
        self.output_dir
            .clone()
            .unwrap_or_else(std::env::temp_dir)
    }

    /// How long the harness binary should pull before stopping.
    pub fn run_duration(&self) -> Option<Duration> {
        self.run_secs.map(Duration::from_secs)
    }
}

/// Manages loading and saving configuration files.
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Creates a new ConfigManager with the default configuration directory.
    pub fn new() -> Result<Self> {
        let config_path = Self::default_config_path()?;
        Ok(Self { config_path })
    }

    /// Creates a new ConfigManager with a specified configuration directory.
    #[cfg(test)]
    pub fn with_config_dir<P: AsRef<std::path::Path>>(dir: P) -> Self {
        let config_path = dir.as_ref().join(format!("{}.toml", APP_NAME));
        Self { config_path }
    }

    /// Returns the default path to the configuration file.
    pub fn default_config_path() -> Result<PathBuf> {
        let config_dir = config_dir().context("Failed to retrieve configuration directory")?;
        Ok(config_dir.join(APP_NAME).join(format!("{}.toml", APP_NAME)))
    }

    /// Loads the configuration from the config file or returns default.
    pub fn load(&self) -> Result<Config> {
        let config = if self.config_path.exists() {
            let config_content = fs::read_to_string(&self.config_path)
                .with_context(|| format!("Failed to read config file at {:?}", self.config_path))?;

            toml::from_str(&config_content)
                .with_context(|| format!("Failed to parse config file at {:?}", self.config_path))?
        } else {
            Config::default()
        };

        // Default configs have no app id either, so this fires on first run
        // as well as on an unconfigured file.
        if config.credentials_missing() {
            warn!(
                "RTC app id is not set. The harness will run against the built-in \
                 tone engine only until it is configured."
            );
        }

        Ok(config)
    }

    /// Saves the configuration to the config file.
    pub fn save(&self, config: &Config) -> Result<()> {
        let config_dir = self
            .config_path
            .parent()
            .with_context(|| format!("Failed to get parent directory of {:?}", self.config_path))?;

        fs::create_dir_all(config_dir)
            .with_context(|| format!("Failed to create config directory at {:?}", config_dir))?;

        let serialized =
            toml::to_string_pretty(&config).context("Failed to serialize configuration")?;

        fs::write(&self.config_path, serialized)
            .with_context(|| format!("Failed to write config file at {:?}", self.config_path))?;

        Ok(())
    }

    /// Returns the path to the configuration file.
    pub fn config_path(&self) -> &std::path::Path {
        &self.config_path
    }
}
