//! Configuration management

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use crate::application::errors::ConfigError;
use crate::domain::traits::SessionSettings;

/// Bot configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    #[serde(rename = "BibleBot")]
    pub bot: BotConfig,
    pub meta: MetaConfig,
    #[serde(default)]
    pub discord: DiscordConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct BotConfig {
    pub token: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct MetaConfig {
    pub version: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct DiscordConfig {
    /// Route REST calls through this base URL instead of https://discord.com
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxy: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bot: BotConfig {
                token: String::new(),
            },
            meta: MetaConfig {
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            discord: DiscordConfig::default(),
        }
    }
}

impl Config {
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path)
            .map_err(|e| ConfigError::Parse(format!("Failed to read {}: {}", path.display(), e)))?;

        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_yaml::from_str(content)
            .map_err(|e| ConfigError::Parse(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.meta.version.trim().is_empty() {
            return Err(ConfigError::MissingField("meta.version".to_string()));
        }
        if let Some(proxy) = &self.discord.proxy {
            if !proxy.starts_with("http://") && !proxy.starts_with("https://") {
                return Err(ConfigError::InvalidValue(format!(
                    "discord.proxy must be an http(s) URL, got {}",
                    proxy
                )));
            }
        }
        Ok(())
    }

    /// Settings handed to the platform connector
    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings::new(self.bot.token.clone()).with_api_proxy(self.discord.proxy.clone())
    }

    /// Replace the configured token, e.g. from the command line
    pub fn with_token(mut self, token: Option<String>) -> Self {
        if let Some(token) = token {
            self.bot.token = token;
        }
        self
    }

    /// Write a default config file, refusing to overwrite an existing one
    pub fn write_default(path: &Path) -> Result<(), ConfigError> {
        if path.exists() {
            return Err(ConfigError::InvalidValue(format!("{} already exists", path.display())));
        }

        let content = serde_yaml::to_string(&Config::default())
            .map_err(|e| ConfigError::Parse(e.to_string()))?;
        std::fs::write(path, content)
            .map_err(|e| ConfigError::Parse(format!("Failed to write {}: {}", path.display(), e)))
    }
}
