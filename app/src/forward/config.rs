//! notiforward configuration file.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::ForwardError;

pub const DEFAULT_APP_MATCH: &str = "dev.vencord.Vesktop";

/// Request body sent to the push endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    /// The notification text as `text/plain`.
    #[default]
    Text,
    /// `{"title", "content"}` as `application/json`.
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForwardConfig {
    pub endpoint: String,
    #[serde(default)]
    pub logging: bool,
    #[serde(default = "default_app_match")]
    pub app_match: String,
    #[serde(default)]
    pub format: Format,
}

fn default_app_match() -> String {
    DEFAULT_APP_MATCH.to_string()
}

impl ForwardConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            logging: false,
            app_match: default_app_match(),
            format: Format::Text,
        }
    }

    /// `~/.config/notiforward/config.json`
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .or_else(|| dirs::home_dir().map(|h| h.join(".config")))
            .unwrap_or_else(|| PathBuf::from("."))
            .join("notiforward")
            .join("config.json")
    }

    pub fn validate(&self) -> Result<(), ForwardError> {
        let url = reqwest::Url::parse(self.endpoint.trim())
            .map_err(|e| ForwardError::InvalidEndpoint(format!("{}: {e}", self.endpoint)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ForwardError::InvalidEndpoint(format!(
                "{}: scheme must be http or https",
                self.endpoint
            )));
        }
        if self.app_match.trim().is_empty() {
            return Err(ForwardError::InvalidConfig("app_match must not be empty".into()));
        }
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self, ForwardError> {
        let raw = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<(), ForwardError> {
        self.validate()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

/// Delete the config file. Returns whether one existed.
pub fn reset(path: &Path) -> Result<bool, ForwardError> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e.into()),
    }
}
