//! Configuration management: defaults, validation, loading from DB + environment.

pub mod app_config;
pub mod defaults;
pub mod manager;
pub mod preferences;
pub mod validation;

pub use app_config::AppConfig;
pub use manager::SettingsManager;
pub use preferences::Preferences;

use serde::{Deserialize, Serialize};

/// Setting type: normal or secret (masked in API responses).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SettingType {
    Normal,
    Secret,
}

impl SettingType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Secret => "secret",
        }
    }
}

/// A setting as returned to the frontend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettingInfo {
    pub key: String,
    pub value: String,
    #[serde(rename = "type")]
    pub setting_type: SettingType,
    pub required: bool,
    pub description: String,
    pub has_value: bool,
}

/// Push setup status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureStatus {
    pub push_registered: bool,
    pub distributor_selected: bool,
    pub style_chosen: bool,
    pub missing_settings: Vec<String>,
    pub warnings: Vec<String>,
}
