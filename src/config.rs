//! Configuration Management
//!
//! Persistent configuration storage for awscope.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// User configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Last used profile
    #[serde(default)]
    pub profile: Option<String>,
    /// Last used region
    #[serde(default)]
    pub region: Option<String>,
    /// Last viewed resource (service/resource key)
    #[serde(default)]
    pub last_resource: Option<String>,
}

impl Config {
    fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("awscope").join("config.json"))
    }

    /// Load configuration from disk
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            return Self::default();
        };

        if !path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_default(),
            Err(_) => Self::default(),
        }
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<()> {
        let Some(path) = Self::config_path() else {
            return Ok(());
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, content)?;

        Ok(())
    }

    /// Remember the current view and save
    pub fn set_last_resource(&mut self, key: &str) -> Result<()> {
        self.last_resource = Some(key.to_string());
        self.save()
    }

    /// Remember the session profile/region and save
    pub fn set_session(&mut self, profile: Option<&str>, region: &str) -> Result<()> {
        self.profile = profile.map(str::to_string);
        self.region = Some(region.to_string());
        self.save()
    }
}
