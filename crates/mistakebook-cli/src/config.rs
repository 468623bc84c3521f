//! Configuration management for the CLI.

use crate::error::{CliError, Result};
use mistakebook_sdk::DEFAULT_BASE_URL;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// CLI configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Active profile name
    #[serde(default = "default_profile")]
    pub active_profile: String,

    /// Available profiles
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,

    /// Global settings
    #[serde(default)]
    pub settings: Settings,

    /// File this config was loaded from; `save` writes back there
    #[serde(skip)]
    source: Option<PathBuf>,
}

/// Backend profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    /// Backend URL
    pub api_base_url: String,

    /// Default subject filter
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
}

/// Global CLI settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Enable colored output
    #[serde(default = "default_true")]
    pub color: bool,

    /// Default output format
    #[serde(default = "default_format")]
    pub format: OutputFormat,

    /// Rows per error-book page
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Table format
    Table,
    /// JSON format
    Json,
    /// Quiet (minimal) format
    Quiet,
}

impl Config {
    /// Get the default configuration file path.
    pub fn path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| CliError::Config("Could not find home directory".into()))?;
        Ok(home.join(".mistakebook").join("config.toml"))
    }

    /// Load configuration from the default path, or defaults if it does not exist.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::path()?)
    }

    /// Load configuration from `path`, or defaults if it does not exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let contents = fs::read_to_string(path)?;
            toml::from_str::<Config>(&contents)?
        } else {
            Self::default()
        };
        config.source = Some(path.to_path_buf());
        Ok(config)
    }

    /// File this configuration was loaded from, if any.
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// Save configuration to the file it was loaded from.
    pub fn save(&self) -> Result<()> {
        let path = match &self.source {
            Some(path) => path.clone(),
            None => Self::path()?,
        };

        // Create parent directory if it doesn't exist
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| CliError::Config(format!("Failed to serialize config: {}", e)))?;
        fs::write(&path, contents)?;
        Ok(())
    }

    /// Get the active profile.
    pub fn get_active_profile(&self) -> Result<&Profile> {
        self.profiles
            .get(&self.active_profile)
            .ok_or_else(|| CliError::Config(format!("Profile '{}' not found", self.active_profile)))
    }

    /// Add or update a profile.
    pub fn set_profile(&mut self, name: String, profile: Profile) {
        self.profiles.insert(name, profile);
    }

    /// Switch to a different profile.
    pub fn switch_profile(&mut self, name: String) -> Result<()> {
        if !self.profiles.contains_key(&name) {
            return Err(CliError::Config(format!("Profile '{}' does not exist", name)));
        }
        self.active_profile = name;
        Ok(())
    }

    /// Subject filter of the active profile, if any.
    pub fn default_subject(&self) -> Option<&str> {
        self.get_active_profile()
            .ok()
            .and_then(|profile| profile.subject.as_deref())
    }

    /// Backend URL: explicit flag, then environment, then the active profile.
    pub fn resolve_base_url(&self, flag: Option<&str>) -> String {
        pick_base_url(
            flag,
            mistakebook_sdk::env_base_url().as_deref(),
            self.get_active_profile().ok(),
        )
    }
}

fn pick_base_url(flag: Option<&str>, env: Option<&str>, profile: Option<&Profile>) -> String {
    flag.map(str::trim)
        .filter(|url| !url.is_empty())
        .or(env)
        .or_else(|| profile.map(|p| p.api_base_url.as_str()))
        .unwrap_or(DEFAULT_BASE_URL)
        .to_string()
}

impl Default for Config {
    fn default() -> Self {
        let mut profiles = HashMap::new();
        profiles.insert(
            "default".to_string(),
            Profile {
                api_base_url: DEFAULT_BASE_URL.to_string(),
                subject: None,
            },
        );

        Self {
            active_profile: "default".to_string(),
            profiles,
            settings: Settings::default(),
            source: None,
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            color: true,
            format: OutputFormat::Table,
            page_size: default_page_size(),
        }
    }
}

fn default_profile() -> String {
    "default".to_string()
}

fn default_true() -> bool {
    true
}

fn default_format() -> OutputFormat {
    OutputFormat::Table
}

fn default_page_size() -> usize {
    20
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.active_profile, "default");
        assert!(config.profiles.contains_key("default"));
        assert!(config.settings.color);
        assert_eq!(config.settings.page_size, 20);
    }

    #[test]
    fn test_profile_management() {
        let mut config = Config::default();

        let profile = Profile {
            api_base_url: "http://school.example:8001".to_string(),
            subject: Some("数学".to_string()),
        };

        config.set_profile("school".to_string(), profile);
        assert!(config.profiles.contains_key("school"));

        config.switch_profile("school".to_string()).unwrap();
        assert_eq!(config.active_profile, "school");
        assert_eq!(
            config.get_active_profile().unwrap().subject.as_deref(),
            Some("数学")
        );
    }

    #[test]
    fn test_switch_to_nonexistent_profile() {
        let mut config = Config::default();
        let result = config.switch_profile("nonexistent".to_string());
        assert!(result.is_err());
    }

    #[test]
    fn test_base_url_precedence() {
        let profile = Profile {
            api_base_url: "http://profile".to_string(),
            subject: None,
        };
        assert_eq!(pick_base_url(Some("http://flag"), Some("http://env"), Some(&profile)), "http://flag");
        assert_eq!(pick_base_url(Some("  "), Some("http://env"), Some(&profile)), "http://env");
        assert_eq!(pick_base_url(None, None, Some(&profile)), "http://profile");
        assert_eq!(pick_base_url(None, None, None), DEFAULT_BASE_URL);
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::load_from(&path).unwrap();
        config.settings.page_size = 50;
        config.set_profile(
            "remote".to_string(),
            Profile {
                api_base_url: "http://remote:8001".to_string(),
                subject: None,
            },
        );
        config.save().unwrap();

        let reloaded = Config::load_from(&path).unwrap();
        assert_eq!(reloaded.settings.page_size, 50);
        assert_eq!(reloaded.profiles["remote"].api_base_url, "http://remote:8001");
    }

    #[test]
    fn test_partial_file_gets_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[settings]\ncolor = false\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert!(!config.settings.color);
        assert_eq!(config.settings.format, OutputFormat::Table);
        assert_eq!(config.active_profile, "default");
        assert!(config.profiles.is_empty());
    }
}
