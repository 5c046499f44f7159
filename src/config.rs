//! Configuration management for supportflow.
//!
//! Handles loading and saving configuration from TOML files.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Draft storage settings
    pub storage: StorageConfig,

    /// Text-generation collaborator settings
    pub ai: AiConfig,

    /// Submission collaborator settings
    pub submission: SubmissionConfig,
}

/// Draft storage settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Where the draft snapshot lives; defaults to `~/.supportflow/draft.json`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

/// Text-generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    /// Model to use
    pub model: String,

    /// API base URL
    pub base_url: String,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            model: "gpt-3.5-turbo".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
        }
    }
}

/// Submission backend settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SubmissionConfig {
    /// API base URL
    pub base_url: String,
}

impl Default for SubmissionConfig {
    fn default() -> Self {
        Self { base_url: "http://localhost:3001/api".to_string() }
    }
}

impl Config {
    /// Load configuration from the default location.
    ///
    /// Looks for config in:
    /// 1. `.supportflow.toml` in current directory
    /// 2. `~/.config/supportflow/config.toml`
    /// 3. Falls back to defaults
    pub fn load() -> anyhow::Result<Self> {
        let local_config = PathBuf::from(".supportflow.toml");
        if local_config.exists() {
            return Self::load_from_file(&local_config);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let global_config = config_dir.join("supportflow").join("config.toml");
            if global_config.exists() {
                return Self::load_from_file(&global_config);
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file.
    pub fn load_from_file(path: &PathBuf) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to the global config file.
    pub fn save(&self) -> anyhow::Result<()> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;

        let app_dir = config_dir.join("supportflow");
        std::fs::create_dir_all(&app_dir)?;

        let config_path = app_dir.join("config.toml");
        let content = toml::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;

        Ok(())
    }

    /// Get the config directory path.
    pub fn config_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("supportflow"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.ai.model, "gpt-3.5-turbo");
        assert!(config.ai.base_url.contains("api.openai.com"));
        assert!(config.storage.path.is_none());
    }

    #[test]
    fn test_load_from_file_with_partial_sections() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[submission]\nbase_url = \"https://gov.example/api\"\n").unwrap();

        let config = Config::load_from_file(&path).unwrap();
        assert_eq!(config.submission.base_url, "https://gov.example/api");
        // untouched sections keep their defaults
        assert_eq!(config.ai.model, "gpt-3.5-turbo");
    }

    #[test]
    fn test_round_trip() {
        let mut config = Config::default();
        config.storage.path = Some(PathBuf::from("/tmp/draft.json"));

        let text = toml::to_string_pretty(&config).unwrap();
        let back: Config = toml::from_str(&text).unwrap();
        assert_eq!(back.storage.path, config.storage.path);
    }
}
