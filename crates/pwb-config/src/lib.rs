//! Configuration management for the pwb workbench
//!
//! The config lives as a TOML file under the user's config directory and can
//! be relocated with the `PWB_CONFIG` environment variable (used by tests and
//! isolated runs). Every field is optional; typed accessors supply platform
//! defaults so a fresh install works with no config file at all.

use pwb_contrib::ConfigView;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while reading or writing the config file
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Unknown config key: {0}")]
    UnknownKey(String),
}

/// Workbench configuration, persisted as `pwb.toml`
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct WorkbenchConfig {
    /// Root directory scanned for contrib features
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contrib_dir: Option<String>,
    /// JSONL file feature runs are appended to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub history_path: Option<String>,
    /// Environment variable holding the provider API key
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,
    /// Default LLM provider name handed to credential-requiring features
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_provider: Option<String>,
    /// External command completions are piped through (stdin prompt, stdout reply)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub llm_command: Option<String>,
}

impl WorkbenchConfig {
    /// Resolve the config file location.
    ///
    /// `PWB_CONFIG`, when set and non-empty, wins; otherwise the platform
    /// config directory is used.
    pub fn path() -> PathBuf {
        if let Ok(env_path) = std::env::var("PWB_CONFIG") {
            let trimmed = env_path.trim();
            if !trimmed.is_empty() {
                return PathBuf::from(trimmed);
            }
        }

        Self::config_dir().join("pwb.toml")
    }

    /// Platform config directory for pwb
    pub fn config_dir() -> PathBuf {
        #[cfg(not(target_os = "windows"))]
        {
            dirs::home_dir().map_or_else(
                || PathBuf::from(".config/pwb"),
                |home| home.join(".config").join("pwb"),
            )
        }

        #[cfg(target_os = "windows")]
        {
            dirs::config_dir().map_or_else(|| PathBuf::from("pwb"), |dir| dir.join("pwb"))
        }
    }

    /// Load from the resolved path, falling back to defaults when absent
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::path();
        if path.exists() {
            let content = fs::read_to_string(&path)?;
            Ok(toml::from_str(&content)?)
        } else {
            Ok(WorkbenchConfig::default())
        }
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        let path = Self::path();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(&path, content)?;
        Ok(())
    }

    /// Contrib root, defaulting to `<config dir>/contrib`
    pub fn contrib_root(&self) -> PathBuf {
        self.contrib_dir
            .as_ref()
            .map_or_else(|| Self::config_dir().join("contrib"), PathBuf::from)
    }

    /// History file, defaulting to `<config dir>/history.jsonl`
    pub fn history_file(&self) -> PathBuf {
        self.history_path
            .as_ref()
            .map_or_else(|| Self::config_dir().join("history.jsonl"), PathBuf::from)
    }

    pub fn get(&self, key: &str) -> Option<String> {
        match key {
            "contrib-dir" => self.contrib_dir.clone(),
            "history-path" => self.history_path.clone(),
            "api-key-env" => self.api_key_env.clone(),
            "default-provider" => self.default_provider.clone(),
            "llm-command" => self.llm_command.clone(),
            _ => None,
        }
    }

    pub fn set(&mut self, key: &str, value: String) -> Result<(), ConfigError> {
        match key {
            "contrib-dir" => self.contrib_dir = Some(value),
            "history-path" => self.history_path = Some(value),
            "api-key-env" => self.api_key_env = Some(value),
            "default-provider" => self.default_provider = Some(value),
            "llm-command" => self.llm_command = Some(value),
            _ => return Err(ConfigError::UnknownKey(key.to_string())),
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.contrib_dir.is_none()
            && self.history_path.is_none()
            && self.api_key_env.is_none()
            && self.default_provider.is_none()
            && self.llm_command.is_none()
    }

    /// Set keys with their values, for `config show`
    pub fn values_iter(&self) -> Vec<(&str, String)> {
        let mut values = Vec::new();
        if let Some(ref val) = self.contrib_dir {
            values.push(("contrib-dir", val.clone()));
        }
        if let Some(ref val) = self.history_path {
            values.push(("history-path", val.clone()));
        }
        if let Some(ref val) = self.api_key_env {
            values.push(("api-key-env", val.clone()));
        }
        if let Some(ref val) = self.default_provider {
            values.push(("default-provider", val.clone()));
        }
        if let Some(ref val) = self.llm_command {
            values.push(("llm-command", val.clone()));
        }
        values
    }
}

/// Features see the config only through this read-only view.
///
/// Keys the config file does not know (feature-specific ones like
/// `optimizer-input`) fall back to the environment as `PWB_<KEY>` with
/// dashes mapped to underscores.
impl ConfigView for WorkbenchConfig {
    fn get(&self, key: &str) -> Option<String> {
        WorkbenchConfig::get(self, key).or_else(|| {
            let env_key = format!("PWB_{}", key.replace('-', "_").to_ascii_uppercase());
            std::env::var(env_key).ok().filter(|value| !value.is_empty())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_unset() {
        let config = WorkbenchConfig::default();
        assert!(config.is_empty());
        assert!(config.contrib_root().ends_with("contrib"));
        assert!(config.history_file().ends_with("history.jsonl"));
    }

    #[test]
    fn test_set_and_get_round_trip() {
        let mut config = WorkbenchConfig::default();
        assert!(config.set("contrib-dir", "/tmp/contrib".to_string()).is_ok());
        assert_eq!(config.get("contrib-dir").as_deref(), Some("/tmp/contrib"));
        assert_eq!(config.contrib_root(), PathBuf::from("/tmp/contrib"));
        assert!(matches!(
            config.set("no-such-key", "x".to_string()),
            Err(ConfigError::UnknownKey(_))
        ));
    }

    #[test]
    fn test_toml_round_trip() {
        let mut config = WorkbenchConfig::default();
        let _ = config.set("api-key-env", "OPENAI_API_KEY".to_string());
        let Ok(text) = toml::to_string_pretty(&config) else {
            return;
        };
        let parsed: Result<WorkbenchConfig, _> = toml::from_str(&text);
        assert!(parsed.is_ok_and(|c| c.api_key_env.as_deref() == Some("OPENAI_API_KEY")));
    }

    #[test]
    fn test_config_view_env_fallback() {
        let config = WorkbenchConfig::default();
        std::env::set_var("PWB_OPTIMIZER_INPUT", "tighten this prompt");
        let value = ConfigView::get(&config, "optimizer-input");
        std::env::remove_var("PWB_OPTIMIZER_INPUT");
        assert_eq!(value.as_deref(), Some("tighten this prompt"));
    }

    #[test]
    fn test_save_and_load_with_env_override() {
        let Ok(temp) = tempfile::TempDir::new() else {
            return;
        };
        let path = temp.path().join("pwb.toml");
        std::env::set_var("PWB_CONFIG", &path);

        let mut config = WorkbenchConfig::default();
        let _ = config.set("history-path", "/tmp/pwb-history.jsonl".to_string());
        let saved = config.save();
        let loaded = WorkbenchConfig::load();
        std::env::remove_var("PWB_CONFIG");

        assert!(saved.is_ok());
        assert!(loaded.is_ok_and(|c| c.history_path.as_deref() == Some("/tmp/pwb-history.jsonl")));
    }

    #[test]
    fn test_values_iter_lists_only_set_keys() {
        let mut config = WorkbenchConfig::default();
        let _ = config.set("default-provider", "anthropic".to_string());
        let values = config.values_iter();
        assert_eq!(values.len(), 1);
        assert_eq!(values[0].0, "default-provider");
    }
}
