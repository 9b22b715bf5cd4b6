//! Persisted user settings.
//!
//! Settings live in a single JSON document. Every key is optional on disk and
//! falls back to its default, so a missing or partial file is always usable.
//!
//! # Example
//!
//! ```rust
//! use precis_core::Settings;
//!
//! let settings: Settings = serde_json::from_str(r#"{ "ignore_tags": "script, Nav" }"#).unwrap();
//! assert_eq!(settings.ignore_tags, vec!["script", "nav"]);
//! assert_eq!(settings.ollama_model, "llama3");
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer, Serialize};
use tracing::debug;

use crate::extract::{DEFAULT_IGNORE_TAGS, IgnoreRules};
use crate::prompts::PromptLibrary;
use crate::{PrecisError, Result};

pub const DEFAULT_OLLAMA_HOST: &str = "http://localhost:11434";
pub const DEFAULT_OLLAMA_MODEL: &str = "llama3";

/// Directory name used under the platform config and data directories.
pub const APP_DIR: &str = "precis";

/// User settings: model endpoint, extraction denylist and system prompts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub ollama_host: String,
    pub ollama_model: String,
    #[serde(deserialize_with = "tag_list")]
    pub ignore_tags: Vec<String>,
    #[serde(deserialize_with = "selector_list")]
    pub ignore_selectors: Vec<String>,
    #[serde(flatten)]
    pub prompts: PromptLibrary,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            ollama_host: DEFAULT_OLLAMA_HOST.to_string(),
            ollama_model: DEFAULT_OLLAMA_MODEL.to_string(),
            ignore_tags: DEFAULT_IGNORE_TAGS.iter().map(|tag| tag.to_string()).collect(),
            ignore_selectors: Vec::new(),
            prompts: PromptLibrary::default(),
        }
    }
}

impl Settings {
    /// The ignore rules for a new extraction.
    pub fn ignore_rules(&self) -> IgnoreRules {
        IgnoreRules::new(&self.ignore_tags, &self.ignore_selectors)
    }

    /// Sets one scalar or list setting from its textual form.
    ///
    /// Keys: `host`, `model`, `ignore-tags`, `ignore-selectors`. Lists are
    /// comma-separated.
    ///
    /// # Errors
    ///
    /// Returns [`PrecisError::UnknownSetting`] for any other key and
    /// [`PrecisError::InvalidUrl`] for a host that is not an http(s) URL.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "host" | "ollama-host" => {
                let host = value.trim();
                let url = url::Url::parse(host).map_err(|e| PrecisError::InvalidUrl(format!("{host}: {e}")))?;
                if !matches!(url.scheme(), "http" | "https") {
                    return Err(PrecisError::InvalidUrl(format!("{host}: expected http or https")));
                }
                self.ollama_host = host.trim_end_matches('/').to_string();
            }
            "model" | "ollama-model" => self.ollama_model = value.trim().to_string(),
            "ignore-tags" => self.ignore_tags = parse_list(value).into_iter().map(|t| t.to_ascii_lowercase()).collect(),
            "ignore-selectors" => self.ignore_selectors = parse_list(value),
            other => return Err(PrecisError::UnknownSetting(other.to_string())),
        }
        Ok(())
    }
}

/// Splits a comma-separated list, trimming entries and dropping empty ones.
pub fn parse_list(input: &str) -> Vec<String> {
    input.split(',').map(str::trim).filter(|s| !s.is_empty()).map(str::to_string).collect()
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ListOrString {
    List(Vec<String>),
    Text(String),
}

impl ListOrString {
    fn into_entries(self) -> Vec<String> {
        match self {
            Self::List(items) => items.into_iter().map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect(),
            Self::Text(text) => parse_list(&text),
        }
    }
}

fn tag_list<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Vec<String>, D::Error> {
    let entries = ListOrString::deserialize(deserializer)?.into_entries();
    Ok(entries.into_iter().map(|tag| tag.to_ascii_lowercase()).collect())
}

fn selector_list<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Vec<String>, D::Error> {
    Ok(ListOrString::deserialize(deserializer)?.into_entries())
}

/// Loads and saves [`Settings`] as JSON at a fixed path.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The store at `<config_dir>/precis/settings.json`.
    ///
    /// # Errors
    ///
    /// Returns [`PrecisError::ConfigError`] when the platform has no config directory.
    pub fn default_location() -> Result<Self> {
        let dir = dirs::config_dir()
            .ok_or_else(|| PrecisError::ConfigError("no config directory on this platform".to_string()))?;
        Ok(Self::new(dir.join(APP_DIR).join("settings.json")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the settings, returning defaults when the file does not exist.
    pub fn load(&self) -> Result<Settings> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "settings file missing; using defaults");
            return Ok(Settings::default());
        }
        read_json(&self.path)
    }

    /// Writes the settings, creating parent directories as needed.
    pub fn save(&self, settings: &Settings) -> Result<()> {
        write_json(&self.path, settings)
    }
}

pub(crate) fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T> {
    let content = fs::read_to_string(path)?;
    serde_json::from_str(&content).map_err(|source| PrecisError::Store { path: path.to_path_buf(), source })
}

pub(crate) fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }
    let content =
        serde_json::to_string_pretty(value).map_err(|source| PrecisError::Store { path: path.to_path_buf(), source })?;
    fs::write(path, content)?;
    debug!(path = %path.display(), "wrote store");
    Ok(())
}
