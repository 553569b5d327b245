//! # Config Module
//!
//! The settings record passed into every top-level operation.
//!
//! Settings are never cached: a [`SettingsSource`] is resolved at the start
//! of each operation so edits to the file take effect without a restart.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Placeholder key shipped in the settings template
pub const PLACEHOLDER_API_KEY: &str = "YOUR_API_KEY_HERE";

/// Default classification endpoint. `{model}` is replaced by the model identifier.
pub const DEFAULT_ENDPOINT: &str =
    "https://generativelanguage.googleapis.com/v1beta/models/{model}:generateContent";

/// Default output folder, relative to the scanned root
pub const DEFAULT_OUTPUT_FOLDER: &str = "organized_files";

/// Extensions scanned when the settings file does not list any
pub const DEFAULT_EXTENSIONS: &[&str] = &["txt", "md", "py", "json", "csv", "docx", "pdf"];

/// Engine settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Settings {
    /// Credential for the classification service
    #[serde(default)]
    pub api_key: String,
    /// Model identifier sent with every classification request
    #[serde(default)]
    pub model: String,
    /// Similarity threshold in 0.0-1.0. Accepted and validated, but grouping ignores it.
    #[serde(default = "default_threshold")]
    pub similarity_threshold: f32,
    /// Output folder; relative paths resolve against the scanned root
    #[serde(default)]
    pub output_folder: String,
    /// Endpoint template containing `{model}`
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Classification timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Extensions to scan (without the dot, case-insensitive)
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
    /// Maximum summary length in characters
    #[serde(default = "default_summary_chars")]
    pub summary_chars: usize,
    /// Whether hidden files and directories are scanned
    #[serde(default)]
    pub include_hidden: bool,
}

fn default_threshold() -> f32 {
    0.85
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_extensions() -> Vec<String> {
    DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect()
}

fn default_summary_chars() -> usize {
    400
}

impl Settings {
    /// Create settings with the four required fields and defaults for the rest
    pub fn new(api_key: &str, model: &str, similarity_threshold: f32, output_folder: &str) -> Self {
        Self {
            api_key: api_key.to_string(),
            model: model.to_string(),
            similarity_threshold,
            output_folder: output_folder.to_string(),
            endpoint: default_endpoint(),
            timeout_secs: default_timeout_secs(),
            extensions: default_extensions(),
            summary_chars: default_summary_chars(),
            include_hidden: false,
        }
    }

    /// Read and validate a TOML settings file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound {
                path: path.to_path_buf(),
            });
        }

        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let settings: Settings = toml::from_str(&raw).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            reason: e.message().to_string(),
        })?;

        settings.validate()?;
        Ok(settings)
    }

    /// Reject settings that would make an operation meaningless
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_key.trim().is_empty() || self.api_key == PLACEHOLDER_API_KEY {
            return Err(ConfigError::Missing("api_key"));
        }
        if self.model.trim().is_empty() {
            return Err(ConfigError::Missing("model"));
        }
        if !(0.0..=1.0).contains(&self.similarity_threshold) {
            return Err(ConfigError::InvalidThreshold(self.similarity_threshold));
        }
        if self.output_folder.trim().is_empty() {
            return Err(ConfigError::Missing("output_folder"));
        }
        Ok(())
    }

    /// Resolve the output root for a scanned folder
    pub fn output_root(&self, scan_root: &Path) -> PathBuf {
        let folder = PathBuf::from(self.output_folder.trim());
        if folder.is_absolute() {
            folder
        } else {
            scan_root.join(folder)
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }

    /// Starter settings file written by `init-config`
    pub fn template() -> String {
        format!(
            "# Credential for the classification service\n\
             api_key = \"{PLACEHOLDER_API_KEY}\"\n\
             # Model identifier\n\
             model = \"gemini-2.5-flash\"\n\
             # Accepted for duplicate-adjacent logic, 0.0-1.0\n\
             similarity_threshold = {threshold}\n\
             # Relative paths resolve against the scanned folder\n\
             output_folder = \"{DEFAULT_OUTPUT_FOLDER}\"\n\
             \n\
             # endpoint = \"{DEFAULT_ENDPOINT}\"\n\
             # timeout_secs = {timeout}\n\
             # extensions = [{extensions}]\n\
             # summary_chars = {summary}\n\
             # include_hidden = false\n",
            threshold = default_threshold(),
            timeout = default_timeout_secs(),
            extensions = DEFAULT_EXTENSIONS
                .iter()
                .map(|e| format!("\"{e}\""))
                .collect::<Vec<_>>()
                .join(", "),
            summary = default_summary_chars(),
        )
    }
}

/// Where an operation gets its settings from
#[derive(Debug, Clone)]
pub enum SettingsSource {
    /// Re-read this TOML file on every operation
    File(PathBuf),
    /// A fixed value (tests, embedding callers)
    Fixed(Settings),
}

impl SettingsSource {
    /// Settings file in the user's config directory
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("document-organizer")
            .join("config.toml")
    }

    /// Produce a fresh, validated settings value
    pub fn load(&self) -> Result<Settings, ConfigError> {
        match self {
            SettingsSource::File(path) => Settings::load(path),
            SettingsSource::Fixed(settings) => {
                settings.validate()?;
                Ok(settings.clone())
            }
        }
    }
}
