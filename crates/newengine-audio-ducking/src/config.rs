use serde::{Deserialize, Serialize};
use std::io;
use std::path::{Path, PathBuf};

use crate::category::StreamCategory;
use crate::error::DuckingResult;
use crate::params::DuckingParams;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{}: {source}", .path.display())]
    Io { path: PathBuf, source: io::Error },

    #[error("{}: {source}", .path.display())]
    Toml { path: PathBuf, source: toml::de::Error },

    #[error("{}: {source}", .path.display())]
    Json { path: PathBuf, source: serde_json::Error },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DuckingConfig {
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub backend: BackendConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_category")]
    pub category: StreamCategory,
    #[serde(default = "default_duration_ms")]
    pub duration_ms: u32,
    #[serde(default = "default_ratio")]
    pub ratio: f64,
    /// How long a driver waits for each state callback.
    #[serde(default = "default_wait_ms")]
    pub wait_ms: u64,
}

fn default_category() -> StreamCategory { StreamCategory::Media }
fn default_duration_ms() -> u32 { 500 }
fn default_ratio() -> f64 { 0.3 }
fn default_wait_ms() -> u64 { 1000 }

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            category: default_category(),
            duration_ms: default_duration_ms(),
            ratio: default_ratio(),
            wait_ms: default_wait_ms(),
        }
    }
}

impl SessionConfig {
    #[inline]
    pub fn params(&self) -> DuckingResult<DuckingParams> {
        DuckingParams::new(self.duration_ms, self.ratio)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    #[default]
    Null,
    Native,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendConfig {
    #[serde(default)]
    pub kind: BackendKind,
    /// Shared library to load for the native backend.
    #[serde(default = "default_library")]
    pub library: String,
    /// Null backend only: deliver callbacks from a worker thread.
    #[serde(default = "default_auto_notify")]
    pub auto_notify: bool,
}

fn default_library() -> String { "libcapi-media-sound-manager.so.0".to_string() }
fn default_auto_notify() -> bool { true }

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            kind: BackendKind::default(),
            library: default_library(),
            auto_notify: default_auto_notify(),
        }
    }
}

impl DuckingConfig {
    /// Loads TOML, or JSON when the file extension is `.json`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("json"));

        if is_json {
            serde_json::from_str(&text).map_err(|source| ConfigError::Json {
                path: path.to_path_buf(),
                source,
            })
        } else {
            toml::from_str(&text).map_err(|source| ConfigError::Toml {
                path: path.to_path_buf(),
                source,
            })
        }
    }

    #[inline]
    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    #[inline]
    pub fn from_json_str(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}
