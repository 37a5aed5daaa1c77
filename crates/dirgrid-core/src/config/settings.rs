//! Application configuration loaded from a TOML file.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// Top-level configuration.
///
/// All fields have sensible defaults so dirgrid works without a config file.
/// Call [`Config::load`] to read from a TOML path.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub listing: ListingConfig,
    #[serde(default)]
    pub thumbnails: ThumbnailConfig,
    #[serde(default)]
    pub recent: RecentConfig,
}

impl Config {
    /// Loads configuration from a TOML file at `path`.
    ///
    /// # Errors
    ///
    /// - [`CoreError::PathNotFound`] if the file does not exist.
    /// - [`CoreError::PermissionDenied`] if the file is not readable.
    /// - [`CoreError::ConfigParse`] if the TOML is malformed.
    pub fn load(path: &Path) -> CoreResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => CoreError::PathNotFound(path.display().to_string()),
            std::io::ErrorKind::PermissionDenied => {
                CoreError::PermissionDenied(path.display().to_string())
            }
            _ => CoreError::io(path.display().to_string(), e),
        })?;
        Self::from_toml(&content)
    }

    /// Parses configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// [`CoreError::ConfigParse`] if the TOML is malformed.
    pub fn from_toml(content: &str) -> CoreResult<Self> {
        toml::from_str(content).map_err(|e| CoreError::ConfigParse(e.to_string()))
    }
}

/// Directory listing preferences.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListingConfig {
    /// Sort each listing by name instead of keeping enumeration order.
    #[serde(default)]
    pub sort_entries: bool,
}

/// Thumbnail generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThumbnailConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Longest edge of a generated thumbnail, in pixels.
    #[serde(default = "default_max_dimension")]
    pub max_dimension: u32,
    /// Thumbnails decoded at the same time. `0` means unbounded.
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,
    /// Program used to pull the first frame out of a video.
    #[serde(default = "default_ffmpeg_path")]
    pub ffmpeg_path: PathBuf,
}

impl Default for ThumbnailConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_dimension: default_max_dimension(),
            max_concurrent: default_max_concurrent(),
            ffmpeg_path: default_ffmpeg_path(),
        }
    }
}

/// Recently-opened paths.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecentConfig {
    /// JSON file the list is persisted to. In-memory only when unset.
    #[serde(default)]
    pub file: Option<PathBuf>,
}

fn default_true() -> bool {
    true
}

fn default_max_dimension() -> u32 {
    256
}

fn default_max_concurrent() -> usize {
    8
}

fn default_ffmpeg_path() -> PathBuf {
    PathBuf::from("ffmpeg")
}
