use std::net::SocketAddr;
use std::path::PathBuf;

use dirgrid_core::Config;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: SocketAddr,
    #[serde(default)]
    pub filesystem: FilesystemConfig,
    /// Listing, thumbnail and recent-path settings shared with the core.
    #[serde(default)]
    pub core: Config,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FilesystemConfig {
    /// Directory grants are only issued below this path.
    #[serde(default = "default_root")]
    pub root: PathBuf,
}

fn default_bind_addr() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 9090))
}

fn default_root() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("/"))
}

impl Default for FilesystemConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            filesystem: FilesystemConfig::default(),
            core: Config::default(),
        }
    }
}

impl ServerConfig {
    pub fn from_toml(contents: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    pub fn load() -> anyhow::Result<Self> {
        let mut config = match std::env::var_os("DIRGRID_WEB_CONFIG") {
            Some(path) => Self::from_toml(&std::fs::read_to_string(path)?)?,
            None => ServerConfig::default(),
        };

        // A standalone core config file replaces the embedded [core] table.
        if let Some(path) = std::env::var_os("DIRGRID_CONFIG") {
            config.core = Config::load(&PathBuf::from(path))?;
        }

        if let Ok(root) = std::env::var("DIRGRID_ROOT") {
            config.filesystem.root = PathBuf::from(root);
        }

        if let Ok(addr) = std::env::var("DIRGRID_BIND_ADDR") {
            config.bind_addr = addr.parse()?;
        }

        if config.bind_addr.ip().is_unspecified() {
            tracing::warn!(
                "Listening on all interfaces ({}). Anyone on the network can browse {}.",
                config.bind_addr,
                config.filesystem.root.display()
            );
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_uses_defaults() {
        let config = ServerConfig::from_toml("").unwrap();
        assert_eq!(config.bind_addr, default_bind_addr());
        assert!(config.core.thumbnails.enabled);
        assert!(!config.core.listing.sort_entries);
    }

    #[test]
    fn embedded_core_table_is_parsed() {
        let config = ServerConfig::from_toml(
            r#"
            bind_addr = "0.0.0.0:8080"

            [filesystem]
            root = "/srv/media"

            [core.thumbnails]
            max_dimension = 128

            [core.recent]
            file = "/var/lib/dirgrid/recent.json"
            "#,
        )
        .unwrap();
        assert_eq!(config.bind_addr.port(), 8080);
        assert_eq!(config.filesystem.root, PathBuf::from("/srv/media"));
        assert_eq!(config.core.thumbnails.max_dimension, 128);
        assert_eq!(
            config.core.recent.file.as_deref(),
            Some(std::path::Path::new("/var/lib/dirgrid/recent.json"))
        );
    }

    #[test]
    fn malformed_file_is_rejected() {
        assert!(ServerConfig::from_toml("bind_addr = 12").is_err());
    }
}
