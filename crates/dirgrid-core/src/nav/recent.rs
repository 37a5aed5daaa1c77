//! Recently opened workspace roots.
//!
//! [`RecentPaths`] is an immutable, most-recent-first list capped at
//! [`MAX_RECENT_PATHS`]. [`RecentPathsStore`] keeps the current list and,
//! when given a file, persists it as JSON after every change.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// Upper bound on remembered paths.
pub const MAX_RECENT_PATHS: usize = 10;

/// Most-recent-first list of distinct paths.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecentPaths {
    paths: Vec<String>,
}

impl RecentPaths {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Return a new list with `path` moved (or inserted) at the front.
    ///
    /// Older entries beyond [`MAX_RECENT_PATHS`] are dropped.
    #[must_use]
    pub fn with_path(&self, path: &str) -> Self {
        let mut paths = Vec::with_capacity(MAX_RECENT_PATHS);
        paths.push(path.to_owned());
        paths.extend(self.paths.iter().filter(|p| *p != path).cloned());
        paths.truncate(MAX_RECENT_PATHS);
        Self { paths }
    }

    pub fn paths(&self) -> &[String] {
        &self.paths
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn contains(&self, path: &str) -> bool {
        self.paths.iter().any(|p| p == path)
    }

    fn capped(mut self) -> Self {
        self.paths.truncate(MAX_RECENT_PATHS);
        self
    }
}

/// Holds the recent list for a session.
#[derive(Debug, Clone, Default)]
pub struct RecentPathsStore {
    file: Option<PathBuf>,
    paths: RecentPaths,
}

impl RecentPathsStore {
    /// A store that never touches the filesystem.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Loads the list from `file`.
    ///
    /// A missing file starts an empty list. An unreadable or malformed file
    /// is logged and also starts an empty list; the next successful
    /// [`add`](Self::add) overwrites it.
    pub fn load(file: impl Into<PathBuf>) -> Self {
        let file = file.into();
        let paths = match read_recent(&file) {
            Ok(paths) => paths.capped(),
            Err(CoreError::PathNotFound(_)) => RecentPaths::new(),
            Err(e) => {
                tracing::error!("Failed to load recent paths from {}: {e}", file.display());
                RecentPaths::new()
            }
        };
        Self {
            file: Some(file),
            paths,
        }
    }

    pub fn get(&self) -> &RecentPaths {
        &self.paths
    }

    /// Records `path` as most recent and persists the list.
    ///
    /// The in-memory list is updated even if persisting fails.
    pub fn add(&mut self, path: &str) -> CoreResult<()> {
        self.paths = self.paths.with_path(path);
        match &self.file {
            Some(file) => write_recent(file, &self.paths),
            None => Ok(()),
        }
    }
}

fn read_recent(file: &Path) -> CoreResult<RecentPaths> {
    let content = std::fs::read_to_string(file).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => CoreError::PathNotFound(file.display().to_string()),
        _ => CoreError::io(file.display().to_string(), e),
    })?;
    serde_json::from_str(&content).map_err(|e| CoreError::ConfigParse(e.to_string()))
}

fn write_recent(file: &Path, paths: &RecentPaths) -> CoreResult<()> {
    let name = file.display().to_string();
    if let Some(parent) = file.parent() {
        std::fs::create_dir_all(parent).map_err(|e| CoreError::io(&name, e))?;
    }
    let content =
        serde_json::to_string_pretty(paths).map_err(|e| CoreError::ConfigParse(e.to_string()))?;
    std::fs::write(file, content).map_err(|e| CoreError::io(&name, e))
}
