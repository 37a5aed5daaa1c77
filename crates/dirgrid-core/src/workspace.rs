//! Session context: the granted root, the current location and the recent
//! paths list.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc::UnboundedSender;

use crate::error::{CoreError, CoreResult};
use crate::event::GridEvent;
use crate::fs::content::{self, FileContent};
use crate::fs::handle::DirectoryHandle;
use crate::fs::listing::{list_directory, Listing};
use crate::fs::local::LocalDirectory;
use crate::fs::resolve::{normalize_path, resolve_directory};
use crate::grid::{GridRenderer, RenderPass};
use crate::nav::recent::{RecentPaths, RecentPathsStore};

/// A granted directory plus the location it was granted from.
#[derive(Debug, Clone)]
pub struct DirectoryGrant {
    pub handle: Arc<dyn DirectoryHandle>,
    /// Location the same picker accepts again, recorded in recent paths.
    pub path: String,
}

/// Source of directory grants.
///
/// `Ok(None)` means the user declined; it is not an error.
#[async_trait]
pub trait DirectoryPicker: Send + Sync {
    async fn pick(&self) -> CoreResult<Option<DirectoryGrant>>;
}

/// Grants a local directory, but only inside `allowed_root`.
#[derive(Debug, Clone)]
pub struct LocalPicker {
    allowed_root: PathBuf,
    requested: Option<PathBuf>,
}

impl LocalPicker {
    /// `requested` of `None` behaves like a cancelled dialog. Relative
    /// requests are taken relative to `allowed_root`; the grant's `path` is
    /// always relative to it, `"."` for the root itself.
    pub fn new(allowed_root: impl Into<PathBuf>, requested: Option<PathBuf>) -> Self {
        Self {
            allowed_root: allowed_root.into(),
            requested,
        }
    }
}

#[async_trait]
impl DirectoryPicker for LocalPicker {
    async fn pick(&self) -> CoreResult<Option<DirectoryGrant>> {
        let Some(requested) = &self.requested else {
            return Ok(None);
        };

        let root = canonical(&self.allowed_root).await?;
        let target = canonical(&root.join(requested)).await?;
        let Ok(relative) = target.strip_prefix(&root) else {
            return Err(CoreError::PermissionDenied(requested.display().to_string()));
        };
        let path = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");

        let dir = LocalDirectory::open(&target).await?;
        Ok(Some(DirectoryGrant {
            handle: Arc::new(dir),
            path: if path.is_empty() { ".".to_string() } else { path },
        }))
    }
}

async fn canonical(path: &Path) -> CoreResult<PathBuf> {
    tokio::fs::canonicalize(path).await.map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => CoreError::PathNotFound(path.display().to_string()),
        std::io::ErrorKind::PermissionDenied => {
            CoreError::PermissionDenied(path.display().to_string())
        }
        _ => CoreError::io(path.display().to_string(), e),
    })
}

/// One browsing session.
#[derive(Debug)]
pub struct Workspace {
    root: Option<Arc<dyn DirectoryHandle>>,
    current_path: String,
    recent: RecentPathsStore,
}

impl Workspace {
    pub fn new(recent: RecentPathsStore) -> Self {
        Self {
            root: None,
            current_path: String::new(),
            recent,
        }
    }

    /// Asks `picker` for a new root.
    ///
    /// Returns `Ok(true)` when a directory was granted; the session then
    /// starts at its top and the grant's path is recorded as recent.
    /// Returns `Ok(false)` when the user cancelled, leaving the session
    /// unchanged.
    pub async fn select_directory(&mut self, picker: &dyn DirectoryPicker) -> CoreResult<bool> {
        let grant = match picker.pick().await {
            Ok(Some(grant)) => grant,
            Ok(None) => {
                tracing::debug!("Directory selection cancelled");
                return Ok(false);
            }
            Err(e) => {
                tracing::error!("Directory selection failed: {e}");
                return Err(e);
            }
        };

        self.set_root(grant.handle);
        if let Err(e) = self.recent.add(&grant.path) {
            tracing::error!("Failed to persist recent paths: {e}");
        }
        Ok(true)
    }

    /// Opens `path` below `allowed_root` as the new root, e.g. an entry of
    /// [`recent_paths`](Self::recent_paths), and records it as recent.
    pub async fn open_path(&mut self, allowed_root: &Path, path: &str) -> CoreResult<()> {
        let picker = LocalPicker::new(allowed_root, Some(PathBuf::from(path)));
        self.select_directory(&picker).await?;
        Ok(())
    }

    /// Installs `root` directly, without a picker or a recent entry.
    pub fn set_root(&mut self, root: Arc<dyn DirectoryHandle>) {
        self.root = Some(root);
        self.current_path.clear();
    }

    /// The granted root.
    ///
    /// # Errors
    ///
    /// [`CoreError::HandleInvalid`] if no directory has been selected.
    pub fn root(&self) -> CoreResult<&Arc<dyn DirectoryHandle>> {
        self.root
            .as_ref()
            .ok_or_else(|| CoreError::HandleInvalid("no directory selected".to_string()))
    }

    pub fn has_root(&self) -> bool {
        self.root.is_some()
    }

    /// Relative path of the current location, `""` at the root.
    pub fn current_path(&self) -> &str {
        &self.current_path
    }

    /// `root-name/current/path`, or just the root name at the top.
    pub fn display_path(&self) -> Option<String> {
        let root = self.root.as_ref()?;
        if self.current_path.is_empty() {
            Some(root.name().to_string())
        } else {
            Some(format!("{}/{}", root.name(), self.current_path))
        }
    }

    /// Lists the directory at `relative_path` below the root.
    pub async fn list(&self, relative_path: &str) -> CoreResult<Listing> {
        let base = normalize_path(relative_path);
        let dir = resolve_directory(self.root()?, &base).await?;
        list_directory(dir.as_ref(), &base).await
    }

    /// Moves the current location to `relative_path` after checking that it
    /// resolves to a directory.
    pub async fn navigate(&mut self, relative_path: &str) -> CoreResult<()> {
        let base = normalize_path(relative_path);
        resolve_directory(self.root()?, &base).await?;
        self.current_path = base;
        Ok(())
    }

    /// Renders the current location with `renderer`.
    pub async fn render_current(
        &self,
        renderer: &GridRenderer,
        tx: &UnboundedSender<GridEvent>,
    ) -> CoreResult<RenderPass> {
        let dir = resolve_directory(self.root()?, &self.current_path).await?;
        renderer.render(dir.as_ref(), &self.current_path, tx).await
    }

    pub async fn read_file_as_base64(&self, relative_path: &str) -> CoreResult<FileContent> {
        content::read_file_as_base64(self.root()?, relative_path).await
    }

    pub async fn read_file_as_text(&self, relative_path: &str) -> CoreResult<FileContent> {
        content::read_file_as_text(self.root()?, relative_path).await
    }

    pub fn recent_paths(&self) -> &RecentPaths {
        self.recent.get()
    }
}

impl Default for Workspace {
    fn default() -> Self {
        Self::new(RecentPathsStore::in_memory())
    }
}
