//! Capability handles.
//!
//! A [`DirectoryHandle`] grants access to exactly one directory node: it can
//! enumerate its direct children and open a named child. A [`FileHandle`]
//! grants read-only access to one file. Neither carries a path that could be
//! used to reach anything outside of what was granted; deeper nodes are only
//! reachable by deriving handles step by step.

use std::fmt;
use std::sync::Arc;
use std::time::SystemTime;

use async_trait::async_trait;
use futures::stream::BoxStream;
use serde::Serialize;

use crate::error::{CoreError, CoreResult};

/// Whether a node is a file or a directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Directory,
}

/// Metadata fetched from a [`FileHandle`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileMetadata {
    /// Size in bytes.
    pub size: u64,
    /// MIME-ish type guessed from the file name. Empty when unknown.
    pub mime_hint: String,
    /// Last modification time.
    pub last_modified: SystemTime,
}

/// One child yielded by [`DirectoryHandle::entries`].
#[derive(Debug, Clone)]
pub struct ChildEntry {
    pub name: String,
    pub handle: Handle,
}

impl ChildEntry {
    pub fn kind(&self) -> EntryKind {
        self.handle.kind()
    }
}

/// Lazy sequence of children. Order is whatever the backend yields.
pub type ChildStream = BoxStream<'static, CoreResult<ChildEntry>>;

/// Capability to one directory node.
#[async_trait]
pub trait DirectoryHandle: Send + Sync + fmt::Debug {
    /// The directory's own name (last path component).
    fn name(&self) -> &str;

    /// Enumerates direct children.
    ///
    /// # Errors
    ///
    /// [`CoreError::HandleInvalid`] if the handle is stale or revoked,
    /// [`CoreError::Io`] if enumeration cannot start.
    async fn entries(&self) -> CoreResult<ChildStream>;

    /// Opens the named child as a directory.
    ///
    /// # Errors
    ///
    /// [`CoreError::PathNotFound`] if the child is missing or is not a directory.
    async fn open_directory(&self, name: &str) -> CoreResult<Arc<dyn DirectoryHandle>>;

    /// Opens the named child as a file.
    ///
    /// # Errors
    ///
    /// [`CoreError::PathNotFound`] if the child is missing or is not a file.
    async fn open_file(&self, name: &str) -> CoreResult<Arc<dyn FileHandle>>;

    /// Opens the named child, whatever its kind.
    async fn open_child(&self, name: &str) -> CoreResult<Handle> {
        match self.open_directory(name).await {
            Ok(dir) => Ok(Handle::Directory(dir)),
            Err(CoreError::PathNotFound(_)) => self.open_file(name).await.map(Handle::File),
            Err(e) => Err(e),
        }
    }
}

/// Capability to read one file.
#[async_trait]
pub trait FileHandle: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;

    /// Fetches size, type hint and modification time.
    async fn metadata(&self) -> CoreResult<FileMetadata>;

    /// Reads the whole file.
    async fn read_bytes(&self) -> CoreResult<Vec<u8>>;
}

/// A handle of either kind.
#[derive(Debug, Clone)]
pub enum Handle {
    File(Arc<dyn FileHandle>),
    Directory(Arc<dyn DirectoryHandle>),
}

impl Handle {
    pub fn kind(&self) -> EntryKind {
        match self {
            Handle::File(_) => EntryKind::File,
            Handle::Directory(_) => EntryKind::Directory,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Handle::File(f) => f.name(),
            Handle::Directory(d) => d.name(),
        }
    }

    pub fn as_file(&self) -> Option<&Arc<dyn FileHandle>> {
        match self {
            Handle::File(f) => Some(f),
            Handle::Directory(_) => None,
        }
    }

    pub fn as_directory(&self) -> Option<&Arc<dyn DirectoryHandle>> {
        match self {
            Handle::Directory(d) => Some(d),
            Handle::File(_) => None,
        }
    }
}

/// Rejects names that would let a child lookup escape its parent.
///
/// # Errors
///
/// Returns [`CoreError::InvalidName`] for empty names, `.`/`..`, and names
/// containing a path separator or NUL.
pub fn validate_child_name(name: &str) -> CoreResult<()> {
    if name.is_empty()
        || name == "."
        || name == ".."
        || name.contains('/')
        || name.contains('\\')
        || name.contains('\0')
    {
        return Err(CoreError::InvalidName(name.to_string()));
    }
    Ok(())
}

/// Guesses a MIME type from a file name. Empty when nothing matches.
pub fn mime_hint_for(name: &str) -> String {
    mime_guess::from_path(name)
        .first()
        .map(|m| m.essence_str().to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_accepts_plain_names() {
        assert!(validate_child_name("photo.png").is_ok());
        assert!(validate_child_name(".hidden").is_ok());
        assert!(validate_child_name("한글").is_ok());
    }

    #[test]
    fn validate_rejects_traversal() {
        for bad in ["", ".", "..", "a/b", "a\\b", "nul\0"] {
            assert!(
                matches!(validate_child_name(bad), Err(CoreError::InvalidName(_))),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn mime_hint_known_and_unknown() {
        assert_eq!(mime_hint_for("a.png"), "image/png");
        assert_eq!(mime_hint_for("a.txt"), "text/plain");
        assert_eq!(mime_hint_for("noext"), "");
    }
}
