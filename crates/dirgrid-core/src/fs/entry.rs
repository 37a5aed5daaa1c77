//! Listing entry representation.

use std::sync::Arc;
use std::time::SystemTime;

use crate::fs::handle::{DirectoryHandle, EntryKind, FileHandle, FileMetadata, Handle};

/// One child of a listed directory.
///
/// `EntryDescriptor` is immutable: it is produced fresh by every listing and
/// never updated afterwards. It keeps the child's handle so that later stages
/// (thumbnails, navigation) do not need to look the child up again.
#[derive(Debug, Clone)]
pub struct EntryDescriptor {
    name: String,
    relative_path: String,
    details: EntryDetails,
}

#[derive(Debug, Clone)]
enum EntryDetails {
    File {
        metadata: FileMetadata,
        handle: Arc<dyn FileHandle>,
    },
    Directory {
        handle: Arc<dyn DirectoryHandle>,
    },
}

impl EntryDescriptor {
    /// Describes a file child of the directory at `parent_path`.
    pub fn file(
        parent_path: &str,
        name: impl Into<String>,
        metadata: FileMetadata,
        handle: Arc<dyn FileHandle>,
    ) -> Self {
        let name = name.into();
        Self {
            relative_path: join_relative(parent_path, &name),
            name,
            details: EntryDetails::File { metadata, handle },
        }
    }

    /// Describes a directory child of the directory at `parent_path`.
    pub fn directory(
        parent_path: &str,
        name: impl Into<String>,
        handle: Arc<dyn DirectoryHandle>,
    ) -> Self {
        let name = name.into();
        Self {
            relative_path: join_relative(parent_path, &name),
            name,
            details: EntryDetails::Directory { handle },
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Path relative to the granted root, `/`-separated.
    pub fn relative_path(&self) -> &str {
        &self.relative_path
    }

    pub fn kind(&self) -> EntryKind {
        match self.details {
            EntryDetails::File { .. } => EntryKind::File,
            EntryDetails::Directory { .. } => EntryKind::Directory,
        }
    }

    pub fn is_dir(&self) -> bool {
        self.kind() == EntryKind::Directory
    }

    /// File metadata. `None` for directories.
    pub fn metadata(&self) -> Option<&FileMetadata> {
        match &self.details {
            EntryDetails::File { metadata, .. } => Some(metadata),
            EntryDetails::Directory { .. } => None,
        }
    }

    /// Size in bytes. `None` for directories.
    pub fn size(&self) -> Option<u64> {
        self.metadata().map(|m| m.size)
    }

    pub fn mime_hint(&self) -> Option<&str> {
        self.metadata().map(|m| m.mime_hint.as_str())
    }

    pub fn last_modified(&self) -> Option<SystemTime> {
        self.metadata().map(|m| m.last_modified)
    }

    pub fn file_handle(&self) -> Option<&Arc<dyn FileHandle>> {
        match &self.details {
            EntryDetails::File { handle, .. } => Some(handle),
            EntryDetails::Directory { .. } => None,
        }
    }

    pub fn directory_handle(&self) -> Option<&Arc<dyn DirectoryHandle>> {
        match &self.details {
            EntryDetails::Directory { handle } => Some(handle),
            EntryDetails::File { .. } => None,
        }
    }

    pub fn handle(&self) -> Handle {
        match &self.details {
            EntryDetails::File { handle, .. } => Handle::File(Arc::clone(handle)),
            EntryDetails::Directory { handle } => Handle::Directory(Arc::clone(handle)),
        }
    }
}

/// Joins a parent path and a child name: `parent/name`, or just `name` at
/// the root.
pub fn join_relative(parent_path: &str, name: &str) -> String {
    if parent_path.is_empty() {
        name.to_string()
    } else {
        format!("{parent_path}/{name}")
    }
}
