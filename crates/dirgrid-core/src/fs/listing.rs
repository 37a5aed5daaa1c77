//! Single-level directory listing.

use std::sync::Arc;

use futures::StreamExt;

use crate::error::CoreResult;
use crate::fs::entry::EntryDescriptor;
use crate::fs::handle::{DirectoryHandle, FileHandle, Handle};

/// The direct children of one directory, split by kind.
#[derive(Debug, Clone, Default)]
pub struct Listing {
    /// Path of the listed directory relative to the granted root.
    pub path: String,
    pub files: Vec<EntryDescriptor>,
    pub directories: Vec<EntryDescriptor>,
}

impl Listing {
    /// `true` when the directory has no children at all.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty() && self.directories.is_empty()
    }

    pub fn len(&self) -> usize {
        self.files.len() + self.directories.len()
    }

    /// Directories first, then files.
    pub fn entries(&self) -> impl Iterator<Item = &EntryDescriptor> {
        self.directories.iter().chain(self.files.iter())
    }

    /// Sorts both groups by name, case-insensitively.
    ///
    /// Listings otherwise keep the backend's enumeration order, which is not
    /// guaranteed to be stable.
    #[must_use]
    pub fn sorted(mut self) -> Self {
        let by_name = |a: &EntryDescriptor, b: &EntryDescriptor| {
            a.name()
                .to_lowercase()
                .cmp(&b.name().to_lowercase())
                .then_with(|| a.name().cmp(b.name()))
        };
        self.files.sort_by(by_name);
        self.directories.sort_by(by_name);
        self
    }
}

/// Lists the direct children of `handle`.
///
/// Every child is enumerated exactly once. Files additionally get one
/// metadata fetch each; those fetches run concurrently but the resulting
/// `files` keep enumeration order. No sorting is applied; see
/// [`Listing::sorted`].
///
/// # Errors
///
/// - [`crate::CoreError::HandleInvalid`] if `handle` is stale.
/// - [`crate::CoreError::Io`] tagged with the failing entry's name if
///   enumeration or any metadata fetch fails. Partial listings are never
///   returned.
///
/// # Examples
///
/// ```no_run
/// # async fn demo() -> dirgrid_core::CoreResult<()> {
/// use dirgrid_core::fs::local::LocalDirectory;
/// use dirgrid_core::list_directory;
///
/// let dir = LocalDirectory::open("/home/user/photos").await?;
/// let listing = list_directory(&dir, "").await?;
/// for entry in listing.entries() {
///     println!("{}", entry.relative_path());
/// }
/// # Ok(())
/// # }
/// ```
pub async fn list_directory(handle: &dyn DirectoryHandle, base_path: &str) -> CoreResult<Listing> {
    let mut children = handle.entries().await?;
    let mut pending_files = Vec::new();
    let mut directories = Vec::new();

    while let Some(child) = children.next().await {
        let child = child?;
        match child.handle {
            Handle::File(file) => pending_files.push(describe_file(base_path, child.name, file)),
            Handle::Directory(dir) => {
                directories.push(EntryDescriptor::directory(base_path, child.name, dir));
            }
        }
    }

    let files = futures::future::try_join_all(pending_files).await?;
    tracing::debug!(
        "Listed {:?}: {} files, {} directories",
        base_path,
        files.len(),
        directories.len()
    );

    Ok(Listing {
        path: base_path.to_string(),
        files,
        directories,
    })
}

async fn describe_file(
    base_path: &str,
    name: String,
    file: Arc<dyn FileHandle>,
) -> CoreResult<EntryDescriptor> {
    let metadata = file.metadata().await.map_err(|e| e.for_entry(&name))?;
    Ok(EntryDescriptor::file(base_path, name, metadata, file))
}
