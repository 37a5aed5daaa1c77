//! Local file system backend built on `tokio::fs`.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use async_trait::async_trait;
use futures::StreamExt;

use crate::error::{CoreError, CoreResult};
use crate::fs::handle::{
    mime_hint_for, validate_child_name, ChildEntry, ChildStream, DirectoryHandle, FileHandle,
    FileMetadata, Handle,
};

/// A granted local directory.
///
/// Every handle derived from a grant carries the grant's canonical path as
/// its boundary. Children that resolve outside it (through symlinks) are not
/// listed and cannot be opened.
#[derive(Debug, Clone)]
pub struct LocalDirectory {
    path: PathBuf,
    name: String,
    boundary: Arc<PathBuf>,
}

impl LocalDirectory {
    /// Grants access to the directory at `path`.
    ///
    /// # Errors
    ///
    /// - [`CoreError::PathNotFound`] if `path` does not exist or is not a directory.
    /// - [`CoreError::Io`] for any other failure reading its metadata.
    pub async fn open(path: impl Into<PathBuf>) -> CoreResult<Self> {
        let path = path.into();
        let name = node_name(&path);
        let canonical = match tokio::fs::canonicalize(&path).await {
            Ok(canonical) => canonical,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(CoreError::PathNotFound(path.display().to_string()));
            }
            Err(e) => return Err(CoreError::io(name, e)),
        };
        match tokio::fs::metadata(&canonical).await {
            Ok(meta) if meta.is_dir() => Ok(Self {
                boundary: Arc::new(canonical.clone()),
                path: canonical,
                name,
            }),
            Ok(_) => Err(CoreError::PathNotFound(path.display().to_string())),
            Err(e) => Err(CoreError::io(name, e)),
        }
    }

    /// Canonical location on disk. Never handed to callers of the
    /// capability traits.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Fails with [`CoreError::HandleInvalid`] once the directory is gone.
    async fn ensure_valid(&self) -> CoreResult<()> {
        match tokio::fs::metadata(&self.path).await {
            Ok(meta) if meta.is_dir() => Ok(()),
            Ok(_) => Err(CoreError::HandleInvalid(self.name.clone())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(CoreError::HandleInvalid(self.name.clone()))
            }
            Err(e) => Err(CoreError::io(self.name.clone(), e)),
        }
    }

    /// Finds the on-disk path for a listed name.
    ///
    /// Listed names are NFC; on filesystems that keep names as written the
    /// stored name may be decomposed, so an exact miss falls back to a scan.
    async fn locate(&self, name: &str) -> CoreResult<PathBuf> {
        let direct = self.path.join(name);
        match tokio::fs::symlink_metadata(&direct).await {
            Ok(_) => return Ok(direct),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(CoreError::io(name, e)),
        }

        let mut read_dir = tokio::fs::read_dir(&self.path)
            .await
            .map_err(|e| CoreError::io(self.name.clone(), e))?;
        while let Some(entry) = read_dir
            .next_entry()
            .await
            .map_err(|e| CoreError::io(self.name.clone(), e))?
        {
            if crate::nfc_string(&entry.file_name().to_string_lossy()) == name {
                return Ok(entry.path());
            }
        }
        Err(CoreError::PathNotFound(name.to_string()))
    }

    /// Resolves `raw` to a child node inside the boundary.
    ///
    /// Links that leave the boundary become `LocalNode::Outside`. Dangling
    /// links and anything that is neither a directory nor a regular file
    /// give `Ok(None)`.
    async fn inspect(&self, raw: &Path, name: &str) -> CoreResult<Option<LocalNode>> {
        let canonical = match tokio::fs::canonicalize(raw).await {
            Ok(canonical) => canonical,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(CoreError::io(name, e)),
        };
        if !canonical.starts_with(self.boundary.as_path()) {
            return Ok(Some(LocalNode::Outside));
        }
        let meta = tokio::fs::metadata(&canonical)
            .await
            .map_err(|e| CoreError::io(name, e))?;

        let node = if meta.is_dir() {
            LocalNode::Directory(LocalDirectory {
                path: canonical,
                name: name.to_string(),
                boundary: Arc::clone(&self.boundary),
            })
        } else if meta.is_file() {
            LocalNode::File(LocalFile {
                path: canonical,
                name: name.to_string(),
            })
        } else {
            return Ok(None);
        };
        Ok(Some(node))
    }

    async fn child(&self, name: &str) -> CoreResult<LocalNode> {
        validate_child_name(name)?;
        self.ensure_valid().await?;
        let raw = self.locate(name).await?;
        match self.inspect(&raw, name).await? {
            Some(LocalNode::Outside) => Err(CoreError::PermissionDenied(name.to_string())),
            Some(node) => Ok(node),
            None => Err(CoreError::PathNotFound(name.to_string())),
        }
    }
}

enum LocalNode {
    Directory(LocalDirectory),
    File(LocalFile),
    Outside,
}

#[async_trait]
impl DirectoryHandle for LocalDirectory {
    fn name(&self) -> &str {
        &self.name
    }

    async fn entries(&self) -> CoreResult<ChildStream> {
        self.ensure_valid().await?;
        let read_dir = tokio::fs::read_dir(&self.path)
            .await
            .map_err(|e| CoreError::io(self.name.clone(), e))?;
        let parent = self.clone();

        let stream = futures::stream::unfold(Some(read_dir), move |state| {
            let parent = parent.clone();
            async move {
                let mut read_dir = state?;
                loop {
                    match read_dir.next_entry().await {
                        Ok(Some(entry)) => {
                            let name = crate::nfc_string(&entry.file_name().to_string_lossy());
                            let path = entry.path();
                            let handle = match parent.inspect(&path, &name).await {
                                Ok(Some(LocalNode::Directory(dir))) => Handle::Directory(Arc::new(dir)),
                                Ok(Some(LocalNode::File(file))) => Handle::File(Arc::new(file)),
                                Ok(Some(LocalNode::Outside)) => {
                                    tracing::debug!(
                                        "Skipping {} (resolves outside the granted directory)",
                                        path.display()
                                    );
                                    continue;
                                }
                                Ok(None) => {
                                    tracing::debug!("Skipping dangling or special entry {}", path.display());
                                    continue;
                                }
                                Err(e) => return Some((Err(e), None)),
                            };
                            return Some((Ok(ChildEntry { name, handle }), Some(read_dir)));
                        }
                        Ok(None) => return None,
                        Err(e) => return Some((Err(CoreError::io(parent.name.clone(), e)), None)),
                    }
                }
            }
        });

        Ok(stream.boxed())
    }

    async fn open_directory(&self, name: &str) -> CoreResult<Arc<dyn DirectoryHandle>> {
        match self.child(name).await? {
            LocalNode::Directory(dir) => Ok(Arc::new(dir)),
            _ => Err(CoreError::PathNotFound(name.to_string())),
        }
    }

    async fn open_file(&self, name: &str) -> CoreResult<Arc<dyn FileHandle>> {
        match self.child(name).await? {
            LocalNode::File(file) => Ok(Arc::new(file)),
            _ => Err(CoreError::PathNotFound(name.to_string())),
        }
    }
}

/// A regular local file reachable from a [`LocalDirectory`].
#[derive(Debug, Clone)]
pub struct LocalFile {
    path: PathBuf,
    name: String,
}

impl LocalFile {
    fn map_err(&self, e: std::io::Error) -> CoreError {
        if e.kind() == std::io::ErrorKind::NotFound {
            CoreError::HandleInvalid(self.name.clone())
        } else {
            CoreError::io(self.name.clone(), e)
        }
    }
}

#[async_trait]
impl FileHandle for LocalFile {
    fn name(&self) -> &str {
        &self.name
    }

    async fn metadata(&self) -> CoreResult<FileMetadata> {
        let meta = tokio::fs::metadata(&self.path)
            .await
            .map_err(|e| self.map_err(e))?;
        Ok(FileMetadata {
            size: meta.len(),
            mime_hint: mime_hint_for(&self.name),
            last_modified: meta.modified().unwrap_or(SystemTime::UNIX_EPOCH),
        })
    }

    async fn read_bytes(&self) -> CoreResult<Vec<u8>> {
        tokio::fs::read(&self.path).await.map_err(|e| self.map_err(e))
    }
}

fn node_name(path: &Path) -> String {
    path.file_name()
        .map(|n| crate::nfc_string(&n.to_string_lossy()))
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::TryStreamExt;
    use std::fs;
    use tempfile::TempDir;

    async fn children(dir: &LocalDirectory) -> Vec<(String, crate::fs::EntryKind)> {
        let mut out: Vec<_> = dir
            .entries()
            .await
            .unwrap()
            .map_ok(|c| (c.name.clone(), c.kind()))
            .try_collect()
            .await
            .unwrap();
        out.sort();
        out
    }

    #[tokio::test]
    async fn open_missing_directory_is_path_not_found() {
        let tmp = TempDir::new().unwrap();
        let err = LocalDirectory::open(tmp.path().join("nope")).await.unwrap_err();
        assert!(matches!(err, CoreError::PathNotFound(_)));
    }

    #[tokio::test]
    async fn open_file_as_directory_is_path_not_found() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("f.txt"), "x").unwrap();
        let err = LocalDirectory::open(tmp.path().join("f.txt")).await.unwrap_err();
        assert!(matches!(err, CoreError::PathNotFound(_)));
    }

    #[tokio::test]
    async fn entries_yield_files_and_directories() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("a.txt"), "hello").unwrap();
        fs::create_dir(tmp.path().join("sub")).unwrap();

        let dir = LocalDirectory::open(tmp.path()).await.unwrap();
        assert_eq!(
            children(&dir).await,
            vec![
                ("a.txt".to_string(), crate::fs::EntryKind::File),
                ("sub".to_string(), crate::fs::EntryKind::Directory),
            ]
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn dangling_symlink_is_skipped() {
        let tmp = TempDir::new().unwrap();
        std::os::unix::fs::symlink(tmp.path().join("gone"), tmp.path().join("link")).unwrap();
        fs::write(tmp.path().join("kept.txt"), "").unwrap();

        let dir = LocalDirectory::open(tmp.path()).await.unwrap();
        let names: Vec<String> = children(&dir).await.into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["kept.txt"]);
    }

    #[tokio::test]
    async fn file_metadata_and_bytes() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("notes.txt"), "hello").unwrap();

        let dir = LocalDirectory::open(tmp.path()).await.unwrap();
        let file = dir.open_file("notes.txt").await.unwrap();
        let meta = file.metadata().await.unwrap();
        assert_eq!(meta.size, 5);
        assert_eq!(meta.mime_hint, "text/plain");
        assert_eq!(file.read_bytes().await.unwrap(), b"hello");
    }

    #[tokio::test]
    async fn open_wrong_kind_is_path_not_found() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("f.txt"), "").unwrap();
        fs::create_dir(tmp.path().join("d")).unwrap();

        let dir = LocalDirectory::open(tmp.path()).await.unwrap();
        assert!(matches!(
            dir.open_directory("f.txt").await.unwrap_err(),
            CoreError::PathNotFound(_)
        ));
        assert!(matches!(
            dir.open_file("d").await.unwrap_err(),
            CoreError::PathNotFound(_)
        ));
    }

    #[tokio::test]
    async fn open_child_picks_the_right_kind() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("f.txt"), "").unwrap();
        fs::create_dir(tmp.path().join("d")).unwrap();

        let dir = LocalDirectory::open(tmp.path()).await.unwrap();
        let f = dir.open_child("f.txt").await.unwrap();
        let d = dir.open_child("d").await.unwrap();
        assert_eq!(f.kind(), crate::fs::EntryKind::File);
        assert_eq!(d.kind(), crate::fs::EntryKind::Directory);
    }

    #[tokio::test]
    async fn parent_traversal_is_rejected() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir(tmp.path().join("inner")).unwrap();
        let dir = LocalDirectory::open(tmp.path().join("inner")).await.unwrap();
        assert!(matches!(
            dir.open_directory("..").await.unwrap_err(),
            CoreError::InvalidName(_)
        ));
    }

    #[tokio::test]
    async fn deleted_directory_becomes_invalid() {
        let tmp = TempDir::new().unwrap();
        let sub = tmp.path().join("sub");
        fs::create_dir(&sub).unwrap();
        let dir = LocalDirectory::open(&sub).await.unwrap();
        fs::remove_dir(&sub).unwrap();

        let err = dir.entries().await.err().unwrap();
        assert!(matches!(err, CoreError::HandleInvalid(_)));
    }

    #[tokio::test]
    async fn deleted_file_becomes_invalid() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("f.txt"), "x").unwrap();
        let dir = LocalDirectory::open(tmp.path()).await.unwrap();
        let file = dir.open_file("f.txt").await.unwrap();
        fs::remove_file(tmp.path().join("f.txt")).unwrap();

        assert!(matches!(
            file.read_bytes().await.unwrap_err(),
            CoreError::HandleInvalid(_)
        ));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn symlinks_cannot_leave_the_grant() {
        let tmp = TempDir::new().unwrap();
        let granted = tmp.path().join("granted");
        fs::create_dir_all(granted.join("photos")).unwrap();
        fs::create_dir(tmp.path().join("private")).unwrap();
        fs::write(tmp.path().join("secret.txt"), "top secret").unwrap();
        fs::write(granted.join("photos/cat.txt"), "meow").unwrap();
        std::os::unix::fs::symlink("../secret.txt", granted.join("leak.txt")).unwrap();
        std::os::unix::fs::symlink("../private", granted.join("leakdir")).unwrap();
        std::os::unix::fs::symlink("photos/cat.txt", granted.join("cat.txt")).unwrap();

        let dir = LocalDirectory::open(&granted).await.unwrap();
        let names: Vec<String> = children(&dir).await.into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["cat.txt", "photos"]);

        assert!(matches!(
            dir.open_file("leak.txt").await.unwrap_err(),
            CoreError::PermissionDenied(_)
        ));
        assert!(matches!(
            dir.open_directory("leakdir").await.unwrap_err(),
            CoreError::PermissionDenied(_)
        ));
        let inside = dir.open_file("cat.txt").await.unwrap();
        assert_eq!(inside.read_bytes().await.unwrap(), b"meow");
    }

    #[tokio::test]
    async fn boundary_is_inherited_by_subdirectories() {
        let tmp = TempDir::new().unwrap();
        let granted = tmp.path().join("granted");
        fs::create_dir_all(granted.join("sub")).unwrap();
        fs::write(tmp.path().join("outside.txt"), "x").unwrap();
        #[cfg(unix)]
        std::os::unix::fs::symlink("../../outside.txt", granted.join("sub/up.txt")).unwrap();

        let dir = LocalDirectory::open(&granted).await.unwrap();
        let sub = dir.open_directory("sub").await.unwrap();
        assert!(sub.open_file("up.txt").await.is_err());
    }

    #[tokio::test]
    async fn decomposed_names_resolve_by_listed_name() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("\u{1100}\u{1161}.txt"), "hangul").unwrap();

        let dir = LocalDirectory::open(tmp.path()).await.unwrap();
        let names: Vec<String> = children(&dir).await.into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["\u{AC00}.txt"]);

        let file = dir.open_file("\u{AC00}.txt").await.unwrap();
        assert_eq!(file.name(), "\u{AC00}.txt");
        assert_eq!(file.read_bytes().await.unwrap(), b"hangul");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn special_files_are_not_files() {
        let tmp = TempDir::new().unwrap();
        let status = std::process::Command::new("mkfifo")
            .arg(tmp.path().join("pipe"))
            .status()
            .unwrap();
        assert!(status.success());
        fs::write(tmp.path().join("plain.txt"), "").unwrap();

        let dir = LocalDirectory::open(tmp.path()).await.unwrap();
        assert!(matches!(
            dir.open_file("pipe").await.unwrap_err(),
            CoreError::PathNotFound(_)
        ));
        let names: Vec<String> = children(&dir).await.into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["plain.txt"]);
    }
}
