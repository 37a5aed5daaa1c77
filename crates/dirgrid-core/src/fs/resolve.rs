//! Path resolution by handle-by-handle descent.
//!
//! There is no way to open a node by string path. A `/`-separated path is
//! resolved by opening each segment from the previous segment's handle,
//! starting at a held root. Nothing is cached between calls.

use std::sync::Arc;

use crate::error::{CoreError, CoreResult};
use crate::fs::handle::{DirectoryHandle, FileHandle};

/// Splits `path` on `/`, dropping empty segments.
///
/// Leading, trailing and repeated separators are therefore harmless.
pub fn split_path(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

/// Canonical `/`-joined form of `path` (no empty segments).
pub fn normalize_path(path: &str) -> String {
    split_path(path).join("/")
}

/// Resolves `relative_path` to a file below `root`.
///
/// # Errors
///
/// - [`CoreError::PathNotFound`] if the path is empty, an intermediate segment
///   is missing or not a directory, or the last segment is missing or not a
///   file. The error carries the path up to the failing segment.
/// - [`CoreError::HandleInvalid`] if `root` (or a derived handle) is stale.
/// - [`CoreError::Io`] for other failures while opening a segment.
pub async fn resolve_file(
    root: &Arc<dyn DirectoryHandle>,
    relative_path: &str,
) -> CoreResult<Arc<dyn FileHandle>> {
    let segments = split_path(relative_path);
    let Some((file_name, parents)) = segments.split_last() else {
        return Err(CoreError::PathNotFound(relative_path.to_string()));
    };

    let parent = descend(root, parents).await?;
    parent
        .open_file(file_name)
        .await
        .map_err(|e| not_found_at(e, &segments))
}

/// Resolves `relative_path` to a directory below `root`.
///
/// An empty path resolves to `root` itself.
///
/// # Errors
///
/// Same as [`resolve_file`], except that every segment must be a directory.
pub async fn resolve_directory(
    root: &Arc<dyn DirectoryHandle>,
    relative_path: &str,
) -> CoreResult<Arc<dyn DirectoryHandle>> {
    descend(root, &split_path(relative_path)).await
}

/// Opens each segment as a directory, strictly in order.
async fn descend(
    root: &Arc<dyn DirectoryHandle>,
    segments: &[&str],
) -> CoreResult<Arc<dyn DirectoryHandle>> {
    let mut current = Arc::clone(root);
    for (depth, segment) in segments.iter().enumerate() {
        current = current
            .open_directory(segment)
            .await
            .map_err(|e| not_found_at(e, &segments[..=depth]))?;
    }
    Ok(current)
}

fn not_found_at(err: CoreError, segments: &[&str]) -> CoreError {
    match err {
        CoreError::PathNotFound(_) | CoreError::InvalidName(_) => {
            CoreError::PathNotFound(segments.join("/"))
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::memory::{MemoryDirectory, MemoryFile};

    fn root() -> Arc<dyn DirectoryHandle> {
        MemoryDirectory::new("root")
            .with_file(MemoryFile::new("top.txt", "top"))
            .with_directory(
                MemoryDirectory::new("a").with_directory(
                    MemoryDirectory::new("b").with_file(MemoryFile::new("c.txt", "deep")),
                ),
            )
            .into_handle()
    }

    #[test]
    fn split_path_drops_empty_segments() {
        assert_eq!(split_path("/a//b/c.txt/"), vec!["a", "b", "c.txt"]);
        assert!(split_path("///").is_empty());
        assert_eq!(normalize_path("//x/y/"), "x/y");
    }

    #[tokio::test]
    async fn resolves_nested_file() {
        let file = resolve_file(&root(), "a/b/c.txt").await.unwrap();
        assert_eq!(file.name(), "c.txt");
        assert_eq!(file.read_bytes().await.unwrap(), b"deep");
    }

    #[tokio::test]
    async fn separator_noise_resolves_identically() {
        let root = root();
        let clean = resolve_file(&root, "a/b/c.txt").await.unwrap();
        let noisy = resolve_file(&root, "/a//b/c.txt/").await.unwrap();
        assert_eq!(clean.name(), noisy.name());
        assert_eq!(
            clean.read_bytes().await.unwrap(),
            noisy.read_bytes().await.unwrap()
        );
    }

    #[tokio::test]
    async fn resolves_top_level_file() {
        let file = resolve_file(&root(), "top.txt").await.unwrap();
        assert_eq!(file.read_bytes().await.unwrap(), b"top");
    }

    #[tokio::test]
    async fn intermediate_file_segment_is_path_not_found() {
        let err = resolve_file(&root(), "top.txt/c.txt").await.unwrap_err();
        assert!(matches!(err, CoreError::PathNotFound(ref p) if p == "top.txt"));
    }

    #[tokio::test]
    async fn missing_segment_reports_prefix() {
        let err = resolve_file(&root(), "a/nope/c.txt").await.unwrap_err();
        assert!(matches!(err, CoreError::PathNotFound(ref p) if p == "a/nope"));
    }

    #[tokio::test]
    async fn final_directory_segment_is_path_not_found() {
        let err = resolve_file(&root(), "a/b").await.unwrap_err();
        assert!(matches!(err, CoreError::PathNotFound(ref p) if p == "a/b"));
    }

    #[tokio::test]
    async fn empty_path_is_path_not_found() {
        let err = resolve_file(&root(), "//").await.unwrap_err();
        assert!(matches!(err, CoreError::PathNotFound(_)));
    }

    #[tokio::test]
    async fn dot_dot_does_not_escape() {
        let err = resolve_file(&root(), "a/../top.txt").await.unwrap_err();
        assert!(matches!(err, CoreError::PathNotFound(_)));
    }

    #[tokio::test]
    async fn resolve_directory_empty_path_is_root() {
        let root = root();
        let dir = resolve_directory(&root, "/").await.unwrap();
        assert_eq!(dir.name(), "root");
    }

    #[tokio::test]
    async fn resolve_directory_nested() {
        let dir = resolve_directory(&root(), "a/b").await.unwrap();
        assert_eq!(dir.name(), "b");
    }

    #[tokio::test]
    async fn stale_root_is_handle_invalid() {
        let tree = MemoryDirectory::new("root").with_file(MemoryFile::new("f", ""));
        let handle = tree.clone().into_handle();
        tree.revoke();
        let err = resolve_file(&handle, "f").await.unwrap_err();
        assert!(matches!(err, CoreError::HandleInvalid(_)));
    }
}
