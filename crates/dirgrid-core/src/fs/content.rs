//! Whole-file readers addressed by relative path.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::Serialize;

use crate::error::CoreResult;
use crate::fs::handle::DirectoryHandle;
use crate::fs::resolve::resolve_file;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentEncoding {
    Base64,
    Text,
}

/// A file's metadata plus its full content in the requested encoding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileContent {
    pub name: String,
    #[serde(rename = "type")]
    pub mime_hint: String,
    pub size: u64,
    /// Milliseconds since the Unix epoch.
    pub last_modified: u64,
    pub content: String,
    pub encoding: ContentEncoding,
}

/// Reads the file at `relative_path` below `root` as base64.
///
/// # Errors
///
/// Propagates resolution errors ([`crate::CoreError::PathNotFound`],
/// [`crate::CoreError::HandleInvalid`]) and read failures.
pub async fn read_file_as_base64(
    root: &Arc<dyn DirectoryHandle>,
    relative_path: &str,
) -> CoreResult<FileContent> {
    read_file(root, relative_path, ContentEncoding::Base64).await
}

/// Reads the file at `relative_path` below `root` as text.
///
/// Invalid UTF-8 sequences are replaced with U+FFFD.
///
/// # Errors
///
/// Same as [`read_file_as_base64`].
pub async fn read_file_as_text(
    root: &Arc<dyn DirectoryHandle>,
    relative_path: &str,
) -> CoreResult<FileContent> {
    read_file(root, relative_path, ContentEncoding::Text).await
}

async fn read_file(
    root: &Arc<dyn DirectoryHandle>,
    relative_path: &str,
    encoding: ContentEncoding,
) -> CoreResult<FileContent> {
    let file = resolve_file(root, relative_path).await?;
    let metadata = file.metadata().await?;
    let bytes = file.read_bytes().await?;

    let content = match encoding {
        ContentEncoding::Base64 => BASE64.encode(&bytes),
        ContentEncoding::Text => String::from_utf8_lossy(&bytes).into_owned(),
    };

    Ok(FileContent {
        name: file.name().to_string(),
        mime_hint: metadata.mime_hint,
        size: metadata.size,
        last_modified: epoch_millis(metadata.last_modified),
        content,
        encoding,
    })
}

/// Milliseconds since the Unix epoch, `0` for earlier times.
pub fn epoch_millis(time: SystemTime) -> u64 {
    time.duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
