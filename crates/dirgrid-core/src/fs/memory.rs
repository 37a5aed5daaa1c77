//! In-memory backend.
//!
//! Builds a directory tree out of plain values. Handles can be revoked and
//! files can be told to fail, which makes stale-handle and I/O-failure paths
//! easy to exercise without touching the disk.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::SystemTime;

use async_trait::async_trait;
use futures::StreamExt;
use tokio::sync::Notify;

use crate::error::{CoreError, CoreResult};
use crate::fs::handle::{
    mime_hint_for, validate_child_name, ChildEntry, ChildStream, DirectoryHandle, FileHandle,
    FileMetadata, Handle,
};

#[derive(Debug, Clone)]
enum MemoryNode {
    File(MemoryFile),
    Directory(MemoryDirectory),
}

impl MemoryNode {
    fn name(&self) -> &str {
        match self {
            MemoryNode::File(f) => &f.name,
            MemoryNode::Directory(d) => &d.name,
        }
    }

    fn to_handle(&self) -> Handle {
        match self {
            MemoryNode::File(f) => Handle::File(Arc::new(f.clone())),
            MemoryNode::Directory(d) => Handle::Directory(Arc::new(d.clone())),
        }
    }
}

/// An in-memory directory. Children keep insertion order.
#[derive(Debug, Clone)]
pub struct MemoryDirectory {
    name: String,
    children: Vec<MemoryNode>,
    revoked: Arc<AtomicBool>,
}

impl MemoryDirectory {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            children: Vec::new(),
            revoked: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Returns a new directory with `file` appended.
    #[must_use]
    pub fn with_file(mut self, file: MemoryFile) -> Self {
        self.children.push(MemoryNode::File(file));
        self
    }

    /// Returns a new directory with `dir` appended.
    #[must_use]
    pub fn with_directory(mut self, dir: MemoryDirectory) -> Self {
        self.children.push(MemoryNode::Directory(dir));
        self
    }

    /// Marks this directory (and every handle cloned from it) as revoked.
    pub fn revoke(&self) {
        self.revoked.store(true, Ordering::SeqCst);
    }

    pub fn into_handle(self) -> Arc<dyn DirectoryHandle> {
        Arc::new(self)
    }

    fn ensure_valid(&self) -> CoreResult<()> {
        if self.revoked.load(Ordering::SeqCst) {
            return Err(CoreError::HandleInvalid(self.name.clone()));
        }
        Ok(())
    }

    fn child(&self, name: &str) -> CoreResult<&MemoryNode> {
        validate_child_name(name)?;
        self.ensure_valid()?;
        self.children
            .iter()
            .find(|c| c.name() == name)
            .ok_or_else(|| CoreError::PathNotFound(name.to_string()))
    }
}

#[async_trait]
impl DirectoryHandle for MemoryDirectory {
    fn name(&self) -> &str {
        &self.name
    }

    async fn entries(&self) -> CoreResult<ChildStream> {
        self.ensure_valid()?;
        let children: Vec<CoreResult<ChildEntry>> = self
            .children
            .iter()
            .map(|c| {
                Ok(ChildEntry {
                    name: c.name().to_string(),
                    handle: c.to_handle(),
                })
            })
            .collect();
        Ok(futures::stream::iter(children).boxed())
    }

    async fn open_directory(&self, name: &str) -> CoreResult<Arc<dyn DirectoryHandle>> {
        match self.child(name)? {
            MemoryNode::Directory(d) => Ok(Arc::new(d.clone())),
            MemoryNode::File(_) => Err(CoreError::PathNotFound(name.to_string())),
        }
    }

    async fn open_file(&self, name: &str) -> CoreResult<Arc<dyn FileHandle>> {
        match self.child(name)? {
            MemoryNode::File(f) => Ok(Arc::new(f.clone())),
            MemoryNode::Directory(_) => Err(CoreError::PathNotFound(name.to_string())),
        }
    }
}

/// An in-memory file.
#[derive(Debug, Clone)]
pub struct MemoryFile {
    name: String,
    bytes: Arc<Vec<u8>>,
    last_modified: SystemTime,
    fail_metadata: bool,
    fail_read: bool,
    gate: Option<Arc<Notify>>,
}

impl MemoryFile {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: Arc::new(bytes.into()),
            last_modified: SystemTime::UNIX_EPOCH,
            fail_metadata: false,
            fail_read: false,
            gate: None,
        }
    }

    #[must_use]
    pub fn modified_at(mut self, when: SystemTime) -> Self {
        self.last_modified = when;
        self
    }

    /// Metadata fetches fail with [`CoreError::Io`].
    #[must_use]
    pub fn failing_metadata(mut self) -> Self {
        self.fail_metadata = true;
        self
    }

    /// Byte reads fail with [`CoreError::Io`].
    #[must_use]
    pub fn failing_read(mut self) -> Self {
        self.fail_read = true;
        self
    }

    /// Byte reads wait until `gate` is notified.
    #[must_use]
    pub fn gated(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }

    fn injected(&self, what: &str) -> CoreError {
        CoreError::io(
            self.name.clone(),
            std::io::Error::new(std::io::ErrorKind::Other, format!("injected {what} failure")),
        )
    }
}

#[async_trait]
impl FileHandle for MemoryFile {
    fn name(&self) -> &str {
        &self.name
    }

    async fn metadata(&self) -> CoreResult<FileMetadata> {
        if self.fail_metadata {
            return Err(self.injected("metadata"));
        }
        Ok(FileMetadata {
            size: self.bytes.len() as u64,
            mime_hint: mime_hint_for(&self.name),
            last_modified: self.last_modified,
        })
    }

    async fn read_bytes(&self) -> CoreResult<Vec<u8>> {
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        if self.fail_read {
            return Err(self.injected("read"));
        }
        Ok(self.bytes.as_ref().clone())
    }
}
