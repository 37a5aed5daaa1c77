//! dirgrid core library: capability-based directory browsing with a
//! thumbnail grid.
//!
//! `dirgrid-core` has no UI. A frontend obtains a directory grant through a
//! [`DirectoryPicker`], keeps it in a [`Workspace`], and feeds a
//! [`GridRenderer`]'s [`GridEvent`]s into whatever it draws with.
//!
//! # Modules
//!
//! - [`fs`] — Capability handles, listing, path resolution, classification, thumbnails.
//! - [`grid`] — Render passes over one directory level and the [`GridModel`] render target.
//! - [`nav`] — Recently opened roots.
//! - [`workspace`] — Session context and directory pickers.
//! - [`config`] — TOML settings.
//! - [`event`] — Events from the renderer to the render target.
//! - [`error`] — Unified error type ([`CoreError`]) and result alias ([`CoreResult`]).

pub mod config;
pub mod error;
pub mod event;
pub mod fs;
pub mod grid;
pub mod nav;
pub mod workspace;

pub use config::Config;
pub use error::{CoreError, CoreResult};
pub use event::{GridEvent, Tile, TileVisual};
pub use fs::{
    classify, list_directory, read_file_as_base64, read_file_as_text, resolve_directory,
    resolve_file, DirectoryHandle, EntryDescriptor, EntryKind, FileContent, FileHandle, Handle,
    IconId, Listing, PreviewClass, RenderableImage, ThumbnailPipeline,
};
pub use grid::{GridModel, GridRenderer, RenderPass};
pub use nav::{RecentPaths, RecentPathsStore};
pub use workspace::{DirectoryGrant, DirectoryPicker, LocalPicker, Workspace};

/// Normalises a string to NFC (composed) form.
///
/// macOS stores filenames in NFD (decomposed), which splits Korean Hangul
/// into individual Jamo. This helper re-composes them.
pub fn nfc_string(s: &str) -> String {
    use unicode_normalization::UnicodeNormalization;
    s.nfc().collect()
}
