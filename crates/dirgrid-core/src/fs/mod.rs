//! File system abstractions for dirgrid.
//!
//! Everything below the granted root is reached through capability handles
//! ([`handle::DirectoryHandle`], [`handle::FileHandle`]); there are no
//! absolute paths past this module. [`local`] backs them with the real
//! filesystem, [`memory`] with an in-memory tree.
//!
//! On top of the handles sit the listing ([`listing::list_directory`]), path
//! resolution ([`resolve`]), whole-file readers ([`content`]), name-based
//! classification ([`classify`]) and thumbnail generation ([`thumbnail`]).

pub mod classify;
pub mod content;
pub mod entry;
pub mod handle;
pub mod listing;
pub mod local;
pub mod memory;
pub mod resolve;
pub mod thumbnail;
pub mod video;

pub use classify::{classify, IconId, PreviewClass};
pub use content::{read_file_as_base64, read_file_as_text, ContentEncoding, FileContent};
pub use entry::EntryDescriptor;
pub use handle::{ChildEntry, DirectoryHandle, EntryKind, FileHandle, FileMetadata, Handle};
pub use listing::{list_directory, Listing};
pub use local::{LocalDirectory, LocalFile};
pub use memory::{MemoryDirectory, MemoryFile};
pub use resolve::{resolve_directory, resolve_file};
pub use thumbnail::{RenderableImage, ThumbnailPipeline};
pub use video::{FfmpegFrameExtractor, FrameExtractor};
