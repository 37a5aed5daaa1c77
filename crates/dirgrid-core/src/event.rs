//! Events emitted by the grid renderer.
//!
//! A render pass first emits [`GridEvent::Cleared`], then either
//! [`GridEvent::Empty`] or one [`GridEvent::Tile`] per entry. Thumbnail
//! results follow later, one event per slot, in whatever order they finish.
//! Every event carries the id of the pass that produced it so that a render
//! target can drop results belonging to an older pass.

use serde::Serialize;

use crate::fs::classify::IconId;
use crate::fs::handle::EntryKind;
use crate::fs::thumbnail::RenderableImage;

/// What a tile currently shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum TileVisual {
    /// A static icon, final.
    Icon { icon: IconId },
    /// A placeholder icon while the thumbnail is being generated.
    Pending { icon: IconId },
    /// A generated thumbnail.
    Thumbnail { image: RenderableImage },
}

/// One grid slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tile {
    pub name: String,
    pub relative_path: String,
    pub kind: EntryKind,
    pub visual: TileVisual,
}

/// A notification from the renderer to its render target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GridEvent {
    /// A new pass started; everything shown so far is discarded.
    Cleared { pass: u64, path: String },
    /// The listed directory has no entries.
    Empty { pass: u64 },
    /// A tile for `slot`, emitted in slot order.
    Tile { pass: u64, slot: usize, tile: Tile },
    /// The thumbnail for `slot` is ready.
    Thumbnail {
        pass: u64,
        slot: usize,
        image: RenderableImage,
    },
    /// The thumbnail for `slot` could not be produced; the tile keeps its
    /// fallback icon.
    ThumbnailFailed {
        pass: u64,
        slot: usize,
        icon: IconId,
        error: String,
    },
}

impl GridEvent {
    /// Id of the pass this event belongs to.
    pub fn pass(&self) -> u64 {
        match self {
            GridEvent::Cleared { pass, .. }
            | GridEvent::Empty { pass }
            | GridEvent::Tile { pass, .. }
            | GridEvent::Thumbnail { pass, .. }
            | GridEvent::ThumbnailFailed { pass, .. } => *pass,
        }
    }
}
