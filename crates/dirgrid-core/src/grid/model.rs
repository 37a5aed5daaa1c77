//! Render-target state built from [`GridEvent`]s.

use crate::event::{GridEvent, Tile, TileVisual};

/// The grid as a render target sees it.
///
/// Events from a pass older than the latest `Cleared` are ignored, so a
/// late thumbnail from a previous directory never lands in the current one.
#[derive(Debug, Clone, Default)]
pub struct GridModel {
    pass: Option<u64>,
    path: String,
    empty_notice: bool,
    tiles: Vec<Tile>,
}

impl GridModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies one event. Returns `false` if the event was stale or
    /// referred to an unknown slot.
    pub fn apply(&mut self, event: GridEvent) -> bool {
        match event {
            GridEvent::Cleared { pass, path } => {
                if self.pass.is_some_and(|current| pass < current) {
                    return false;
                }
                self.pass = Some(pass);
                self.path = path;
                self.empty_notice = false;
                self.tiles.clear();
                true
            }
            GridEvent::Empty { pass } => {
                if !self.is_current(pass) {
                    return false;
                }
                self.empty_notice = true;
                true
            }
            GridEvent::Tile { pass, slot, tile } => {
                if !self.is_current(pass) {
                    return false;
                }
                if slot < self.tiles.len() {
                    self.tiles[slot] = tile;
                } else if slot == self.tiles.len() {
                    self.tiles.push(tile);
                } else {
                    return false;
                }
                true
            }
            GridEvent::Thumbnail { pass, slot, image } => {
                self.set_visual(pass, slot, TileVisual::Thumbnail { image })
            }
            GridEvent::ThumbnailFailed {
                pass, slot, icon, ..
            } => self.set_visual(pass, slot, TileVisual::Icon { icon }),
        }
    }

    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    /// Whether the "empty directory" notice is shown.
    pub fn shows_empty_notice(&self) -> bool {
        self.empty_notice
    }

    pub fn pass(&self) -> Option<u64> {
        self.pass
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    fn is_current(&self, pass: u64) -> bool {
        self.pass == Some(pass)
    }

    fn set_visual(&mut self, pass: u64, slot: usize, visual: TileVisual) -> bool {
        if !self.is_current(pass) {
            return false;
        }
        match self.tiles.get_mut(slot) {
            Some(tile) => {
                tile.visual = visual;
                true
            }
            None => false,
        }
    }
}
