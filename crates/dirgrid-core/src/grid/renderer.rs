//! Grid rendering for one directory level.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::config::Config;
use crate::error::CoreResult;
use crate::event::{GridEvent, Tile, TileVisual};
use crate::fs::classify::{classify, fallback_icon, folder_icon, PreviewClass};
use crate::fs::entry::EntryDescriptor;
use crate::fs::handle::DirectoryHandle;
use crate::fs::listing::list_directory;
use crate::fs::thumbnail::ThumbnailPipeline;

/// Handle to one render pass.
///
/// Thumbnail tasks spawned by the pass run until they finish or until the
/// pass is cancelled, either explicitly or by the next
/// [`GridRenderer::render`] call on the same renderer.
#[derive(Debug)]
pub struct RenderPass {
    id: u64,
    token: CancellationToken,
    tracker: TaskTracker,
    tiles: usize,
    pending: usize,
}

impl RenderPass {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Number of tiles emitted.
    pub fn tile_count(&self) -> usize {
        self.tiles
    }

    /// Number of thumbnails that were scheduled.
    pub fn pending_thumbnails(&self) -> usize {
        self.pending
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Waits until every thumbnail task of this pass has finished or
    /// observed cancellation.
    pub async fn finished(&self) {
        self.tracker.wait().await;
    }
}

/// Turns a directory into a stream of [`GridEvent`]s.
pub struct GridRenderer {
    pipeline: Arc<ThumbnailPipeline>,
    thumbnails_enabled: bool,
    sort_entries: bool,
    next_pass: AtomicU64,
    active: Mutex<Option<CancellationToken>>,
}

impl GridRenderer {
    pub fn new(pipeline: Arc<ThumbnailPipeline>, config: &Config) -> Self {
        Self {
            pipeline,
            thumbnails_enabled: config.thumbnails.enabled,
            sort_entries: config.listing.sort_entries,
            next_pass: AtomicU64::new(0),
            active: Mutex::new(None),
        }
    }

    /// Renders the directory behind `dir` into `tx`.
    ///
    /// The listing is complete and every tile has been sent by the time this
    /// returns; thumbnails are generated afterwards by background tasks, each
    /// of which updates only its own slot. A thumbnail failure is reported
    /// as [`GridEvent::ThumbnailFailed`] and never surfaces here.
    ///
    /// Once the listing succeeds, the previous pass of this renderer is
    /// cancelled.
    ///
    /// # Errors
    ///
    /// Listing errors propagate unchanged; no event is sent in that case.
    pub async fn render(
        &self,
        dir: &dyn DirectoryHandle,
        base_path: &str,
        tx: &UnboundedSender<GridEvent>,
    ) -> CoreResult<RenderPass> {
        let listing = list_directory(dir, base_path).await?;
        let listing = if self.sort_entries {
            listing.sorted()
        } else {
            listing
        };

        // A failed listing leaves the pass on screen untouched.
        let mut pass = self.begin_pass();

        let _ = tx.send(GridEvent::Cleared {
            pass: pass.id,
            path: listing.path.clone(),
        });

        if listing.is_empty() {
            let _ = tx.send(GridEvent::Empty { pass: pass.id });
        }

        for entry in &listing.directories {
            let visual = TileVisual::Icon {
                icon: folder_icon(),
            };
            emit_tile(&mut pass, entry, visual, tx);
        }

        for entry in &listing.files {
            let class = classify(entry.name());
            let visual = match class {
                PreviewClass::StaticIcon(icon) => TileVisual::Icon { icon },
                _ if !self.thumbnails_enabled => TileVisual::Icon {
                    icon: fallback_icon(class),
                },
                _ => TileVisual::Pending {
                    icon: fallback_icon(class),
                },
            };
            let needs_thumbnail = matches!(visual, TileVisual::Pending { .. });
            let slot = emit_tile(&mut pass, entry, visual, tx);
            if needs_thumbnail {
                self.spawn_thumbnail(&mut pass, slot, entry, class, tx);
            }
        }

        pass.tracker.close();
        tracing::debug!(
            "Render pass {} for {:?}: {} tiles, {} thumbnails pending",
            pass.id,
            listing.path,
            pass.tiles,
            pass.pending
        );
        Ok(pass)
    }

    /// Cancels the active pass, if any.
    pub fn cancel_active(&self) {
        let mut active = self.active.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(token) = active.take() {
            token.cancel();
        }
    }

    fn begin_pass(&self) -> RenderPass {
        let id = self.next_pass.fetch_add(1, Ordering::SeqCst) + 1;
        let token = CancellationToken::new();

        let mut active = self.active.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = active.replace(token.clone()) {
            previous.cancel();
        }

        RenderPass {
            id,
            token,
            tracker: TaskTracker::new(),
            tiles: 0,
            pending: 0,
        }
    }

    fn spawn_thumbnail(
        &self,
        pass: &mut RenderPass,
        slot: usize,
        entry: &EntryDescriptor,
        class: PreviewClass,
        tx: &UnboundedSender<GridEvent>,
    ) {
        let Some(file) = entry.file_handle().cloned() else {
            return;
        };
        let pipeline = Arc::clone(&self.pipeline);
        let token = pass.token.clone();
        let tx = tx.clone();
        let pass_id = pass.id;
        let path = entry.relative_path().to_string();

        pass.pending += 1;
        pass.tracker.spawn(async move {
            let result = tokio::select! {
                _ = token.cancelled() => {
                    tracing::debug!("Thumbnail for {path} cancelled (pass {pass_id})");
                    return;
                }
                result = pipeline.produce(file.as_ref(), class) => result,
            };

            let event = match result {
                Ok(image) => GridEvent::Thumbnail {
                    pass: pass_id,
                    slot,
                    image,
                },
                Err(e) => {
                    if e.is_isolated() {
                        tracing::warn!("Thumbnail failed for {path}: {e}");
                    } else {
                        tracing::error!("Thumbnail for {path} lost its source: {e}");
                    }
                    GridEvent::ThumbnailFailed {
                        pass: pass_id,
                        slot,
                        icon: fallback_icon(class),
                        error: e.to_string(),
                    }
                }
            };
            let _ = tx.send(event);
        });
    }
}

fn emit_tile(
    pass: &mut RenderPass,
    entry: &EntryDescriptor,
    visual: TileVisual,
    tx: &UnboundedSender<GridEvent>,
) -> usize {
    let slot = pass.tiles;
    pass.tiles += 1;
    let _ = tx.send(GridEvent::Tile {
        pass: pass.id,
        slot,
        tile: Tile {
            name: entry.name().to_string(),
            relative_path: entry.relative_path().to_string(),
            kind: entry.kind(),
            visual,
        },
    });
    slot
}
