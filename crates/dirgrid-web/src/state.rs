use std::sync::Arc;

use dirgrid_core::{RecentPathsStore, ThumbnailPipeline, Workspace};
use tokio::sync::Mutex;

use crate::config::ServerConfig;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub workspace: Arc<Mutex<Workspace>>,
    /// Shared by every grid socket so `max_concurrent` bounds the whole server.
    pub pipeline: Arc<ThumbnailPipeline>,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Self {
        let recent = match &config.core.recent.file {
            Some(file) => RecentPathsStore::load(file),
            None => RecentPathsStore::in_memory(),
        };
        let pipeline = ThumbnailPipeline::new(&config.core.thumbnails);
        Self {
            config: Arc::new(config),
            workspace: Arc::new(Mutex::new(Workspace::new(recent))),
            pipeline: Arc::new(pipeline),
        }
    }
}
