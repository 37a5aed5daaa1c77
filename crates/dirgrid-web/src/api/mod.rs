pub mod files;

use axum::routing::{get, post};
use axum::Router;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/recent", get(files::recent_paths))
        .route("/workspace", post(files::select_workspace))
        .route("/list", get(files::list_directory))
        .route("/file", get(files::read_file))
}
