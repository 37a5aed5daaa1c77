use axum::extract::{Query, State};
use axum::Json;
use dirgrid_core::fs::content::{ContentEncoding, FileContent};
use dirgrid_core::LocalPicker;

use crate::dto::{
    FileQuery, ListDirQuery, ListDirResponse, RecentResponse, SelectWorkspaceRequest,
    SelectWorkspaceResponse,
};
use crate::error::AppError;
use crate::state::AppState;

pub async fn recent_paths(State(state): State<AppState>) -> Json<RecentResponse> {
    let workspace = state.workspace.lock().await;
    Json(RecentResponse {
        paths: workspace.recent_paths().paths().to_vec(),
    })
}

pub async fn select_workspace(
    State(state): State<AppState>,
    Json(req): Json<SelectWorkspaceRequest>,
) -> Result<Json<SelectWorkspaceResponse>, AppError> {
    let allowed_root = &state.config.filesystem.root;
    let mut workspace = state.workspace.lock().await;
    let granted = match req.path {
        Some(path) => {
            workspace.open_path(allowed_root, &path).await?;
            true
        }
        None => {
            let cancelled = LocalPicker::new(allowed_root, None);
            workspace.select_directory(&cancelled).await?
        }
    };

    Ok(Json(SelectWorkspaceResponse {
        granted,
        root: workspace.display_path(),
        recent: workspace.recent_paths().paths().to_vec(),
    }))
}

pub async fn list_directory(
    State(state): State<AppState>,
    Query(query): Query<ListDirQuery>,
) -> Result<Json<ListDirResponse>, AppError> {
    let listing = {
        let workspace = state.workspace.lock().await;
        workspace.list(query.path.as_deref().unwrap_or("")).await?
    };

    let listing = if state.config.core.listing.sort_entries {
        listing.sorted()
    } else {
        listing
    };

    Ok(Json(ListDirResponse::from(&listing)))
}

pub async fn read_file(
    State(state): State<AppState>,
    Query(query): Query<FileQuery>,
) -> Result<Json<FileContent>, AppError> {
    let workspace = state.workspace.lock().await;
    let content = match ContentEncoding::from(query.encoding) {
        ContentEncoding::Base64 => workspace.read_file_as_base64(&query.path).await?,
        ContentEncoding::Text => workspace.read_file_as_text(&query.path).await?,
    };
    Ok(Json(content))
}
