use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Query, State, WebSocketUpgrade};
use axum::response::IntoResponse;
use dirgrid_core::fs::resolve::normalize_path;
use dirgrid_core::{resolve_directory, CoreResult, GridEvent, GridRenderer};
use futures::stream::SplitSink;
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;

use crate::state::AppState;

#[derive(Deserialize)]
pub struct GridQuery {
    path: Option<String>,
}

#[derive(Deserialize)]
#[serde(tag = "type")]
enum ClientMessage {
    /// Render another directory; the pass in flight is cancelled.
    #[serde(rename = "open")]
    Open { path: String },
}

pub async fn grid_handler(
    State(state): State<AppState>,
    Query(query): Query<GridQuery>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    let path = query.path.unwrap_or_default();
    ws.on_upgrade(move |socket| handle_grid(socket, state, path))
}

async fn handle_grid(socket: WebSocket, state: AppState, initial_path: String) {
    let (mut ws_sender, mut ws_receiver) = socket.split();
    let renderer = GridRenderer::new(Arc::clone(&state.pipeline), &state.config.core);
    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<GridEvent>();

    if let Err(e) = start_pass(&state, &renderer, &initial_path, &event_tx).await {
        if send_error(&mut ws_sender, &e.to_string()).await.is_err() {
            return;
        }
    }

    loop {
        tokio::select! {
            event = event_rx.recv() => {
                // The socket holds a sender, so the channel never closes here.
                let Some(event) = event else { break };
                let text = match serde_json::to_string(&event) {
                    Ok(text) => text,
                    Err(e) => {
                        tracing::error!("Failed to serialize grid event: {e}");
                        continue;
                    }
                };
                if ws_sender.send(Message::Text(text.into())).await.is_err() {
                    break;
                }
            }
            ws_msg = ws_receiver.next() => {
                match ws_msg {
                    Some(Ok(Message::Text(text))) => {
                        match serde_json::from_str::<ClientMessage>(&text) {
                            Ok(ClientMessage::Open { path }) => {
                                if let Err(e) = start_pass(&state, &renderer, &path, &event_tx).await {
                                    if send_error(&mut ws_sender, &e.to_string()).await.is_err() {
                                        break;
                                    }
                                }
                            }
                            Err(e) => tracing::debug!("Ignoring grid message: {e}"),
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        break;
                    }
                    _ => {}
                }
            }
        }
    }

    renderer.cancel_active();
}

async fn start_pass(
    state: &AppState,
    renderer: &GridRenderer,
    path: &str,
    tx: &mpsc::UnboundedSender<GridEvent>,
) -> CoreResult<()> {
    // Only the root is taken under the lock; rendering runs without it.
    let root = {
        let workspace = state.workspace.lock().await;
        Arc::clone(workspace.root()?)
    };
    let path = normalize_path(path);
    let dir = resolve_directory(&root, &path).await?;
    let pass = renderer.render(dir.as_ref(), &path, tx).await?;
    tracing::debug!("Grid pass {} started for {:?}", pass.id(), path);
    Ok(())
}

async fn send_error(
    ws_sender: &mut SplitSink<WebSocket, Message>,
    message: &str,
) -> Result<(), axum::Error> {
    let msg = serde_json::json!({
        "type": "error",
        "message": message,
    });
    ws_sender.send(Message::Text(msg.to_string().into())).await
}
