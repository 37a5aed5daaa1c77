mod api;
mod config;
mod dto;
mod error;
mod middleware;
mod state;
mod ws;

use axum::http::{header, Method};
use axum::middleware::from_fn;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::ServerConfig;
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "dirgrid_web=debug,dirgrid_core=debug,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::load()?;
    let bind_addr = config.bind_addr;
    tracing::info!("Serving directories under {}", config.filesystem.root.display());
    let state = AppState::new(config);

    // CORS: same-origin only by default (no cross-origin requests allowed)
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]);

    let app = axum::Router::new()
        .nest("/api", api::router())
        .nest("/ws", ws::router())
        .layer(from_fn(middleware::security_headers::security_headers))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    tracing::info!("dirgrid-web listening on http://{}", bind_addr);
    axum::serve(listener, app).await?;

    Ok(())
}
