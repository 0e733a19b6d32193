use std::net::SocketAddr;

use anyhow::Context;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::api::handlers::{handle_generate_tweet, handle_health, handle_root, handle_stream, AppState};

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(handle_root))
        .route("/health", get(handle_health))
        .route("/stream", post(handle_stream))
        .route("/generate_tweet", post(handle_generate_tweet))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub struct AppServer {
    pub addr: SocketAddr,
    pub state: AppState,
}

impl AppServer {
    pub fn new(addr: SocketAddr, state: AppState) -> Self {
        Self { addr, state }
    }

    /// Serves until ctrl-c. In-flight requests are allowed to finish.
    pub async fn start(self) -> anyhow::Result<()> {
        let app = build_router(self.state);
        let server = axum::Server::try_bind(&self.addr).with_context(|| format!("failed to bind {}", self.addr))?;
        info!(addr = %self.addr, "listening");
        server
            .serve(app.into_make_service())
            .with_graceful_shutdown(shutdown_signal())
            .await
            .context("server error")
    }
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutdown requested");
    }
}
