/*
[INPUT]:  Hub configuration, bound TCP listener, shutdown token
[OUTPUT]: Running axum server exposing /ws, /bridge and /health
[POS]:    Server layer - HTTP surface and shared state
[UPDATE]: When adding routes or changing shutdown behavior
*/

pub mod bridge;
pub mod ws;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use bbb_adapter::BbbClient;
use serde_json::json;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::config::HubConfig;
use crate::correlator::TransactionCorrelator;
use crate::error::Result;
use crate::handlers::default_handlers;
use crate::router::EventRouter;

/// State shared by every request handler
#[derive(Clone)]
pub struct AppState {
    pub router: Arc<EventRouter>,
    pub correlator: TransactionCorrelator,
    pub config: Arc<HubConfig>,
    /// Session new persistent connections start with
    pub default_session: Option<BbbClient>,
    pub shutdown: CancellationToken,
}

impl AppState {
    /// Build the router with the default handler table
    pub fn from_config(config: HubConfig, shutdown: CancellationToken) -> Result<Self> {
        config.validate()?;
        let default_session = match &config.server {
            Some(server) => Some(BbbClient::new(&server.url, &server.secret)?),
            None => None,
        };

        Ok(Self {
            router: Arc::new(EventRouter::new(default_handlers())),
            correlator: TransactionCorrelator::new(config.reply_timeout()),
            config: Arc::new(config),
            default_session,
            shutdown,
        })
    }
}

pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/ws", get(ws::upgrade))
        .route("/bridge", post(bridge::handle))
        .route("/health", get(health))
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "connections": state.router.connection_count(),
        "metrics": state.router.metrics(),
    }))
}

/// Serve until the shutdown token is cancelled
pub async fn serve(listener: TcpListener, state: AppState) -> Result<()> {
    let shutdown = state.shutdown.clone();
    info!(addr = %listener.local_addr()?, "hub listening");

    axum::serve(
        listener,
        app(state).into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async move { shutdown.cancelled().await })
    .await?;

    info!("hub stopped");
    Ok(())
}
