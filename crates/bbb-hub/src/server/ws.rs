/*
[INPUT]:  WebSocket upgrades carrying JSON `{event, data}` text frames
[OUTPUT]: Registered connections with a reader and a writer activity
[POS]:    Server layer - persistent connection endpoint
[UPDATE]: When changing frame handling or connection teardown
*/

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{ConnectInfo, State};
use axum::response::IntoResponse;
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::connection::Connection;
use crate::error::HubError;
use crate::event::{Outbound, Reply, WireEvent};
use crate::server::AppState;

pub async fn upgrade(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| run_connection(socket, addr, state))
}

async fn run_connection(socket: WebSocket, addr: SocketAddr, state: AppState) {
    let (connection, outbound) = Connection::new(
        addr.to_string(),
        state.default_session.clone(),
        state.config.outbound_buffer,
    );
    let registration = state.router.register_scoped(connection.clone());
    info!(connection = %connection.id(), address = %addr, "connection opened");

    let (sink, mut stream) = socket.split();
    let writer = tokio::spawn(write_loop(sink, outbound, connection.clone()));

    let closed = connection.closed_token();
    loop {
        tokio::select! {
            _ = closed.cancelled() => break,
            _ = state.shutdown.cancelled() => break,
            frame = stream.next() => match frame {
                // A slow handler must not keep the connection alive past its close.
                Some(Ok(Message::Text(text))) => tokio::select! {
                    _ = closed.cancelled() => break,
                    _ = state.shutdown.cancelled() => break,
                    _ = handle_frame(&state, &connection, text.as_str()) => {}
                },
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(err)) => {
                    debug!(connection = %connection.id(), error = %err, "read failed");
                    break;
                }
            },
        }
    }

    drop(registration);
    connection.close();
    if let Err(err) = writer.await {
        warn!(connection = %connection.id(), error = %err, "writer task failed");
    }
    info!(connection = %connection.id(), address = %addr, "connection closed");
}

async fn handle_frame(state: &AppState, connection: &Arc<Connection>, text: &str) {
    let result = match serde_json::from_str::<WireEvent>(text) {
        Ok(event) => {
            let tag = event.event.clone();
            state
                .router
                .dispatch(connection, event)
                .await
                .map_err(|err| (tag, err))
        }
        Err(err) => Err((String::new(), HubError::Malformed(err))),
    };

    if let Err((tag, err)) = result {
        warn!(connection = %connection.id(), tag = %tag, error = %err, "dispatch failed");
        if let Err(send_err) = connection
            .send(Outbound::untracked(Reply::error(err.to_string())))
            .await
        {
            debug!(connection = %connection.id(), error = %send_err, "error reply not delivered");
        }
    }
}

/// Drain the outbound queue into the socket; the transaction id is never written
async fn write_loop(
    mut sink: SplitSink<WebSocket, Message>,
    mut outbound: mpsc::Receiver<Outbound>,
    connection: Arc<Connection>,
) {
    let closed = connection.closed_token();
    loop {
        let next = tokio::select! {
            _ = closed.cancelled() => break,
            next = outbound.recv() => next,
        };
        let Some(message) = next else { break };

        let text = match message.to_json() {
            Ok(text) => text,
            Err(err) => {
                warn!(connection = %connection.id(), error = %err, "reply not serializable");
                continue;
            }
        };
        if let Err(err) = sink.send(Message::Text(text.into())).await {
            debug!(connection = %connection.id(), error = %err, "write failed");
            break;
        }
    }

    if let Err(err) = sink.close().await {
        debug!(connection = %connection.id(), error = %err, "close failed");
    }
    connection.close();
}
