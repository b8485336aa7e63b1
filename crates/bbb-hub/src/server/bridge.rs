/*
[INPUT]:  One POSTed event plus target server url/secret as query parameters
[OUTPUT]: Exactly one JSON reply for that event
[POS]:    Server layer - one-shot request/reply bridge over the hub
[UPDATE]: When changing bridge error mapping or correlation
*/

use std::net::SocketAddr;

use axum::Json;
use axum::body::Bytes;
use axum::extract::{ConnectInfo, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use bbb_adapter::BbbClient;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::connection::Connection;
use crate::correlator::TransactionCorrelator;
use crate::error::{HubError, Result};
use crate::event::{Reply, WireEvent};
use crate::server::AppState;

#[derive(Debug, Deserialize)]
pub struct BridgeQuery {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub secret: String,
}

impl IntoResponse for HubError {
    fn into_response(self) -> Response {
        let status = match &self {
            HubError::ReplyTimeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            err if err.is_client_error() => StatusCode::BAD_REQUEST,
            HubError::Api(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(Reply::error(self.to_string()))).into_response()
    }
}

/// Body is read as raw bytes so malformed JSON still gets an `error` reply
pub async fn handle(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Query(query): Query<BridgeQuery>,
    body: Bytes,
) -> Result<Json<Reply>> {
    let mut event: WireEvent = serde_json::from_slice(&body).map_err(HubError::Malformed)?;
    let client = BbbClient::new(&query.url, &query.secret)?;
    let (connection, mut inbound) = Connection::new(
        addr.to_string(),
        Some(client),
        state.config.outbound_buffer,
    );

    let tag = event.event.clone();
    let txid = TransactionCorrelator::tag_request(&mut event);
    debug!(
        %txid,
        %tag,
        broadcast = TransactionCorrelator::is_broadcast_tag(&tag),
        "bridge request"
    );

    // Dropped on every exit, including when the caller disconnects mid-request.
    let _registration = state.router.register_scoped(connection.clone());
    let result = state
        .correlator
        .exchange(&txid, &mut inbound, state.router.dispatch(&connection, event))
        .await;

    match result {
        Ok(outbound) => Ok(Json(outbound.reply)),
        Err(err) => {
            warn!(%txid, %tag, error = %err, "bridge request failed");
            Err(err)
        }
    }
}
