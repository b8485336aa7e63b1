/*
[INPUT]:  Error sources (unknown tags, payload decoding, API calls, queues, config)
[OUTPUT]: Hub error type surfaced to requesters as `error` replies
[POS]:    Error handling layer - unified error types for the hub crate
[UPDATE]: When adding new failure modes to dispatch or delivery
*/

use std::time::Duration;

use bbb_adapter::BbbError;
use thiserror::Error;

/// Main error type for the event hub
#[derive(Error, Debug)]
pub enum HubError {
    /// No handler registered for the event tag
    #[error("Event Handler '{0}' not found!")]
    UnknownEvent(String),

    /// Payload did not match the shape expected for the tag
    #[error("invalid payload for '{tag}': {source}")]
    InvalidPayload {
        tag: String,
        #[source]
        source: serde_json::Error,
    },

    /// Inbound frame was not an `{event, data}` message
    #[error("malformed event: {0}")]
    Malformed(#[source] serde_json::Error),

    #[error(transparent)]
    Api(#[from] BbbError),

    /// Handler needs an API session and the connection has none
    #[error("not connected to a server; send 'connect' first")]
    NotConnected,

    /// Outbound queue was released
    #[error("connection closed")]
    ConnectionClosed,

    #[error("no reply for transaction {txid} within {waited:?}")]
    ReplyTimeout { txid: String, waited: Duration },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl HubError {
    /// Whether the requester caused the failure
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            HubError::UnknownEvent(_)
                | HubError::InvalidPayload { .. }
                | HubError::Malformed(_)
                | HubError::NotConnected
                | HubError::Config(_)
                | HubError::Api(BbbError::Config(_) | BbbError::UrlParse(_))
        )
    }
}

/// Result type alias for hub operations
pub type Result<T> = std::result::Result<T, HubError>;
