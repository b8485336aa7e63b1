/*
[INPUT]:  Peer address, optional API session, outbound queue capacity
[OUTPUT]: Registered participant with a bounded outbound queue and close signal
[POS]:    Hub layer - per-connection state owned by the router registry
[UPDATE]: When changing delivery semantics or session handling
*/

use std::sync::{Arc, PoisonError, RwLock};

use bbb_adapter::BbbClient;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::error::{HubError, Result};
use crate::event::Outbound;

pub type ConnectionId = Uuid;

/// One participant of the hub.
///
/// The reader side dispatches with `&Connection`; the writer side owns the
/// receiving half returned by [`Connection::new`].
#[derive(Debug)]
pub struct Connection {
    id: ConnectionId,
    address: String,
    outbound: mpsc::Sender<Outbound>,
    session: RwLock<Option<BbbClient>>,
    closed: CancellationToken,
}

impl Connection {
    pub fn new(
        address: impl Into<String>,
        session: Option<BbbClient>,
        capacity: usize,
    ) -> (Arc<Self>, mpsc::Receiver<Outbound>) {
        let (outbound, inbound) = mpsc::channel(capacity.max(1));
        let connection = Arc::new(Self {
            id: Uuid::new_v4(),
            address: address.into(),
            outbound,
            session: RwLock::new(session),
            closed: CancellationToken::new(),
        });
        (connection, inbound)
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    /// API session used by this connection's handlers
    pub fn session(&self) -> Result<BbbClient> {
        self.session
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or(HubError::NotConnected)
    }

    pub fn set_session(&self, client: BbbClient) {
        *self.session.write().unwrap_or_else(PoisonError::into_inner) = Some(client);
    }

    /// Queue a reply for this connection, waiting for space
    pub async fn send(&self, outbound: Outbound) -> Result<()> {
        if self.closed.is_cancelled() {
            return Err(HubError::ConnectionClosed);
        }
        self.outbound
            .send(outbound)
            .await
            .map_err(|_| HubError::ConnectionClosed)
    }

    /// Queue without waiting; used by broadcast
    pub fn try_send(&self, outbound: Outbound) -> std::result::Result<(), TrySendError<Outbound>> {
        if self.closed.is_cancelled() {
            return Err(TrySendError::Closed(outbound));
        }
        self.outbound.try_send(outbound)
    }

    /// Signal reader and writer to stop; idempotent
    pub fn close(&self) {
        self.closed.cancel();
    }

    pub fn is_closed(&self) -> bool {
        self.closed.is_cancelled()
    }

    /// Token cancelled once the connection is closed
    pub fn closed_token(&self) -> CancellationToken {
        self.closed.clone()
    }
}
