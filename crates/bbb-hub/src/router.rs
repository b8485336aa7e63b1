/*
[INPUT]:  Registered connections, handler table, inbound wire events
[OUTPUT]: Handler invocation plus private or broadcast delivery of replies
[POS]:    Hub layer - connection registry and event dispatch
[UPDATE]: When changing dispatch, registration, or fan-out policy
*/

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, info, warn};

use crate::connection::{Connection, ConnectionId};
use crate::error::{HubError, Result};
use crate::event::{Outbound, Reply, WireEvent};
use crate::metrics::{HubMetrics, HubMetricsSnapshot};

/// Where a handler's reply goes
#[derive(Debug, Clone, PartialEq)]
pub enum Delivery {
    /// Only the requesting connection
    Reply(Reply),
    /// Every registered connection, requester included
    Broadcast(Reply),
}

/// Handler for one event tag with its own typed payload
#[async_trait]
pub trait EventHandler: Send + Sync + 'static {
    type Request: DeserializeOwned + Send;

    async fn handle(&self, connection: &Connection, request: Self::Request) -> Result<Delivery>;
}

/// Object-safe view of [`EventHandler`] that decodes the payload first
#[async_trait]
trait ErasedHandler: Send + Sync {
    async fn call(&self, connection: &Connection, event: &WireEvent) -> Result<Delivery>;
}

#[async_trait]
impl<H: EventHandler> ErasedHandler for H {
    async fn call(&self, connection: &Connection, event: &WireEvent) -> Result<Delivery> {
        let request = event.decode::<H::Request>()?;
        self.handle(connection, request).await
    }
}

/// Tag to handler mapping handed to [`EventRouter::new`]
#[derive(Default)]
pub struct HandlerTable {
    handlers: HashMap<&'static str, Arc<dyn ErasedHandler>>,
}

impl HandlerTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `tag`, replacing any previous one
    pub fn with<H: EventHandler>(mut self, tag: &'static str, handler: H) -> Self {
        self.handlers.insert(tag, Arc::new(handler));
        self
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.handlers.contains_key(tag)
    }

    pub fn tags(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.handlers.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

/// Registry of live connections and dispatcher of their events
pub struct EventRouter {
    handlers: HandlerTable,
    connections: RwLock<HashMap<ConnectionId, Arc<Connection>>>,
    metrics: HubMetrics,
}

impl EventRouter {
    pub fn new(handlers: HandlerTable) -> Self {
        Self {
            handlers,
            connections: RwLock::new(HashMap::new()),
            metrics: HubMetrics::default(),
        }
    }

    /// Add a connection; returns false when it was already registered
    pub fn register(&self, connection: Arc<Connection>) -> bool {
        let mut connections = self
            .connections
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if connections.contains_key(&connection.id()) {
            return false;
        }
        info!(
            connection = %connection.id(),
            address = connection.address(),
            "connection registered"
        );
        connections.insert(connection.id(), connection);
        true
    }

    /// Register `connection` for as long as the returned guard lives
    pub fn register_scoped(self: &Arc<Self>, connection: Arc<Connection>) -> Registration {
        let id = connection.id();
        self.register(connection);
        Registration {
            router: Arc::clone(self),
            id,
        }
    }

    /// Remove a connection and close its outbound path; returns false when absent
    pub fn unregister(&self, id: ConnectionId) -> bool {
        let removed = self
            .connections
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id);
        match removed {
            Some(connection) => {
                connection.close();
                info!(connection = %id, "connection unregistered");
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, id: ConnectionId) -> bool {
        self.connections
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&id)
    }

    pub fn connection_count(&self) -> usize {
        self.connections
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn handles(&self, tag: &str) -> bool {
        self.handlers.contains(tag)
    }

    /// Run the handler for `event.event` and deliver its reply.
    ///
    /// The event's transaction id, if any, travels with the reply.
    pub async fn dispatch(&self, connection: &Connection, event: WireEvent) -> Result<()> {
        let Some(handler) = self.handlers.handlers.get(event.event.as_str()).cloned() else {
            self.metrics.record_dispatch_failure();
            return Err(HubError::UnknownEvent(event.event));
        };

        let txid = event.txid().map(str::to_string);
        debug!(
            connection = %connection.id(),
            tag = %event.event,
            txid = ?txid,
            "dispatching event"
        );

        let delivery = match handler.call(connection, &event).await {
            Ok(delivery) => delivery,
            Err(err) => {
                self.metrics.record_dispatch_failure();
                return Err(err);
            }
        };
        self.metrics.record_dispatch();

        match delivery {
            Delivery::Reply(reply) => connection.send(Outbound::new(reply, txid)).await,
            Delivery::Broadcast(reply) => {
                // The requester's copy waits for queue space; everyone else may drop it.
                let outbound = Outbound::new(reply, txid);
                self.fan_out(Some(connection.id()), &outbound);
                connection.send(outbound).await?;
                self.metrics.record_broadcast_delivery();
                Ok(())
            }
        }
    }

    /// Offer `outbound` to every registered connection without waiting.
    ///
    /// A full queue drops the message for that connection only. Returns the
    /// number of connections that accepted it.
    pub fn broadcast(&self, outbound: Outbound) -> usize {
        self.fan_out(None, &outbound)
    }

    fn fan_out(&self, skip: Option<ConnectionId>, outbound: &Outbound) -> usize {
        let targets: Vec<Arc<Connection>> = self
            .connections
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .filter(|connection| Some(connection.id()) != skip)
            .cloned()
            .collect();

        let mut delivered = 0;
        for connection in targets {
            match connection.try_send(outbound.clone()) {
                Ok(()) => {
                    delivered += 1;
                    self.metrics.record_broadcast_delivery();
                }
                Err(TrySendError::Full(_)) => {
                    self.metrics.record_broadcast_drop();
                    warn!(
                        connection = %connection.id(),
                        tag = outbound.reply.tag(),
                        "outbound queue full; broadcast dropped"
                    );
                }
                Err(TrySendError::Closed(_)) => {
                    debug!(connection = %connection.id(), "skipping closed connection");
                }
            }
        }
        delivered
    }

    pub fn metrics(&self) -> HubMetricsSnapshot {
        self.metrics.snapshot()
    }
}

/// Unregisters its connection when dropped, including when the owning task is cancelled
pub struct Registration {
    router: Arc<EventRouter>,
    id: ConnectionId,
}

impl Registration {
    pub fn id(&self) -> ConnectionId {
        self.id
    }
}

impl Drop for Registration {
    fn drop(&mut self) {
        self.router.unregister(self.id);
    }
}
