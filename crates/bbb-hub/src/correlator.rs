/*
[INPUT]:  Outgoing request events and a connection's outbound queue
[OUTPUT]: The single reply matching a request's transaction id
[POS]:    Hub layer - request/reply correlation over broadcast delivery
[UPDATE]: When changing transaction id format or reply wait policy
*/

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{HubError, Result};
use crate::event::{Outbound, WireEvent};

/// Tags whose success reply is broadcast to every connection
pub const BROADCAST_TAGS: &[&str] = &["create", "end", "recordings.publish", "recordings.delete"];

/// Picks one reply out of a queue that also carries other traffic
#[derive(Debug, Clone)]
pub struct TransactionCorrelator {
    timeout: Duration,
}

impl TransactionCorrelator {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Whether replies to `tag` can reach other connections
    pub fn is_broadcast_tag(tag: &str) -> bool {
        BROADCAST_TAGS.contains(&tag)
    }

    /// Stamp a fresh transaction id on the event and return it
    pub fn tag_request(event: &mut WireEvent) -> String {
        let txid = Uuid::new_v4().to_string();
        event.set_txid(txid.clone());
        txid
    }

    /// Drive `dispatch` and [`await_reply`](Self::await_reply) together.
    ///
    /// The reply is read while the handler still runs, so a handler waiting on
    /// a full `inbound` queue always makes progress. The reply deadline covers
    /// the handler as well; a dispatch error is returned without waiting.
    pub async fn exchange<F>(
        &self,
        txid: &str,
        inbound: &mut mpsc::Receiver<Outbound>,
        dispatch: F,
    ) -> Result<Outbound>
    where
        F: Future<Output = Result<()>>,
    {
        let awaiting = self.await_reply(txid, inbound);
        tokio::pin!(dispatch);
        tokio::pin!(awaiting);

        tokio::select! {
            reply = &mut awaiting => reply,
            dispatched = &mut dispatch => match dispatched {
                Ok(()) => awaiting.await,
                Err(err) => Err(err),
            },
        }
    }

    /// Read from `inbound` until a reply for `txid` arrives.
    ///
    /// Other replies are discarded. The returned reply no longer carries the id.
    pub async fn await_reply(
        &self,
        txid: &str,
        inbound: &mut mpsc::Receiver<Outbound>,
    ) -> Result<Outbound> {
        let deadline = Instant::now() + self.timeout;
        loop {
            match tokio::time::timeout_at(deadline, inbound.recv()).await {
                Ok(Some(outbound)) if outbound.matches(txid) => {
                    return Ok(Outbound::untracked(outbound.reply));
                }
                Ok(Some(other)) => {
                    debug!(txid, tag = other.reply.tag(), "discarding unrelated reply");
                }
                Ok(None) => return Err(HubError::ConnectionClosed),
                Err(_) => {
                    warn!(txid, waited = ?self.timeout, "no reply before deadline");
                    return Err(HubError::ReplyTimeout {
                        txid: txid.to_string(),
                        waited: self.timeout,
                    });
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::Connection;
    use crate::event::{EndedReply, Reply, RunningReply};
    use crate::router::{Delivery, EventHandler, EventRouter, HandlerTable};
    use async_trait::async_trait;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Deserialize)]
    struct EndLike {
        id: String,
    }

    /// Replies privately to whoever asked
    struct PrivateRunning;

    #[async_trait]
    impl EventHandler for PrivateRunning {
        type Request = serde_json::Value;

        async fn handle(
            &self,
            _connection: &Connection,
            _request: serde_json::Value,
        ) -> Result<Delivery> {
            Ok(Delivery::Reply(Reply::Running(RunningReply { running: true })))
        }
    }

    struct BroadcastingEnd;

    #[async_trait]
    impl EventHandler for BroadcastingEnd {
        type Request = EndLike;

        async fn handle(&self, _connection: &Connection, request: EndLike) -> Result<Delivery> {
            Ok(Delivery::Broadcast(Reply::Ended(EndedReply {
                ended: true,
                id: request.id,
                error: None,
            })))
        }
    }

    fn end_event(id: &str) -> WireEvent {
        serde_json::from_value(json!({ "event": "end", "data": { "id": id } })).expect("event")
    }

    fn ended(id: &str) -> Reply {
        Reply::Ended(EndedReply {
            ended: true,
            id: id.to_string(),
            error: None,
        })
    }

    #[test]
    fn test_tag_request_is_unique() {
        let mut first = end_event("m1");
        let mut second = end_event("m1");
        let a = TransactionCorrelator::tag_request(&mut first);
        let b = TransactionCorrelator::tag_request(&mut second);
        assert_ne!(a, b);
        assert_eq!(first.txid(), Some(a.as_str()));
    }

    #[test]
    fn test_broadcast_tags() {
        assert!(TransactionCorrelator::is_broadcast_tag("create"));
        assert!(TransactionCorrelator::is_broadcast_tag("recordings.delete"));
        assert!(!TransactionCorrelator::is_broadcast_tag("running"));
    }

    #[tokio::test]
    async fn test_concurrent_requests_get_their_own_reply() {
        let router = EventRouter::new(HandlerTable::new().with("end", BroadcastingEnd));
        let correlator = TransactionCorrelator::new(Duration::from_secs(5));
        let (a, mut a_rx) = Connection::new("a", None, 8);
        let (b, mut b_rx) = Connection::new("b", None, 8);
        router.register(a.clone());
        router.register(b.clone());

        let mut a_event = end_event("meeting-a");
        let mut b_event = end_event("meeting-b");
        let a_txid = TransactionCorrelator::tag_request(&mut a_event);
        let b_txid = TransactionCorrelator::tag_request(&mut b_event);

        let (a_dispatch, b_dispatch) =
            tokio::join!(router.dispatch(&a, a_event), router.dispatch(&b, b_event));
        a_dispatch.expect("dispatch a");
        b_dispatch.expect("dispatch b");

        let (a_reply, b_reply) = tokio::join!(
            correlator.await_reply(&a_txid, &mut a_rx),
            correlator.await_reply(&b_txid, &mut b_rx)
        );
        let a_reply = a_reply.expect("reply a");
        let b_reply = b_reply.expect("reply b");

        assert_eq!(a_reply.reply, ended("meeting-a"));
        assert_eq!(b_reply.reply, ended("meeting-b"));
        assert_eq!(a_reply.txid, None);
        assert_eq!(b_reply.txid, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_reply_times_out() {
        let correlator = TransactionCorrelator::new(Duration::from_secs(30));
        let (connection, mut inbound) = Connection::new("a", None, 8);
        connection
            .send(Outbound::new(ended("other"), Some("someone-else".to_string())))
            .await
            .expect("send");

        let err = correlator
            .await_reply("mine", &mut inbound)
            .await
            .expect_err("timeout");
        match err {
            HubError::ReplyTimeout { txid, waited } => {
                assert_eq!(txid, "mine");
                assert_eq!(waited, Duration::from_secs(30));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_closed_queue_is_connection_closed() {
        let correlator = TransactionCorrelator::new(Duration::from_secs(5));
        let (connection, mut inbound) = Connection::new("a", None, 8);
        drop(connection);

        let err = correlator
            .await_reply("mine", &mut inbound)
            .await
            .expect_err("closed");
        assert!(matches!(err, HubError::ConnectionClosed));
    }

    #[tokio::test]
    async fn test_exchange_drains_full_queue_for_private_reply() {
        let router = EventRouter::new(HandlerTable::new().with("running", PrivateRunning));
        let correlator = TransactionCorrelator::new(Duration::from_secs(5));
        let (connection, mut inbound) = Connection::new("bridge", None, 1);
        router.register(connection.clone());
        assert_eq!(router.broadcast(Outbound::untracked(ended("elsewhere"))), 1);

        let mut event: WireEvent =
            serde_json::from_value(json!({ "event": "running", "data": {} })).expect("event");
        let txid = TransactionCorrelator::tag_request(&mut event);

        let reply = correlator
            .exchange(&txid, &mut inbound, router.dispatch(&connection, event))
            .await
            .expect("reply");
        assert_eq!(reply.reply, Reply::Running(RunningReply { running: true }));
    }

    #[tokio::test]
    async fn test_exchange_keeps_own_broadcast_when_queue_full() {
        let router = EventRouter::new(HandlerTable::new().with("end", BroadcastingEnd));
        let correlator = TransactionCorrelator::new(Duration::from_secs(5));
        let (connection, mut inbound) = Connection::new("bridge", None, 1);
        router.register(connection.clone());
        router.broadcast(Outbound::untracked(ended("elsewhere")));

        let mut event = end_event("mine");
        let txid = TransactionCorrelator::tag_request(&mut event);

        let reply = correlator
            .exchange(&txid, &mut inbound, router.dispatch(&connection, event))
            .await
            .expect("reply");
        assert_eq!(reply.reply, ended("mine"));
    }

    #[tokio::test]
    async fn test_exchange_returns_dispatch_error_immediately() {
        let router = EventRouter::new(HandlerTable::new());
        let correlator = TransactionCorrelator::new(Duration::from_secs(3600));
        let (connection, mut inbound) = Connection::new("bridge", None, 1);

        let mut event = end_event("m1");
        let txid = TransactionCorrelator::tag_request(&mut event);

        let err = correlator
            .exchange(&txid, &mut inbound, router.dispatch(&connection, event))
            .await
            .expect_err("unknown tag");
        assert!(matches!(err, HubError::UnknownEvent(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_exchange_deadline_covers_slow_handler() {
        let correlator = TransactionCorrelator::new(Duration::from_secs(30));
        let (_connection, mut inbound) = Connection::new("bridge", None, 1);

        let err = correlator
            .exchange("mine", &mut inbound, std::future::pending::<Result<()>>())
            .await
            .expect_err("timeout");
        assert!(matches!(err, HubError::ReplyTimeout { .. }));
    }
}
