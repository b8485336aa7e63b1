/*
[INPUT]:  Dispatch results and broadcast delivery attempts
[OUTPUT]: Snapshot-friendly hub counters for health reporting
[POS]:    Shared runtime metrics between router and HTTP endpoints
[UPDATE]: When adding/removing hub-level runtime signals
*/

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct HubMetricsSnapshot {
    pub events_dispatched: u64,
    pub dispatch_failures: u64,
    pub broadcast_deliveries: u64,
    pub broadcast_drops: u64,
}

#[derive(Debug, Default)]
pub struct HubMetrics {
    events_dispatched: AtomicU64,
    dispatch_failures: AtomicU64,
    broadcast_deliveries: AtomicU64,
    broadcast_drops: AtomicU64,
}

impl HubMetrics {
    pub fn snapshot(&self) -> HubMetricsSnapshot {
        HubMetricsSnapshot {
            events_dispatched: self.events_dispatched.load(Ordering::Relaxed),
            dispatch_failures: self.dispatch_failures.load(Ordering::Relaxed),
            broadcast_deliveries: self.broadcast_deliveries.load(Ordering::Relaxed),
            broadcast_drops: self.broadcast_drops.load(Ordering::Relaxed),
        }
    }

    pub fn record_dispatch(&self) {
        self.events_dispatched.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_dispatch_failure(&self) {
        self.dispatch_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_broadcast_delivery(&self) {
        self.broadcast_deliveries.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_broadcast_drop(&self) {
        self.broadcast_drops.fetch_add(1, Ordering::Relaxed);
    }
}
