/*
[INPUT]:  Public API exports for bbb-hub crate
[OUTPUT]: Module declarations and public re-exports
[POS]:    Crate root - library entry point
[UPDATE]: When adding new modules or public exports
*/

pub mod config;
pub mod connection;
pub mod correlator;
pub mod error;
pub mod event;
pub mod handlers;
pub mod metrics;
pub mod router;
pub mod server;

// Re-export main types for convenience
pub use config::HubConfig;
pub use connection::{Connection, ConnectionId};
pub use correlator::TransactionCorrelator;
pub use error::{HubError, Result};
pub use event::{Outbound, Reply, WireEvent};
pub use router::{Delivery, EventHandler, EventRouter, HandlerTable, Registration};
pub use server::AppState;
