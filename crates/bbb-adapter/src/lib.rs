/*
[INPUT]:  Crate modules and public type definitions
[OUTPUT]: Public BigBlueButton adapter crate surface
[POS]:    Crate root - module wiring
[UPDATE]: When public modules or exports change
*/

pub mod http;
pub mod types;
pub mod xml;

// Re-export commonly used types from http
pub use http::{BbbClient, BbbError, ClientConfig, RequestSigner, Result};

// Re-export all types
pub use types::*;
