/*
[INPUT]:  HTTP client configuration and API endpoints
[OUTPUT]: Signed API requests and typed results
[POS]:    HTTP layer - BigBlueButton API communication
[UPDATE]: When adding new endpoints or changing client behavior
*/

pub mod client;
pub mod error;
pub mod meetings;
pub mod recordings;
pub mod signature;

pub use error::{BbbError, Result};
pub use signature::RequestSigner;

pub use client::{BbbClient, ClientConfig};
