/*
[INPUT]:  Error sources (HTTP transport, API envelope, XML decoding, configuration)
[OUTPUT]: Structured error types carrying the remote return code and message key
[POS]:    Error handling layer - unified error types for the adapter crate
[UPDATE]: When adding new error sources or improving error messages
*/

use thiserror::Error;

/// Main error type for the BigBlueButton adapter
#[derive(Error, Debug)]
pub enum BbbError {
    /// Network, DNS or timeout failure reaching the remote server
    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Response envelope carried a non-SUCCESS return code
    #[error("API error ({return_code}): {message_key}")]
    Protocol {
        return_code: String,
        message_key: String,
        message: String,
    },

    /// Payload was not the XML shape we expected
    #[error("Decode error: {0}")]
    Decode(String),

    /// URL parsing failed
    #[error("Invalid URL: {0}")]
    UrlParse(#[from] url::ParseError),

    /// Client could not be constructed from the given settings
    #[error("Configuration error: {0}")]
    Config(String),
}

impl BbbError {
    /// Check if the error came from the network layer
    pub fn is_transport(&self) -> bool {
        matches!(self, BbbError::Transport(_))
    }

    /// Remote message key, for protocol errors only
    pub fn message_key(&self) -> Option<&str> {
        match self {
            BbbError::Protocol { message_key, .. } => Some(message_key),
            _ => None,
        }
    }

    /// Build a protocol error from the envelope fields
    pub fn protocol(
        return_code: impl Into<String>,
        message_key: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        BbbError::Protocol {
            return_code: return_code.into(),
            message_key: message_key.into(),
            message: message.into(),
        }
    }
}

impl From<quick_xml::DeError> for BbbError {
    fn from(err: quick_xml::DeError) -> Self {
        BbbError::Decode(err.to_string())
    }
}

/// Result type alias for adapter operations
pub type Result<T> = std::result::Result<T, BbbError>;
