/*
[INPUT]:  API action name, encoded query string and the shared secret
[OUTPUT]: Hex SHA-1 checksum appended to every privileged request
[POS]:    HTTP layer - request signing for all API calls
[UPDATE]: When changing signing algorithm or checksum format
*/

use sha1::{Digest, Sha1};

/// Query parameter carrying the request signature
pub const CHECKSUM_PARAM: &str = "checksum";

/// Signs API requests with the server's shared secret
#[derive(Clone)]
pub struct RequestSigner {
    secret: String,
}

impl RequestSigner {
    /// Create a new request signer for the given shared secret
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// Compute the checksum for an action and its encoded parameters
    ///
    /// Format: sha1("{action}{params}{secret}"), lowercase hex.
    /// One trailing `&` on `params` is ignored.
    pub fn checksum(&self, action: &str, params: &str) -> String {
        let params = params.strip_suffix('&').unwrap_or(params);
        let mut hasher = Sha1::new();
        hasher.update(action.as_bytes());
        hasher.update(params.as_bytes());
        hasher.update(self.secret.as_bytes());
        hex::encode(hasher.finalize())
    }
}

impl std::fmt::Debug for RequestSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestSigner")
            .field("secret", &"<redacted>")
            .finish()
    }
}
