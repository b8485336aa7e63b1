/*
[INPUT]:  API base URL, shared secret, timeouts and polling budget
[OUTPUT]: Configured reqwest client issuing signed API requests
[POS]:    HTTP layer - core client implementation
[UPDATE]: When adding connection options or changing request signing
*/

use std::time::Duration;

use reqwest::{Client, Url, header};
use tracing::debug;

use crate::http::signature::CHECKSUM_PARAM;
use crate::http::{BbbError, RequestSigner, Result};
use crate::types::Params;

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub timeout: Duration,
    pub connect_timeout: Duration,
    /// How many times `end` re-checks that the meeting is gone
    pub end_poll_attempts: u32,
    /// Pause between `end` re-checks
    pub end_poll_interval: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            end_poll_attempts: 10,
            end_poll_interval: Duration::from_secs(2),
        }
    }
}

/// Signed client for one BigBlueButton server
#[derive(Debug, Clone)]
pub struct BbbClient {
    http_client: Client,
    base_url: Url,
    signer: RequestSigner,
    config: ClientConfig,
}

impl BbbClient {
    /// Create a new client with default configuration
    pub fn new(api_url: &str, secret: &str) -> Result<Self> {
        Self::with_config(api_url, secret, ClientConfig::default())
    }

    /// Create a new client with custom configuration
    pub fn with_config(api_url: &str, secret: &str, config: ClientConfig) -> Result<Self> {
        if secret.is_empty() {
            return Err(BbbError::Config("missing shared secret".to_string()));
        }

        let mut base_url = Url::parse(api_url)
            .map_err(|e| BbbError::Config(format!("invalid API url {api_url:?}: {e}")))?;
        if base_url.cannot_be_a_base() || !matches!(base_url.scheme(), "http" | "https") {
            return Err(BbbError::Config(format!(
                "API url must be an http(s) base url, got {api_url:?}"
            )));
        }
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let http_client = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(|e| BbbError::Config(format!("build http client: {e}")))?;

        Ok(Self {
            http_client,
            base_url,
            signer: RequestSigner::new(secret),
            config,
        })
    }

    /// API base URL, always ending in `/`
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Build the signed URL for an action.
    ///
    /// A caller-supplied `checksum` parameter is kept as is.
    pub fn api_url(&self, action: &str, params: Params) -> Result<Url> {
        let mut url = self.base_url.join(action)?;
        let query = params.encode();

        if params.contains_key(CHECKSUM_PARAM) {
            url.set_query(Some(&query));
            return Ok(url);
        }

        let checksum = self.signer.checksum(action, &query);
        if query.is_empty() {
            url.set_query(Some(&format!("{CHECKSUM_PARAM}={checksum}")));
        } else {
            url.set_query(Some(&format!("{query}&{CHECKSUM_PARAM}={checksum}")));
        }
        Ok(url)
    }

    /// GET and return the response body
    pub(crate) async fn get_text(&self, url: Url) -> Result<String> {
        debug!(path = url.path(), method = "GET", "api request");
        let response = self
            .http_client
            .get(url)
            .send()
            .await?
            .error_for_status()?;
        Ok(response.text().await?)
    }

    /// POST an XML body and return the response body
    pub(crate) async fn post_xml(&self, url: Url, body: String) -> Result<String> {
        debug!(path = url.path(), method = "POST", bytes = body.len(), "api request");
        let response = self
            .http_client
            .post(url)
            .header(header::CONTENT_TYPE, "text/xml")
            .body(body)
            .send()
            .await?
            .error_for_status()?;
        Ok(response.text().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_secret_is_config_error() {
        let err = BbbClient::new("http://localhost/bigbluebutton/api/", "").expect_err("no secret");
        assert!(matches!(err, BbbError::Config(_)));
    }

    #[test]
    fn test_malformed_url_is_config_error() {
        let err = BbbClient::new("not a url", "secret").expect_err("bad url");
        assert!(matches!(err, BbbError::Config(_)));

        let err = BbbClient::new("mailto:ops@example.com", "secret").expect_err("not http");
        assert!(matches!(err, BbbError::Config(_)));
    }

    #[test]
    fn test_base_url_gets_trailing_slash() {
        let client =
            BbbClient::new("http://localhost/bigbluebutton/api", "secret").expect("client");
        assert_eq!(client.base_url().as_str(), "http://localhost/bigbluebutton/api/");
    }

    #[test]
    fn test_api_url_appends_checksum_last() {
        let client = BbbClient::new("http://localhost/api/", "secret").expect("client");
        let url = client
            .api_url("create", Params::new().with("meetingID", "abc"))
            .expect("url");
        assert_eq!(
            url.as_str(),
            "http://localhost/api/create?meetingID=abc\
             &checksum=45e34b5360c52d2463dbc7ad7994f4860be198cf"
        );
    }

    #[test]
    fn test_api_url_without_params() {
        let client = BbbClient::new("http://localhost/api/", "mysalt").expect("client");
        let url = client.api_url("getMeetings", Params::new()).expect("url");
        assert_eq!(
            url.query(),
            Some("checksum=8cd9a30fb3ee8b34f580972ad7ace9f1912b37d3")
        );
    }

    #[test]
    fn test_api_url_keeps_existing_checksum() {
        let client = BbbClient::new("http://localhost/api/", "secret").expect("client");
        let params = Params::new().with("meetingID", "abc").with("checksum", "precomputed");
        let url = client.api_url("create", params).expect("url");
        assert_eq!(url.query(), Some("checksum=precomputed&meetingID=abc"));
    }
}
