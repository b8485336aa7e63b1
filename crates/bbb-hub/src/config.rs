/*
[INPUT]:  YAML configuration file
[OUTPUT]: Parsed hub configuration
[POS]:    Configuration layer - listener, queues and default server
[UPDATE]: When adding new configuration options
*/

use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{HubError, Result};

/// Top-level configuration for the event hub
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HubConfig {
    /// Address the HTTP/WebSocket listener binds to
    #[serde(default = "default_listen_addr")]
    pub listen_addr: SocketAddr,
    /// Capacity of each connection's outbound queue
    #[serde(default = "default_outbound_buffer")]
    pub outbound_buffer: usize,
    /// How long the bridge waits for a correlated reply
    #[serde(default = "default_reply_timeout_secs")]
    pub reply_timeout_secs: u64,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Server every new connection starts with; `connect` replaces it
    #[serde(default)]
    pub server: Option<ServerConfig>,
}

/// BigBlueButton API endpoint and shared secret
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    pub url: String,
    pub secret: String,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            outbound_buffer: default_outbound_buffer(),
            reply_timeout_secs: default_reply_timeout_secs(),
            log_level: default_log_level(),
            server: None,
        }
    }
}

fn default_listen_addr() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 8080))
}

fn default_outbound_buffer() -> usize {
    256
}

fn default_reply_timeout_secs() -> u64 {
    30
}

fn default_log_level() -> String {
    "info".to_string()
}

impl HubConfig {
    /// Load configuration from YAML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: Self =
            serde_yaml::from_str(content).map_err(|err| HubError::Config(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.outbound_buffer == 0 {
            return Err(HubError::Config("outbound_buffer must be positive".to_string()));
        }
        if self.reply_timeout_secs == 0 {
            return Err(HubError::Config("reply_timeout_secs must be positive".to_string()));
        }
        Ok(())
    }

    pub fn reply_timeout(&self) -> Duration {
        Duration::from_secs(self.reply_timeout_secs)
    }
}
