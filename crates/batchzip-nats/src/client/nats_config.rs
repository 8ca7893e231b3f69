//! Settings for the manifest cache connection.

use std::fmt;
use std::time::Duration;

use async_nats::ConnectOptions;
#[cfg(feature = "config")]
use clap::Args;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::{Error, Result};

/// Server URL used when none is configured.
pub const DEFAULT_NATS_URL: &str = "nats://127.0.0.1:4222";

const CLIENT_NAME: &str = "batchzip";
const SCHEMES: [&str; 4] = ["nats", "tls", "ws", "wss"];

const PING_INTERVAL: Duration = Duration::from_secs(30);
const RECONNECT_BASE_DELAY: Duration = Duration::from_secs(2);
const RECONNECT_MAX_DELAY: Duration = Duration::from_secs(30);

/// Where the `batch_downloads` bucket lives and how to reach it.
#[derive(Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
pub struct NatsConfig {
    /// NATS server URLs, comma separated
    #[cfg_attr(
        feature = "config",
        arg(long = "nats-url", env = "NATS_URL", default_value = DEFAULT_NATS_URL)
    )]
    pub nats_url: String,

    /// Token for token authentication
    #[cfg_attr(feature = "config", arg(long = "nats-token", env = "NATS_TOKEN"))]
    pub nats_token: Option<String>,

    /// Connection name shown in NATS monitoring (default: batchzip)
    #[cfg_attr(
        feature = "config",
        arg(long = "nats-client-name", env = "NATS_CLIENT_NAME")
    )]
    pub nats_client_name: Option<String>,

    /// Seconds allowed for the initial connection
    #[cfg_attr(
        feature = "config",
        arg(
            long = "nats-connect-timeout-secs",
            env = "NATS_CONNECT_TIMEOUT_SECS",
            default_value_t = 30
        )
    )]
    #[serde(default = "default_connect_timeout_secs")]
    pub nats_connect_timeout_secs: u64,

    /// Reconnect attempts before giving up, 0 retries forever
    #[cfg_attr(
        feature = "config",
        arg(
            long = "nats-max-reconnects",
            env = "NATS_MAX_RECONNECTS",
            default_value_t = 10
        )
    )]
    #[serde(default = "default_max_reconnects")]
    pub nats_max_reconnects: usize,
}

fn default_connect_timeout_secs() -> u64 {
    30
}

fn default_max_reconnects() -> usize {
    10
}

impl NatsConfig {
    pub fn new(nats_url: impl Into<String>) -> Self {
        Self {
            nats_url: nats_url.into(),
            nats_token: None,
            nats_client_name: None,
            nats_connect_timeout_secs: default_connect_timeout_secs(),
            nats_max_reconnects: default_max_reconnects(),
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.nats_token = Some(token.into());
        self
    }

    pub fn with_client_name(mut self, name: impl Into<String>) -> Self {
        self.nats_client_name = Some(name.into());
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.nats_connect_timeout_secs = timeout.as_secs();
        self
    }

    pub fn with_max_reconnects(mut self, attempts: usize) -> Self {
        self.nats_max_reconnects = attempts;
        self
    }

    #[inline]
    pub fn client_name(&self) -> &str {
        self.nats_client_name.as_deref().unwrap_or(CLIENT_NAME)
    }

    #[inline]
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.nats_connect_timeout_secs)
    }

    /// The configured servers, trimmed, in order.
    pub fn server_urls(&self) -> impl Iterator<Item = &str> {
        self.nats_url.split(',').map(str::trim)
    }

    /// Checks every server URL and the timeout.
    pub fn validate(&self) -> Result<()> {
        for server in self.server_urls() {
            let url = Url::parse(server)
                .map_err(|e| Error::invalid_config(format!("server url '{server}': {e}")))?;

            if !SCHEMES.contains(&url.scheme()) {
                return Err(Error::invalid_config(format!(
                    "server url '{server}' must use one of {}",
                    SCHEMES.join(", ")
                )));
            }
        }

        if self.nats_token.as_deref() == Some("") {
            return Err(Error::invalid_config("token is set but empty"));
        }

        if self.nats_connect_timeout_secs == 0 {
            return Err(Error::invalid_config("connect timeout must be at least 1s"));
        }

        Ok(())
    }

    /// Client options: name, token, ping interval and capped exponential
    /// reconnect backoff.
    pub fn connect_options(&self) -> ConnectOptions {
        let mut options = ConnectOptions::new()
            .name(self.client_name())
            .ping_interval(PING_INTERVAL)
            .connection_timeout(self.connect_timeout())
            .reconnect_delay_callback(reconnect_delay);

        if let Some(token) = &self.nats_token {
            options = options.token(token.clone());
        }

        if self.nats_max_reconnects > 0 {
            options = options.max_reconnects(self.nats_max_reconnects);
        }

        options
    }
}

/// Doubles from two seconds per attempt, capped at thirty.
fn reconnect_delay(attempt: usize) -> Duration {
    let shift = u32::try_from(attempt).unwrap_or(u32::MAX).min(4);
    RECONNECT_BASE_DELAY
        .saturating_mul(1 << shift)
        .min(RECONNECT_MAX_DELAY)
}

impl Default for NatsConfig {
    fn default() -> Self {
        Self::new(DEFAULT_NATS_URL)
    }
}

impl fmt::Debug for NatsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NatsConfig")
            .field("nats_url", &self.nats_url)
            .field("nats_token", &self.nats_token.as_ref().map(|_| "***"))
            .field("nats_client_name", &self.client_name())
            .field("nats_connect_timeout_secs", &self.nats_connect_timeout_secs)
            .field("nats_max_reconnects", &self.nats_max_reconnects)
            .finish()
    }
}
