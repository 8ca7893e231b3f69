//! Middleware configuration for the HTTP server.

use batchzip_server::middleware::RecoveryConfig;
use clap::Args;
use serde::{Deserialize, Serialize};

use crate::TRACING_TARGET_CONFIG;

/// Middleware configuration.
#[derive(Debug, Clone, Default, Args, Serialize, Deserialize)]
pub struct MiddlewareConfig {
    /// Request timeout and panic recovery.
    #[clap(flatten)]
    #[serde(default)]
    pub recovery: RecoveryConfig,
}

impl MiddlewareConfig {
    /// Rejects a zero request timeout.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.recovery.request_timeout == 0 {
            anyhow::bail!("Request timeout must be at least one second");
        }

        Ok(())
    }

    /// Logs middleware configuration at info level.
    pub fn log(&self) {
        tracing::info!(
            target: TRACING_TARGET_CONFIG,
            request_timeout_secs = self.recovery.request_timeout,
            "Recovery configuration"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_zero_request_timeout() {
        assert!(MiddlewareConfig::default().validate().is_ok());

        let config = MiddlewareConfig {
            recovery: RecoveryConfig::with_timeout_secs(0),
        };
        assert!(config.validate().is_err());
    }
}
