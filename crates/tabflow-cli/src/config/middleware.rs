//! Middleware configuration for the HTTP server.
//!
//! Groups the CORS policy and request recovery settings re-exported from
//! `tabflow-server`, so both can be set by CLI arguments or environment
//! variables.
//!
//! # Example
//!
//! ```bash
//! tabflow --allowed-origins "https://tabflow.example.com" --request-timeout 60
//! ```

use anyhow::{Result as AnyhowResult, anyhow};
use clap::Args;
use serde::{Deserialize, Serialize};
use tabflow_server::middleware::{CorsConfig, RecoveryConfig};

use crate::TRACING_TARGET_CONFIG;

/// Longest request timeout accepted, in seconds.
const MAX_REQUEST_TIMEOUT_SECS: u64 = 3600;

/// Middleware configuration combining CORS and recovery settings.
#[derive(Debug, Clone, Default, Args, Serialize, Deserialize)]
pub struct MiddlewareConfig {
    /// CORS (Cross-Origin Resource Sharing) configuration.
    ///
    /// Controls which browser origins may call the API.
    #[clap(flatten)]
    pub cors: CorsConfig,

    /// Recovery middleware configuration.
    ///
    /// Controls request timeout and panic recovery behavior.
    #[clap(flatten)]
    pub recovery: RecoveryConfig,
}

impl MiddlewareConfig {
    /// Validates the middleware settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the request timeout is zero or longer than an hour.
    pub fn validate(&self) -> AnyhowResult<()> {
        let timeout = self.recovery.request_timeout;
        if timeout == 0 || timeout > MAX_REQUEST_TIMEOUT_SECS {
            return Err(anyhow!(
                "Request timeout {timeout} seconds is invalid. Must be between 1 and {MAX_REQUEST_TIMEOUT_SECS} seconds."
            ));
        }

        Ok(())
    }

    /// Logs middleware configuration at info level.
    pub fn log(&self) {
        tracing::info!(
            target: TRACING_TARGET_CONFIG,
            origins = ?self.cors.allowed_origins,
            credentials = self.cors.allow_credentials,
            max_age_secs = self.cors.max_age_seconds,
            "CORS configuration"
        );

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
    fn default_config_is_valid() {
        assert!(MiddlewareConfig::default().validate().is_ok());
    }

    #[test]
    fn reject_invalid_request_timeouts() {
        let mut config = MiddlewareConfig::default();

        config.recovery.request_timeout = 0;
        assert!(config.validate().is_err());

        config.recovery.request_timeout = MAX_REQUEST_TIMEOUT_SECS + 1;
        assert!(config.validate().is_err());

        config.recovery.request_timeout = 60;
        assert!(config.validate().is_ok());
    }
}
