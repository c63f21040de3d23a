#[cfg(feature = "config")]
use clap::Args;
use serde::{Deserialize, Serialize};
use tabflow_runtime::engine::EngineConfig;

use crate::service::{Result, ServiceError};

/// Default values for configuration options.
mod defaults {
    /// Default bound on simultaneous workflow runs.
    pub const MAX_CONCURRENT_RUNS: usize = 8;

    /// Default number of nodes a single run executes at once.
    pub const MAX_PARALLEL_NODES: usize = 1;

    /// Default maximum upload size: 32MB.
    pub const MAX_UPLOAD_BYTES: usize = 32 * 1024 * 1024;
}

/// App [`state`] configuration.
///
/// [`state`]: crate::service::ServiceState
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
#[must_use = "config does nothing unless you use it"]
pub struct ServiceConfig {
    /// Maximum number of workflow runs executing at the same time.
    ///
    /// Further requests wait for a free slot.
    #[cfg_attr(
        feature = "config",
        arg(long, env = "MAX_CONCURRENT_RUNS", default_value_t = defaults::MAX_CONCURRENT_RUNS)
    )]
    pub max_concurrent_runs: usize,

    /// Maximum number of independent nodes one run executes at once.
    ///
    /// `1` executes every workflow strictly sequentially.
    #[cfg_attr(
        feature = "config",
        arg(long, env = "MAX_PARALLEL_NODES", default_value_t = defaults::MAX_PARALLEL_NODES)
    )]
    pub max_parallel_nodes: usize,

    /// Maximum size of a workflow upload in bytes.
    #[cfg_attr(
        feature = "config",
        arg(long, env = "MAX_UPLOAD_BYTES", default_value_t = defaults::MAX_UPLOAD_BYTES)
    )]
    pub max_upload_bytes: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            max_concurrent_runs: defaults::MAX_CONCURRENT_RUNS,
            max_parallel_nodes: defaults::MAX_PARALLEL_NODES,
            max_upload_bytes: defaults::MAX_UPLOAD_BYTES,
        }
    }
}

impl ServiceConfig {
    /// Validates all configuration values.
    ///
    /// # Errors
    ///
    /// Returns an error if any limit is zero.
    pub fn validate(&self) -> Result<()> {
        if self.max_concurrent_runs == 0 {
            return Err(ServiceError::config(
                "max_concurrent_runs must be at least 1",
            ));
        }

        if self.max_upload_bytes == 0 {
            return Err(ServiceError::config("max_upload_bytes must be at least 1"));
        }

        self.engine_config().map(|_| ())
    }

    /// Returns the engine configuration derived from these settings.
    pub fn engine_config(&self) -> Result<EngineConfig> {
        EngineConfig::builder()
            .max_parallel_nodes(self.max_parallel_nodes)
            .build()
            .map_err(|err| ServiceError::config(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = ServiceConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_concurrent_runs, 8);
        assert_eq!(config.max_upload_bytes, 32 * 1024 * 1024);
        assert!(!config.engine_config().unwrap().is_parallel());
    }

    #[test]
    fn zero_limits_are_rejected() {
        let config = ServiceConfig {
            max_concurrent_runs: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = ServiceConfig {
            max_parallel_nodes: 0,
            ..Default::default()
        };
        let error = config.validate().unwrap_err();
        assert!(error.to_string().contains("max_parallel_nodes"));
    }

    #[test]
    fn parallel_engine_config() {
        let config = ServiceConfig {
            max_parallel_nodes: 4,
            ..Default::default()
        };
        let engine = config.engine_config().unwrap();
        assert_eq!(engine.max_parallel_nodes, 4);
    }
}
