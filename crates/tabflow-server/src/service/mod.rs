//! Application state and dependency injection.

mod config;
mod error;
mod runner;

use std::sync::Arc;

use tabflow_runtime::engine::Engine;
use tabflow_runtime::registry::NodeRegistry;

pub use crate::service::config::ServiceConfig;
pub use crate::service::error::{Result, ServiceError};
pub use crate::service::runner::WorkflowRunner;

/// Tracing target for service initialization.
const TRACING_TARGET: &str = "tabflow_server::service";

/// Application state.
///
/// Used for the [`State`] extraction (dependency injection).
///
/// [`State`]: axum::extract::State
#[must_use = "state does nothing unless you use it"]
#[derive(Debug, Clone)]
pub struct ServiceState {
    registry: Arc<NodeRegistry>,
    runner: WorkflowRunner,
    config: Arc<ServiceConfig>,
}

impl ServiceState {
    /// Initializes application state with the built-in step types.
    pub fn from_config(config: &ServiceConfig) -> Result<Self> {
        Self::with_registry(config, NodeRegistry::builtin())
    }

    /// Initializes application state with a custom step registry.
    pub fn with_registry(config: &ServiceConfig, registry: NodeRegistry) -> Result<Self> {
        config.validate()?;

        let registry = Arc::new(registry);
        let engine = Engine::new(config.engine_config()?)?;
        let runner = WorkflowRunner::new(
            Arc::clone(&registry),
            engine,
            config.max_concurrent_runs,
        );

        tracing::info!(
            target: TRACING_TARGET,
            node_types = registry.len(),
            max_concurrent_runs = config.max_concurrent_runs,
            max_parallel_nodes = config.max_parallel_nodes,
            "Service state initialized"
        );

        Ok(Self {
            registry,
            runner,
            config: Arc::new(config.clone()),
        })
    }

    /// Returns the configuration the state was built from.
    #[inline]
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Returns the runner executing workflow runs.
    #[inline]
    pub fn runner(&self) -> &WorkflowRunner {
        &self.runner
    }
}

macro_rules! impl_di {
    ($($f:ident: $t:ty),+) => {$(
        impl axum::extract::FromRef<ServiceState> for $t {
            fn from_ref(state: &ServiceState) -> Self {
                state.$f.clone()
            }
        }
    )+};
}

impl_di!(registry: Arc<NodeRegistry>);
impl_di!(runner: WorkflowRunner);
impl_di!(config: Arc<ServiceConfig>);
