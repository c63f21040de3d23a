//! Engine configuration.

use derive_builder::Builder;

/// Configuration for the workflow execution engine.
#[derive(Debug, Clone, PartialEq, Eq, Builder)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct EngineConfig {
    /// Maximum number of nodes executing at once within a run.
    ///
    /// `1` runs nodes strictly one at a time in topological order. Larger
    /// values dispatch independent nodes of the same dependency level onto
    /// scoped worker threads, at most this many at a time.
    #[builder(default = "1")]
    pub max_parallel_nodes: usize,
}

impl EngineConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        if self.max_parallel_nodes == Some(0) {
            return Err("max_parallel_nodes must be at least 1".into());
        }
        Ok(())
    }
}

impl EngineConfig {
    /// Returns a builder for the engine configuration.
    pub fn builder() -> EngineConfigBuilder {
        EngineConfigBuilder::default()
    }

    /// Returns whether independent nodes may run concurrently.
    pub fn is_parallel(&self) -> bool {
        self.max_parallel_nodes > 1
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_parallel_nodes: 1,
        }
    }
}
