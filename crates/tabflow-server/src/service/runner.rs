//! Bounded execution of workflow runs off the async runtime.

use std::sync::Arc;
use std::time::Instant;

use tabflow_runtime::definition::WorkflowDefinition;
use tabflow_runtime::engine::{Engine, RunOutcome};
use tabflow_runtime::node::Payload;
use tabflow_runtime::registry::NodeRegistry;
use tokio::sync::Semaphore;

use crate::service::{Result, ServiceError};

/// Tracing target for workflow runs.
const TRACING_TARGET: &str = "tabflow_server::service::runner";

/// Executes workflow runs on blocking worker threads.
///
/// Every run builds its own graph from the shared registry, so runs share no
/// mutable state. A semaphore bounds how many runs execute at once; further
/// callers wait for a permit.
#[derive(Debug, Clone)]
pub struct WorkflowRunner {
    registry: Arc<NodeRegistry>,
    engine: Arc<Engine>,
    permits: Arc<Semaphore>,
}

impl WorkflowRunner {
    /// Creates a runner allowing `max_concurrent_runs` simultaneous runs.
    pub fn new(registry: Arc<NodeRegistry>, engine: Engine, max_concurrent_runs: usize) -> Self {
        Self {
            registry,
            engine: Arc::new(engine),
            permits: Arc::new(Semaphore::new(max_concurrent_runs)),
        }
    }

    /// Returns the registry runs are built against.
    #[inline]
    pub fn registry(&self) -> &Arc<NodeRegistry> {
        &self.registry
    }

    /// Returns how many runs could start right now.
    #[inline]
    pub fn available_permits(&self) -> usize {
        self.permits.available_permits()
    }

    /// Stops accepting new runs. Runs already executing finish normally.
    pub fn close(&self) {
        self.permits.close();
    }

    /// Builds and executes `definition` over `payload`.
    ///
    /// Waits for a free run slot first. The permit is held by the worker
    /// thread, so a caller that stops waiting does not free the slot before
    /// the run actually ends.
    pub async fn run(
        &self,
        definition: WorkflowDefinition,
        payload: Payload,
    ) -> Result<RunOutcome> {
        let permit = self
            .permits
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| ServiceError::Closed)?;

        let registry = Arc::clone(&self.registry);
        let engine = Arc::clone(&self.engine);
        let nodes = definition.nodes.len();
        let started = Instant::now();

        tracing::debug!(
            target: TRACING_TARGET,
            nodes,
            payload_bytes = payload.len(),
            "Workflow run started"
        );

        let outcome = tokio::task::spawn_blocking(move || {
            let _permit = permit;
            engine.run(&registry, definition, Some(payload))
        })
        .await
        .map_err(|err| ServiceError::Aborted(err.to_string()))?;

        let elapsed_ms = started.elapsed().as_millis() as u64;
        match &outcome {
            Ok(outcome) => tracing::info!(
                target: TRACING_TARGET,
                nodes,
                terminal = %outcome.terminal(),
                elapsed_ms,
                "Workflow run completed"
            ),
            Err(err) => tracing::warn!(
                target: TRACING_TARGET,
                nodes,
                error = %err,
                elapsed_ms,
                "Workflow run failed"
            ),
        }

        Ok(outcome?)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tabflow_runtime::WorkflowError;
    use tabflow_runtime::definition::{EdgeSpec, NodeSpec};

    use super::*;

    fn runner(max_concurrent_runs: usize) -> WorkflowRunner {
        WorkflowRunner::new(
            Arc::new(NodeRegistry::builtin()),
            Engine::with_defaults(),
            max_concurrent_runs,
        )
    }

    fn analyze() -> WorkflowDefinition {
        WorkflowDefinition::new()
            .with_node(NodeSpec::new("load", "load_csv"))
            .with_node(NodeSpec::new("stats", "analyze_data"))
            .with_edge(EdgeSpec::new("load", "stats"))
    }

    #[tokio::test]
    async fn runs_workflow_on_blocking_thread() -> anyhow::Result<()> {
        let runner = runner(2);
        let payload = Payload::new("a,b\n1,2\n3,4\n").with_name("data.csv");

        let outcome = runner.run(analyze(), payload).await?;

        assert_eq!(outcome.terminal().as_str(), "stats");
        assert_eq!(outcome.result()["row_count"], json!(2));
        assert_eq!(runner.available_permits(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn workflow_errors_pass_through() {
        let runner = runner(1);
        let definition = analyze().with_edge(EdgeSpec::new("stats", "load"));

        let error = runner
            .run(definition, Payload::new("a\n1\n"))
            .await
            .unwrap_err();

        assert!(matches!(
            error,
            ServiceError::Workflow(WorkflowError::CyclicGraph { .. })
        ));
        assert_eq!(runner.available_permits(), 1);
    }

    #[tokio::test]
    async fn closed_runner_rejects_runs() {
        let runner = runner(1);
        runner.close();

        let error = runner
            .run(analyze(), Payload::new("a\n1\n"))
            .await
            .unwrap_err();
        assert!(matches!(error, ServiceError::Closed));
    }
}
