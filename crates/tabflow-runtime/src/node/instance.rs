//! A constructed node and its per-run state.

use std::sync::Arc;
use std::time::Instant;

use super::TRACING_TARGET;
use super::config::NodeConfig;
use super::contract::{Node, NodeStatus, NodeStatusSnapshot};
use super::error::{NodeError, NodeResult};
use super::inputs::NodeInputs;
use super::output::NodeOutput;
use crate::definition::NodeId;

/// Failure of one node execution.
#[derive(Debug)]
pub struct NodeFailure {
    /// Error raised by `prepare` or `execute`.
    pub error: NodeError,
    /// Error raised by the `cleanup` that followed, if any.
    pub cleanup_error: Option<String>,
}

/// A node of a built graph: validated config, lifecycle state and the step
/// implementation itself.
///
/// The config is fixed at construction. Status, inputs and output belong to
/// the current run and are cleared by [`reset`].
///
/// [`reset`]: NodeInstance::reset
#[derive(Debug)]
pub struct NodeInstance {
    id: NodeId,
    node_type: &'static str,
    label: String,
    config: NodeConfig,
    status: NodeStatus,
    error_detail: Option<String>,
    inputs: NodeInputs,
    output: Option<Arc<NodeOutput>>,
    inner: Box<dyn Node>,
}

impl NodeInstance {
    pub(crate) fn new(
        id: NodeId,
        node_type: &'static str,
        label: String,
        config: NodeConfig,
        inner: Box<dyn Node>,
    ) -> Self {
        Self {
            id,
            node_type,
            label,
            config,
            status: NodeStatus::Pending,
            error_detail: None,
            inputs: NodeInputs::new(),
            output: None,
            inner,
        }
    }

    /// Returns the node ID.
    pub fn id(&self) -> &NodeId {
        &self.id
    }

    /// Returns the step type identifier.
    pub fn node_type(&self) -> &'static str {
        self.node_type
    }

    /// Returns the display label.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Returns the validated config.
    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    /// Returns the current status.
    pub fn status(&self) -> NodeStatus {
        self.status
    }

    /// Returns the failure detail of the current run.
    pub fn error_detail(&self) -> Option<&str> {
        self.error_detail.as_deref()
    }

    /// Returns the attached inputs.
    pub fn inputs(&self) -> &NodeInputs {
        &self.inputs
    }

    /// Returns the output produced in the current run.
    pub fn output(&self) -> Option<&Arc<NodeOutput>> {
        self.output.as_ref()
    }

    /// Records a value into a named input slot.
    pub fn set_input(&mut self, slot: impl Into<String>, value: Arc<NodeOutput>) {
        self.inputs.insert(slot, value);
    }

    /// Returns a read-only snapshot of the node's state.
    pub fn status_snapshot(&self) -> NodeStatusSnapshot {
        NodeStatusSnapshot {
            id: self.id.clone(),
            label: self.label.clone(),
            status: self.status,
            error: self.error_detail.clone(),
        }
    }

    /// Clears run state: status back to pending, no inputs, no output.
    pub fn reset(&mut self) {
        self.status = NodeStatus::Pending;
        self.error_detail = None;
        self.inputs.clear();
        self.output = None;
    }

    pub(crate) fn mark_failed(&mut self, detail: impl Into<String>) {
        self.status = NodeStatus::Failed;
        self.error_detail = Some(detail.into());
    }

    pub(crate) fn configure(&mut self) -> NodeResult<()> {
        self.inner.configure()
    }

    /// Runs `prepare` and `execute`, then always `cleanup`.
    pub(crate) fn run(&mut self) -> Result<Arc<NodeOutput>, NodeFailure> {
        self.status = NodeStatus::Running;
        self.error_detail = None;
        let started = Instant::now();

        let result = match self.inner.prepare(&self.inputs) {
            Ok(()) => self.inner.execute(&self.inputs),
            Err(err) => Err(err),
        };
        let cleanup = self.inner.cleanup();

        match result {
            Ok(output) => {
                if let Err(err) = cleanup {
                    tracing::warn!(
                        target: TRACING_TARGET,
                        node_id = %self.id,
                        node_type = self.node_type,
                        error = %err,
                        "Cleanup failed after successful execution"
                    );
                }

                let output = Arc::new(output);
                self.output = Some(Arc::clone(&output));
                self.status = NodeStatus::Succeeded;

                tracing::debug!(
                    target: TRACING_TARGET,
                    node_id = %self.id,
                    node_type = self.node_type,
                    output_kind = %output.kind(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Node succeeded"
                );
                Ok(output)
            }
            Err(error) => {
                self.status = NodeStatus::Failed;
                self.error_detail = Some(error.to_string());

                let cleanup_error = cleanup.err().map(|err| err.to_string());
                if let Some(cleanup_error) = &cleanup_error {
                    tracing::warn!(
                        target: TRACING_TARGET,
                        node_id = %self.id,
                        node_type = self.node_type,
                        error = %cleanup_error,
                        "Cleanup failed after failed execution"
                    );
                }

                Err(NodeFailure {
                    error,
                    cleanup_error,
                })
            }
        }
    }
}
