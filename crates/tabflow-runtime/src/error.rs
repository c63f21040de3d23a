//! Workflow error types.

use derive_more::Display;
use serde::Serialize;
use thiserror::Error;

use crate::definition::NodeId;
use crate::node::ConfigError;
use crate::registry::UnknownNodeType;

/// Result type for workflow operations.
pub type WorkflowResult<T> = Result<T, WorkflowError>;

/// Errors that can occur while building or running a workflow.
///
/// Build-time variants abort graph construction entirely; run-time variants
/// abort the run at the failing node.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// Node configuration does not match the step's schema.
    #[error("invalid config for node {node_id} ({node_type}): {source}")]
    Configuration {
        /// ID of the node with invalid config.
        node_id: NodeId,
        /// Type identifier of the node.
        node_type: String,
        /// Every offending field.
        #[source]
        source: ConfigError,
    },

    /// Node type is not present in the registry.
    #[error("node {node_id}: {source}")]
    UnknownNodeType {
        /// ID of the node naming the unknown type.
        node_id: NodeId,
        /// Lookup failure, including the supported type identifiers.
        #[source]
        source: UnknownNodeType,
    },

    /// Edge references a missing node or binds an occupied slot.
    #[error("invalid edge #{index} ({from} -> {to}): {issue}")]
    InvalidEdge {
        /// Position of the edge in the definition.
        index: usize,
        /// Source node ID as declared.
        from: NodeId,
        /// Target node ID as declared.
        to: NodeId,
        /// What is wrong with the edge.
        issue: EdgeIssue,
    },

    /// The edge relation is not acyclic.
    #[error("workflow contains a cycle through nodes [{}]", join_ids(.nodes))]
    CyclicGraph {
        /// Nodes that could not be ordered.
        nodes: Vec<NodeId>,
    },

    /// Two nodes share the same ID.
    #[error("duplicate node id {0}")]
    DuplicateNode(NodeId),

    /// The workflow has nothing to execute.
    #[error("workflow has no nodes")]
    EmptyWorkflow,

    /// The `configure` hook of a node failed during the build.
    #[error("node {node_id} ({node_type}) failed to configure: {message}")]
    NodeSetup {
        /// ID of the node.
        node_id: NodeId,
        /// Type identifier of the node.
        node_type: String,
        /// Error message.
        message: String,
    },

    /// A source node expected the external payload but none was supplied.
    #[error("node {node_id} ({node_type}) expected input on slot '{slot}' but none was supplied")]
    MissingInput {
        /// ID of the node.
        node_id: NodeId,
        /// Type identifier of the node.
        node_type: String,
        /// Slot that was empty.
        slot: String,
    },

    /// Node execution failed.
    #[error("node {node_id} ({node_type}) failed: {message}")]
    NodeExecution {
        /// ID of the failed node.
        node_id: NodeId,
        /// Type identifier of the node.
        node_type: String,
        /// Error message.
        message: String,
        /// Failure of the `cleanup` hook that ran afterwards, if any.
        cleanup_error: Option<String>,
    },

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl WorkflowError {
    /// Returns whether the error was raised while building the graph.
    pub const fn is_build_error(&self) -> bool {
        matches!(
            self,
            Self::Configuration { .. }
                | Self::UnknownNodeType { .. }
                | Self::InvalidEdge { .. }
                | Self::CyclicGraph { .. }
                | Self::DuplicateNode(_)
                | Self::NodeSetup { .. }
                | Self::Serialization(_)
        )
    }

    /// Returns the ID of the node the error is attributed to, if any.
    pub fn node_id(&self) -> Option<&NodeId> {
        match self {
            Self::Configuration { node_id, .. }
            | Self::UnknownNodeType { node_id, .. }
            | Self::NodeSetup { node_id, .. }
            | Self::MissingInput { node_id, .. }
            | Self::NodeExecution { node_id, .. } => Some(node_id),
            Self::DuplicateNode(node_id) => Some(node_id),
            _ => None,
        }
    }

    /// Returns the structured report of a run-time node failure.
    ///
    /// Only [`MissingInput`] and [`NodeExecution`] describe a failing node
    /// of a run; every other variant returns `None`.
    ///
    /// [`MissingInput`]: Self::MissingInput
    /// [`NodeExecution`]: Self::NodeExecution
    pub fn failure(&self) -> Option<RunFailure> {
        match self {
            Self::MissingInput {
                node_id, node_type, ..
            }
            | Self::NodeExecution {
                node_id, node_type, ..
            } => Some(RunFailure {
                failing_node_id: node_id.clone(),
                node_type: node_type.clone(),
                message: self.to_string(),
            }),
            _ => None,
        }
    }
}

/// Structured description of the node that aborted a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunFailure {
    /// ID of the failing node.
    pub failing_node_id: NodeId,
    /// Type identifier of the failing node.
    pub node_type: String,
    /// Human-readable cause.
    pub message: String,
}

/// Reason an edge was rejected by the graph builder.
#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum EdgeIssue {
    /// The source node does not exist.
    #[display("source node does not exist")]
    UnknownSource,
    /// The target node does not exist.
    #[display("target node does not exist")]
    UnknownTarget,
    /// Another edge already feeds the same input slot of the target.
    #[display("input slot '{_0}' of the target is already bound")]
    SlotAlreadyBound(String),
    /// The edge targets the slot reserved for the external payload.
    #[display("input slot '{_0}' is reserved for the run payload")]
    ReservedSlot(String),
}

fn join_ids(ids: &[NodeId]) -> String {
    ids.iter()
        .map(NodeId::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_is_reported_for_execution_errors() {
        let error = WorkflowError::NodeExecution {
            node_id: NodeId::from("b"),
            node_type: "double".into(),
            message: "boom".into(),
            cleanup_error: None,
        };

        let failure = error.failure().expect("execution errors carry a failure");
        assert_eq!(failure.failing_node_id, NodeId::from("b"));
        assert_eq!(failure.node_type, "double");
        assert!(failure.message.contains("boom"));
        assert!(!error.is_build_error());
    }

    #[test]
    fn build_errors_have_no_run_failure() {
        let error = WorkflowError::CyclicGraph {
            nodes: vec![NodeId::from("a"), NodeId::from("b")],
        };

        assert!(error.failure().is_none());
        assert!(error.is_build_error());
        assert_eq!(
            error.to_string(),
            "workflow contains a cycle through nodes [a, b]"
        );
    }

    #[test]
    fn edge_issue_names_the_slot() {
        let error = WorkflowError::InvalidEdge {
            index: 2,
            from: NodeId::from("a"),
            to: NodeId::from("c"),
            issue: EdgeIssue::SlotAlreadyBound("input_1".into()),
        };

        assert_eq!(
            error.to_string(),
            "invalid edge #2 (a -> c): input slot 'input_1' of the target is already bound"
        );
    }
}
