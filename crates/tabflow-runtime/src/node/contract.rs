//! The contract every step type implements.

use std::fmt;

use semver::Version;
use serde::Serialize;
use serde_json::{Map, Value};
use strum::{AsRefStr, Display, EnumString};

use super::config::{ConfigError, ConfigSchema, NodeConfig};
use super::error::NodeResult;
use super::inputs::NodeInputs;
use super::output::NodeOutput;
use crate::definition::NodeId;

/// Behavior of one workflow step.
///
/// Only [`execute`] is mandatory. The lifecycle hooks default to no-ops:
/// [`configure`] runs once after construction, [`prepare`] after inputs are
/// attached, and [`cleanup`] after every execution whether it failed or not.
///
/// [`execute`]: Node::execute
/// [`configure`]: Node::configure
/// [`prepare`]: Node::prepare
/// [`cleanup`]: Node::cleanup
pub trait Node: Send + fmt::Debug {
    /// Performs setup that does not depend on input data.
    fn configure(&mut self) -> NodeResult<()> {
        Ok(())
    }

    /// Inspects attached inputs before execution.
    fn prepare(&mut self, _inputs: &NodeInputs) -> NodeResult<()> {
        Ok(())
    }

    /// Transforms the attached inputs into an output.
    fn execute(&mut self, inputs: &NodeInputs) -> NodeResult<NodeOutput>;

    /// Releases resources acquired by the other hooks.
    fn cleanup(&mut self) -> NodeResult<()> {
        Ok(())
    }
}

/// A registrable step type: a [`Node`] with a static identity.
pub trait NodeType: Node + Sized + 'static {
    /// Identifier used in workflow definitions.
    const TYPE_ID: &'static str;

    /// Returns descriptive information shared by every instance.
    fn metadata() -> NodeMetadata;

    /// Returns the allow-list of configuration fields.
    fn schema() -> ConfigSchema;

    /// Checks cross-field rules the schema cannot express.
    ///
    /// Runs for every node of a definition before any node is constructed.
    fn check(_config: &NodeConfig) -> Result<(), ConfigError> {
        Ok(())
    }

    /// Constructs the step from a config that passed [`NodeType::check`].
    fn from_config(config: &NodeConfig) -> Result<Self, ConfigError>;
}

/// Lifecycle state of a node instance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[derive(AsRefStr, Display, EnumString)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum NodeStatus {
    /// Not yet executed in the current run.
    #[default]
    Pending,
    /// Currently executing.
    Running,
    /// Executed and produced an output.
    Succeeded,
    /// Execution failed.
    Failed,
}

impl NodeStatus {
    /// Returns whether the node reached a final state in the current run.
    pub const fn is_finished(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }
}

/// Read-only view of a node's state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeStatusSnapshot {
    /// Node ID.
    pub id: NodeId,
    /// Display label.
    pub label: String,
    /// Current status.
    pub status: NodeStatus,
    /// Failure detail when the status is [`NodeStatus::Failed`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Static descriptive information about a step type.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeMetadata {
    /// Default display label.
    pub label: String,
    /// Author of the step.
    pub author: String,
    /// Version of the step implementation.
    pub version: Version,
    /// Free-form hints about the resources the step uses.
    #[serde(skip_serializing_if = "Map::is_empty")]
    pub resource_hints: Map<String, Value>,
}

impl NodeMetadata {
    /// Creates metadata with no resource hints.
    pub fn new(label: impl Into<String>, author: impl Into<String>, version: Version) -> Self {
        Self {
            label: label.into(),
            author: author.into(),
            version,
            resource_hints: Map::new(),
        }
    }

    /// Adds a resource hint.
    pub fn with_hint(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.resource_hints.insert(key.into(), value.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn status_string_forms() {
        assert_eq!(NodeStatus::default(), NodeStatus::Pending);
        assert_eq!(NodeStatus::Succeeded.to_string(), "SUCCEEDED");
        assert_eq!(NodeStatus::from_str("FAILED").unwrap(), NodeStatus::Failed);
        assert_eq!(
            serde_json::to_value(NodeStatus::Running).unwrap(),
            serde_json::json!("RUNNING")
        );
        assert!(!NodeStatus::Running.is_finished());
    }
}
