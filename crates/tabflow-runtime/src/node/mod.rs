//! The node contract and everything a step needs to implement it.
//!
//! - [`Node`] / [`NodeType`]: lifecycle hooks and static identity of a step
//! - [`ConfigSchema`] / [`NodeConfig`]: declared and validated configuration
//! - [`NodeInputs`] / [`NodeOutput`]: slot-addressed inputs and tagged outputs
//! - [`NodeInstance`]: a constructed node with its per-run state
//! - [`builtin`]: the built-in step vocabulary

pub mod builtin;
mod config;
mod contract;
mod error;
mod inputs;
mod instance;
mod output;
pub mod table;

#[cfg(test)]
pub(crate) mod testing;

pub use config::{
    ConfigError, ConfigIssue, ConfigSchema, FieldKind, FieldSpec, NodeConfig, Requirement,
};
pub use contract::{Node, NodeMetadata, NodeStatus, NodeStatusSnapshot, NodeType};
pub use error::{NodeError, NodeResult};
pub use inputs::{DEFAULT_SLOT, NodeInputs, PAYLOAD_SLOT};
pub use instance::{NodeFailure, NodeInstance};
pub use output::{NodeOutput, OutputKind, Payload};

/// Tracing target for node execution.
pub const TRACING_TARGET: &str = "tabflow_runtime::node";
