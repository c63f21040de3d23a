//! Prelude module for convenient imports.
//!
//! This module re-exports commonly used types for ergonomic imports:
//!
//! ```rust
//! use tabflow_runtime::prelude::*;
//! ```

pub use crate::definition::{EdgeSpec, NodeId, NodeSpec, WorkflowDefinition, WorkflowMetadata};
pub use crate::engine::{Engine, EngineConfig, RunOutcome};
pub use crate::error::{RunFailure, WorkflowError, WorkflowResult};
pub use crate::graph::{GraphBuilder, WorkflowGraph};
pub use crate::node::{
    ConfigError, ConfigSchema, FieldKind, Node, NodeConfig, NodeError, NodeInputs, NodeMetadata,
    NodeOutput, NodeResult, NodeStatus, NodeType, Payload,
};
pub use crate::registry::NodeRegistry;
