//! Workflow graph model and builder.
//!
//! - [`WorkflowGraph`]: constructed nodes and the slot-labelled edges
//!   between them, with deterministic ordering queries
//! - [`GraphBuilder`]: validates a [`WorkflowDefinition`] and builds a graph
//! - [`EdgeData`]: the slot binding stored on each edge
//!
//! [`WorkflowDefinition`]: crate::definition::WorkflowDefinition

mod builder;
mod graph;

pub use builder::GraphBuilder;
pub use graph::{EdgeData, WorkflowGraph};

/// Tracing target for graph construction.
pub const TRACING_TARGET: &str = "tabflow_runtime::graph";
