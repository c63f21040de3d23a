//! Result of a completed workflow run.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::definition::NodeId;
use crate::node::NodeOutput;

/// Outputs of a successful run and its reduced final result.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    terminal: NodeId,
    result: Value,
    order: Vec<NodeId>,
    sinks: Vec<NodeId>,
    outputs: HashMap<NodeId, Arc<NodeOutput>>,
}

impl RunOutcome {
    pub(crate) fn new(
        terminal: NodeId,
        result: Value,
        order: Vec<NodeId>,
        sinks: Vec<NodeId>,
        outputs: HashMap<NodeId, Arc<NodeOutput>>,
    ) -> Self {
        Self {
            terminal,
            result,
            order,
            sinks,
            outputs,
        }
    }

    /// Returns the node whose output became the final result.
    pub fn terminal(&self) -> &NodeId {
        &self.terminal
    }

    /// Returns the terminal output in its canonical transport form.
    pub fn result(&self) -> &Value {
        &self.result
    }

    /// Consumes the outcome, returning the final result.
    pub fn into_result(self) -> Value {
        self.result
    }

    /// Returns the nodes in the order they completed.
    pub fn order(&self) -> &[NodeId] {
        &self.order
    }

    /// Returns the nodes without successors, in declaration order.
    pub fn sinks(&self) -> &[NodeId] {
        &self.sinks
    }

    /// Returns the output a node produced.
    pub fn output(&self, id: &NodeId) -> Option<&NodeOutput> {
        self.outputs.get(id).map(Arc::as_ref)
    }

    /// Returns every sink's output in transport form, keyed by node ID.
    pub fn sink_results(&self) -> Map<String, Value> {
        self.sinks
            .iter()
            .filter_map(|id| {
                let output = self.outputs.get(id)?;
                Some((id.to_string(), output.to_transport()))
            })
            .collect()
    }
}
