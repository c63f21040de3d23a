//! Per-run execution state.

use std::collections::HashMap;
use std::sync::Arc;

use crate::definition::NodeId;
use crate::error::{WorkflowError, WorkflowResult};
use crate::node::{NodeOutput, Payload};

/// State of one workflow run: the external payload and the outputs
/// produced so far.
///
/// Outputs are write-once and recorded in completion order. The context is
/// created at run start and dropped once the final result is computed.
#[derive(Debug, Default)]
pub struct ExecutionContext {
    payload: Option<Arc<NodeOutput>>,
    outputs: HashMap<NodeId, Arc<NodeOutput>>,
    completed: Vec<NodeId>,
}

impl ExecutionContext {
    /// Creates a context for a run with an optional external payload.
    pub fn new(payload: Option<Payload>) -> Self {
        Self {
            payload: payload.map(|payload| Arc::new(NodeOutput::Binary(payload))),
            outputs: HashMap::new(),
            completed: Vec::new(),
        }
    }

    /// Returns the external payload as delivered to source nodes.
    pub fn payload(&self) -> Option<&Arc<NodeOutput>> {
        self.payload.as_ref()
    }

    /// Records the output of a completed node.
    pub fn record(&mut self, id: &NodeId, output: Arc<NodeOutput>) -> WorkflowResult<()> {
        if self.outputs.contains_key(id) {
            return Err(WorkflowError::Internal(format!(
                "output of node {id} recorded twice"
            )));
        }
        self.outputs.insert(id.clone(), output);
        self.completed.push(id.clone());
        Ok(())
    }

    /// Returns the recorded output of a node.
    pub fn output(&self, id: &NodeId) -> Option<&Arc<NodeOutput>> {
        self.outputs.get(id)
    }

    /// Returns the nodes completed so far, in completion order.
    pub fn completed(&self) -> &[NodeId] {
        &self.completed
    }

    /// Consumes the context, returning the outputs and completion order.
    pub fn into_parts(self) -> (HashMap<NodeId, Arc<NodeOutput>>, Vec<NodeId>) {
        (self.outputs, self.completed)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn outputs_are_write_once() {
        let mut ctx = ExecutionContext::new(None);
        let id = NodeId::from("a");

        ctx.record(&id, Arc::new(NodeOutput::Scalar(json!(1)))).unwrap();
        assert!(ctx.record(&id, Arc::new(NodeOutput::Scalar(json!(2)))).is_err());
        assert_eq!(ctx.output(&id).unwrap().as_scalar(), Some(&json!(1)));
        assert_eq!(ctx.completed(), [id]);
        assert!(ctx.payload().is_none());
    }
}
