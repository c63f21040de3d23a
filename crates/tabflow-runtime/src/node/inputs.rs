//! Named input slots of a node.

use std::collections::BTreeMap;
use std::sync::Arc;

use super::error::{NodeError, NodeResult};
use super::output::{NodeOutput, Payload};
use super::table::Table;

/// Slot that receives a predecessor's output when the edge names no handle.
pub const DEFAULT_SLOT: &str = "input_1";

/// Reserved slot that receives the run's external payload on source nodes.
pub const PAYLOAD_SLOT: &str = "payload";

/// Values attached to a node's input slots before execution.
///
/// Slots iterate in name order, so `input_1` precedes `input_2`.
#[derive(Debug, Clone, Default)]
pub struct NodeInputs {
    slots: BTreeMap<String, Arc<NodeOutput>>,
}

impl NodeInputs {
    /// Creates an empty slot set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a value in a slot, replacing any previous value.
    pub fn insert(&mut self, slot: impl Into<String>, value: Arc<NodeOutput>) {
        self.slots.insert(slot.into(), value);
    }

    /// Returns the value of a slot.
    pub fn get(&self, slot: &str) -> Option<&NodeOutput> {
        self.slots.get(slot).map(Arc::as_ref)
    }

    /// Returns the value of a slot or a [`NodeError::MissingInput`].
    pub fn require(&self, slot: &str) -> NodeResult<&NodeOutput> {
        self.get(slot).ok_or_else(|| NodeError::MissingInput {
            slot: slot.to_owned(),
        })
    }

    /// Returns the external payload delivered to a source node.
    pub fn payload(&self) -> NodeResult<&Payload> {
        match self.require(PAYLOAD_SLOT)? {
            NodeOutput::Binary(payload) => Ok(payload),
            other => Err(NodeError::InvalidInput {
                slot: PAYLOAD_SLOT.to_owned(),
                expected: "binary",
                found: other.kind().into(),
            }),
        }
    }

    /// Returns the only populated slot.
    ///
    /// Single-input steps use this so they work whatever handle the edge
    /// named. Fails when no slot or more than one slot is populated.
    pub fn single(&self) -> NodeResult<(&str, &NodeOutput)> {
        let mut slots = self.iter();
        match (slots.next(), slots.next()) {
            (Some(only), None) => Ok(only),
            (None, _) => Err(NodeError::MissingInput {
                slot: DEFAULT_SLOT.to_owned(),
            }),
            (Some(_), Some(_)) => Err(NodeError::failed(format!(
                "expected a single input, found {} populated slots",
                self.len()
            ))),
        }
    }

    /// Returns the only populated slot as a table.
    pub fn single_table(&self) -> NodeResult<&Table> {
        let (slot, value) = self.single()?;
        value.as_table().ok_or_else(|| NodeError::InvalidInput {
            slot: slot.to_owned(),
            expected: "table",
            found: value.kind().into(),
        })
    }

    /// Iterates over populated slots in slot-name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &NodeOutput)> {
        self.slots
            .iter()
            .map(|(slot, value)| (slot.as_str(), value.as_ref()))
    }

    /// Returns the number of populated slots.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns whether no slot is populated.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Detaches every value.
    pub fn clear(&mut self) {
        self.slots.clear();
    }
}
