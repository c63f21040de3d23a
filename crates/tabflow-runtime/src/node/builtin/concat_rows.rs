use crate::node::table::Table;
use crate::node::{
    ConfigError, ConfigSchema, DEFAULT_SLOT, Node, NodeConfig, NodeError, NodeInputs,
    NodeMetadata, NodeOutput, NodeResult, NodeType,
};

/// Appends the tables on every populated slot, in slot-name order.
///
/// The result has the union of the input columns, in order of first
/// appearance; cells a source table lacks are `null`.
#[derive(Debug)]
pub struct ConcatRows;

impl Node for ConcatRows {
    fn execute(&mut self, inputs: &NodeInputs) -> NodeResult<NodeOutput> {
        let tables = inputs
            .iter()
            .map(|(slot, value)| {
                value.as_table().ok_or_else(|| NodeError::InvalidInput {
                    slot: slot.to_owned(),
                    expected: "table",
                    found: value.kind().into(),
                })
            })
            .collect::<NodeResult<Vec<_>>>()?;

        if tables.is_empty() {
            return Err(NodeError::MissingInput {
                slot: DEFAULT_SLOT.to_owned(),
            });
        }

        let mut columns: Vec<String> = Vec::new();
        for table in &tables {
            for column in table.columns() {
                if !columns.contains(column) {
                    columns.push(column.clone());
                }
            }
        }

        let mut combined = Table::new(columns);
        for table in tables {
            let positions: Vec<Option<usize>> = combined
                .columns()
                .iter()
                .map(|column| table.column_index(column))
                .collect();

            for row in table.rows() {
                let row = positions
                    .iter()
                    .map(|position| position.map(|i| row[i].clone()).unwrap_or_default())
                    .collect();
                combined.push_row(row);
            }
        }

        Ok(NodeOutput::Table(combined))
    }
}

impl NodeType for ConcatRows {
    const TYPE_ID: &'static str = "concat_rows";

    fn metadata() -> NodeMetadata {
        super::metadata("Concatenate Rows")
    }

    fn schema() -> ConfigSchema {
        ConfigSchema::new()
    }

    fn from_config(_: &NodeConfig) -> Result<Self, ConfigError> {
        Ok(Self)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::{Value, json};

    use super::*;
    use crate::node::testing::instance;

    #[test]
    fn unions_columns_in_slot_order() {
        let first = Table::from_rows(vec!["a".into(), "b".into()], vec![vec![json!(1), json!(2)]]);
        let second = Table::from_rows(vec!["c".into(), "a".into()], vec![vec![json!(3), json!(4)]]);

        let mut node = instance::<ConcatRows>("concat", json!({}));
        node.set_input("input_2", Arc::new(NodeOutput::Table(second)));
        node.set_input("input_1", Arc::new(NodeOutput::Table(first)));

        let output = node.run().unwrap();
        let table = output.as_table().unwrap();
        assert_eq!(table.columns(), ["a", "b", "c"]);
        assert_eq!(
            table.rows(),
            [
                vec![json!(1), json!(2), Value::Null],
                vec![json!(4), Value::Null, json!(3)],
            ]
        );
    }

    #[test]
    fn non_table_input_is_rejected() {
        let mut node = instance::<ConcatRows>("concat", json!({}));
        node.set_input("input_1", Arc::new(NodeOutput::Scalar(json!(1))));

        let failure = node.run().unwrap_err();
        assert_eq!(
            failure.error.to_string(),
            "input slot 'input_1' expected table, found scalar"
        );
    }
}
