use std::collections::HashSet;

use serde_json::Value;

use crate::node::{
    ConfigError, ConfigSchema, FieldKind, Node, NodeConfig, NodeInputs, NodeMetadata, NodeOutput,
    NodeResult, NodeType,
};

/// Drops duplicate rows, keeping the first occurrence.
///
/// Duplicates are judged on the `subset` columns, or on every column when
/// `subset` is empty. With `drop_empty_rows` set, rows whose cells are all
/// `null` are removed first.
#[derive(Debug)]
pub struct CleanData {
    subset: Vec<String>,
    drop_empty_rows: bool,
}

impl Node for CleanData {
    fn execute(&mut self, inputs: &NodeInputs) -> NodeResult<NodeOutput> {
        let mut table = inputs.single_table()?.clone();

        let key_columns = if self.subset.is_empty() {
            (0..table.num_columns()).collect()
        } else {
            self.subset
                .iter()
                .map(|column| table.require_column(column))
                .collect::<NodeResult<Vec<_>>>()?
        };

        if self.drop_empty_rows {
            table.retain_rows(|row| row.iter().any(|cell| !cell.is_null()));
        }

        let mut seen = HashSet::new();
        table.retain_rows(|row| {
            let key: Vec<Value> = key_columns.iter().map(|&i| row[i].clone()).collect();
            seen.insert(Value::Array(key).to_string())
        });

        Ok(NodeOutput::Table(table))
    }
}

impl NodeType for CleanData {
    const TYPE_ID: &'static str = "clean_data";

    fn metadata() -> NodeMetadata {
        super::metadata("Clean Data")
    }

    fn schema() -> ConfigSchema {
        ConfigSchema::new()
            .with_default("subset", FieldKind::StringList, Value::Array(Vec::new()))
            .with_default("drop_empty_rows", FieldKind::Boolean, false)
    }

    fn from_config(config: &NodeConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            subset: config.get_string_list("subset").unwrap_or_default(),
            drop_empty_rows: config.get_bool("drop_empty_rows").unwrap_or_default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::*;
    use crate::node::table::Table;
    use crate::node::testing::instance;
    use crate::node::{DEFAULT_SLOT, NodeError};

    fn table() -> Table {
        Table::from_rows(
            vec!["city".into(), "sales".into()],
            vec![
                vec![json!("Oslo"), json!(1)],
                vec![json!("Oslo"), json!(1)],
                vec![Value::Null, Value::Null],
                vec![json!("Oslo"), json!(2)],
                vec![Value::Null, Value::Null],
            ],
        )
    }

    fn run(config: Value) -> NodeResult<Table> {
        let mut node = instance::<CleanData>("clean", config);
        node.set_input(DEFAULT_SLOT, Arc::new(NodeOutput::Table(table())));
        node.run()
            .map(|output| output.as_table().cloned().unwrap_or_default())
            .map_err(|failure| failure.error)
    }

    #[test]
    fn removes_exact_duplicates() {
        let cleaned = run(json!({})).unwrap();
        assert_eq!(cleaned.num_rows(), 3);
        assert_eq!(cleaned.rows()[1], vec![Value::Null, Value::Null]);
    }

    #[test]
    fn drops_empty_rows() {
        let cleaned = run(json!({ "drop_empty_rows": true })).unwrap();
        assert_eq!(cleaned.num_rows(), 2);
    }

    #[test]
    fn subset_narrows_the_key() {
        let cleaned = run(json!({ "subset": ["city"], "drop_empty_rows": true })).unwrap();
        assert_eq!(cleaned.rows(), [vec![json!("Oslo"), json!(1)]]);
    }

    #[test]
    fn unknown_subset_column_fails() {
        let error = run(json!({ "subset": ["region"] })).unwrap_err();
        assert!(matches!(error, NodeError::ColumnNotFound { .. }));
    }
}
