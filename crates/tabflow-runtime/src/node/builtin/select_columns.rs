use std::collections::HashSet;

use crate::node::{
    ConfigError, ConfigSchema, FieldKind, Node, NodeConfig, NodeInputs, NodeMetadata, NodeOutput,
    NodeResult, NodeType,
};

/// Projects the input onto the listed columns, in the listed order.
#[derive(Debug)]
pub struct SelectColumns {
    columns: Vec<String>,
}

impl Node for SelectColumns {
    fn execute(&mut self, inputs: &NodeInputs) -> NodeResult<NodeOutput> {
        let table = inputs.single_table()?;
        Ok(NodeOutput::Table(table.select(&self.columns)?))
    }
}

impl NodeType for SelectColumns {
    const TYPE_ID: &'static str = "select_columns";

    fn metadata() -> NodeMetadata {
        super::metadata("Select Columns")
    }

    fn schema() -> ConfigSchema {
        ConfigSchema::new().required("columns", FieldKind::StringList)
    }

    fn check(config: &NodeConfig) -> Result<(), ConfigError> {
        let columns = config.get_string_list("columns").unwrap_or_default();
        if columns.is_empty() {
            return Err(ConfigError::single("columns", "must name at least one column"));
        }

        let mut seen = HashSet::with_capacity(columns.len());
        if let Some(duplicate) = columns.iter().find(|name| !seen.insert(name.as_str())) {
            return Err(ConfigError::single(
                "columns",
                format!("column '{duplicate}' is listed more than once"),
            ));
        }
        Ok(())
    }

    fn from_config(config: &NodeConfig) -> Result<Self, ConfigError> {
        Self::check(config)?;
        let columns = config.get_string_list("columns").unwrap_or_default();
        Ok(Self { columns })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::*;
    use crate::node::DEFAULT_SLOT;
    use crate::node::table::Table;
    use crate::node::testing::instance;

    #[test]
    fn projects_columns() {
        let table = Table::from_rows(
            vec!["a".into(), "b".into(), "c".into()],
            vec![vec![json!(1), json!(2), json!(3)]],
        );

        let mut node = instance::<SelectColumns>("select", json!({ "columns": ["c", "a"] }));
        node.set_input(DEFAULT_SLOT, Arc::new(NodeOutput::Table(table)));

        let output = node.run().unwrap();
        assert_eq!(output.to_transport(), json!([{ "c": 3, "a": 1 }]));
    }

    fn check(columns: serde_json::Value) -> Result<(), ConfigError> {
        let config = SelectColumns::schema()
            .validate(json!({ "columns": columns }).as_object().unwrap())
            .unwrap();
        SelectColumns::check(&config)
    }

    #[test]
    fn empty_column_list_is_rejected() {
        assert!(check(json!([])).unwrap_err().names("columns"));
    }

    #[test]
    fn repeated_column_is_rejected() {
        let error = check(json!(["a", "b", "a"])).unwrap_err();
        assert!(error.names("columns"));
        assert!(error.to_string().contains("'a'"));
        assert!(check(json!(["a", "b"])).is_ok());
    }
}
