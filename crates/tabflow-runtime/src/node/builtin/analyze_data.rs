use std::cmp::Ordering;
use std::collections::HashSet;

use serde_json::{Map, Value, json};

use crate::node::table::Table;
use crate::node::{
    ConfigError, ConfigSchema, FieldKind, Node, NodeConfig, NodeInputs, NodeMetadata, NodeOutput,
    NodeResult, NodeType,
};

/// Summarizes the input table as a record of statistics.
///
/// The record always carries `row_count`, `column_count`, `duplicate_rows`
/// and `missing_cells`. With `include_columns` it also carries a `columns`
/// object with per-column type, null and distinct counts, plus `count`,
/// `mean`, `min` and `max` for numeric columns.
#[derive(Debug)]
pub struct AnalyzeData {
    include_columns: bool,
}

impl Node for AnalyzeData {
    fn execute(&mut self, inputs: &NodeInputs) -> NodeResult<NodeOutput> {
        let table = inputs.single_table()?;

        let mut seen = HashSet::new();
        let duplicate_rows = table
            .rows()
            .iter()
            .filter(|row| !seen.insert(Value::Array(row.to_vec()).to_string()))
            .count();
        let missing_cells = table
            .rows()
            .iter()
            .flatten()
            .filter(|cell| cell.is_null())
            .count();

        let mut summary = Map::new();
        summary.insert("row_count".into(), table.num_rows().into());
        summary.insert("column_count".into(), table.num_columns().into());
        summary.insert("duplicate_rows".into(), duplicate_rows.into());
        summary.insert("missing_cells".into(), missing_cells.into());

        if self.include_columns {
            let columns = table
                .columns()
                .iter()
                .enumerate()
                .map(|(index, name)| (name.clone(), describe_column(table, index)))
                .collect();
            summary.insert("columns".into(), Value::Object(columns));
        }

        Ok(NodeOutput::Record(summary))
    }
}

fn describe_column(table: &Table, index: usize) -> Value {
    let values: Vec<&Value> = table
        .column_values(index)
        .filter(|value| !value.is_null())
        .collect();
    let nulls = table.num_rows() - values.len();
    let unique = values
        .iter()
        .map(|value| value.to_string())
        .collect::<HashSet<_>>()
        .len();

    let dtype = column_type(&values);
    let mut description = json!({
        "dtype": dtype,
        "non_null": values.len(),
        "nulls": nulls,
        "unique": unique,
    });

    if matches!(dtype, "integer" | "number") {
        let sum: f64 = values.iter().filter_map(|value| value.as_f64()).sum();
        let min = values.iter().copied().min_by(|a, b| numeric_cmp(a, b));
        let max = values.iter().copied().max_by(|a, b| numeric_cmp(a, b));

        if let Value::Object(description) = &mut description {
            description.insert("count".into(), values.len().into());
            description.insert("mean".into(), (sum / values.len() as f64).into());
            description.insert("min".into(), min.cloned().unwrap_or_default());
            description.insert("max".into(), max.cloned().unwrap_or_default());
        }
    }

    description
}

/// Orders two JSON numbers, exactly when both fit the same integer type.
fn numeric_cmp(a: &Value, b: &Value) -> Ordering {
    if let (Some(a), Some(b)) = (a.as_i64(), b.as_i64()) {
        return a.cmp(&b);
    }
    if let (Some(a), Some(b)) = (a.as_u64(), b.as_u64()) {
        return a.cmp(&b);
    }
    match (a.as_f64(), b.as_f64()) {
        (Some(a), Some(b)) => a.total_cmp(&b),
        _ => Ordering::Equal,
    }
}

fn column_type(values: &[&Value]) -> &'static str {
    if values.is_empty() {
        "empty"
    } else if values.iter().all(|value| value.is_i64() || value.is_u64()) {
        "integer"
    } else if values.iter().all(|value| value.is_number()) {
        "number"
    } else if values.iter().all(|value| value.is_boolean()) {
        "boolean"
    } else if values.iter().all(|value| value.is_string()) {
        "string"
    } else {
        "mixed"
    }
}

impl NodeType for AnalyzeData {
    const TYPE_ID: &'static str = "analyze_data";

    fn metadata() -> NodeMetadata {
        super::metadata("Analyze Data")
    }

    fn schema() -> ConfigSchema {
        ConfigSchema::new().with_default("include_columns", FieldKind::Boolean, true)
    }

    fn from_config(config: &NodeConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            include_columns: config.get_bool("include_columns").unwrap_or(true),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::node::DEFAULT_SLOT;
    use crate::node::testing::instance;

    fn analyze(config: Value) -> Value {
        let table = Table::from_rows(
            vec!["city".into(), "sales".into(), "price".into()],
            vec![
                vec![json!("Oslo"), json!(10), json!(1.5)],
                vec![json!("Rome"), json!(4), Value::Null],
                vec![json!("Oslo"), json!(10), json!(1.5)],
            ],
        );

        let mut node = instance::<AnalyzeData>("analyze", config);
        node.set_input(DEFAULT_SLOT, Arc::new(NodeOutput::Table(table)));
        node.run().unwrap().to_transport()
    }

    #[test]
    fn summarizes_table() {
        let summary = analyze(json!({}));

        assert_eq!(summary["row_count"], json!(3));
        assert_eq!(summary["column_count"], json!(3));
        assert_eq!(summary["duplicate_rows"], json!(1));
        assert_eq!(summary["missing_cells"], json!(1));

        assert_eq!(
            summary["columns"]["city"],
            json!({ "dtype": "string", "non_null": 3, "nulls": 0, "unique": 2 })
        );
        assert_eq!(
            summary["columns"]["sales"],
            json!({
                "dtype": "integer",
                "non_null": 3,
                "nulls": 0,
                "unique": 2,
                "count": 3,
                "mean": 8.0,
                "min": 4,
                "max": 10,
            })
        );
        assert_eq!(summary["columns"]["price"]["dtype"], json!("number"));
        assert_eq!(summary["columns"]["price"]["nulls"], json!(1));
        assert_eq!(summary["columns"]["price"]["mean"], json!(1.5));
    }

    #[test]
    fn column_details_are_optional() {
        let summary = analyze(json!({ "include_columns": false }));
        assert!(summary.get("columns").is_none());
        assert_eq!(summary["row_count"], json!(3));
    }

    #[test]
    fn integer_extremes_keep_their_exact_value() {
        let table = Table::from_rows(
            vec!["id".into()],
            vec![
                vec![json!(u64::MAX)],
                vec![json!(u64::MAX - 1)],
                vec![json!(-3)],
            ],
        );

        let mut node = instance::<AnalyzeData>("analyze", json!({}));
        node.set_input(DEFAULT_SLOT, Arc::new(NodeOutput::Table(table)));
        let summary = node.run().unwrap().to_transport();

        let id = &summary["columns"]["id"];
        assert_eq!(id["dtype"], json!("integer"));
        assert_eq!(id["min"], json!(-3));
        assert_eq!(id["max"], json!(u64::MAX));
    }
}
