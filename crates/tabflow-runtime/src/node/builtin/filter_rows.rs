use std::cmp::Ordering;

use serde_json::Value;
use strum::{AsRefStr, Display, EnumString, VariantNames};

use crate::node::{
    ConfigError, ConfigSchema, FieldKind, Node, NodeConfig, NodeInputs, NodeMetadata, NodeOutput,
    NodeResult, NodeType,
};

/// Comparison applied by [`FilterRows`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[derive(AsRefStr, Display, EnumString, VariantNames)]
#[strum(serialize_all = "snake_case")]
pub enum FilterOperator {
    /// Cell equals the value.
    Eq,
    /// Cell differs from the value.
    Ne,
    /// Cell is greater than the value.
    Gt,
    /// Cell is greater than or equal to the value.
    Ge,
    /// Cell is less than the value.
    Lt,
    /// Cell is less than or equal to the value.
    Le,
    /// Cell text contains the value text.
    Contains,
    /// Cell is `null`.
    IsNull,
    /// Cell is not `null`.
    NotNull,
}

impl FilterOperator {
    /// Returns whether the operator compares against a value.
    pub const fn takes_value(self) -> bool {
        !matches!(self, Self::IsNull | Self::NotNull)
    }

    /// Returns whether `cell` satisfies the operator against `value`.
    pub fn matches(self, cell: &Value, value: &Value) -> bool {
        match self {
            Self::IsNull => cell.is_null(),
            Self::NotNull => !cell.is_null(),
            Self::Eq => loose_eq(cell, value),
            Self::Ne => !loose_eq(cell, value),
            Self::Gt => compare(cell, value) == Some(Ordering::Greater),
            Self::Ge => matches!(compare(cell, value), Some(Ordering::Greater | Ordering::Equal)),
            Self::Lt => compare(cell, value) == Some(Ordering::Less),
            Self::Le => matches!(compare(cell, value), Some(Ordering::Less | Ordering::Equal)),
            Self::Contains => match (cell, value) {
                (Value::String(cell), Value::String(needle)) => cell.contains(needle.as_str()),
                (Value::String(cell), Value::Null) => cell.is_empty(),
                (Value::String(cell), other) => cell.contains(&other.to_string()),
                _ => false,
            },
        }
    }
}

fn loose_eq(cell: &Value, value: &Value) -> bool {
    match (cell.as_f64(), value.as_f64()) {
        (Some(a), Some(b)) => a == b,
        _ => cell == value,
    }
}

fn compare(cell: &Value, value: &Value) -> Option<Ordering> {
    match (cell, value) {
        (Value::Number(a), Value::Number(b)) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

/// Keeps the rows whose `column` cell satisfies `operator` against `value`.
#[derive(Debug)]
pub struct FilterRows {
    column: String,
    operator: FilterOperator,
    value: Value,
}

impl Node for FilterRows {
    fn execute(&mut self, inputs: &NodeInputs) -> NodeResult<NodeOutput> {
        let mut table = inputs.single_table()?.clone();
        let index = table.require_column(&self.column)?;

        let before = table.num_rows();
        table.retain_rows(|row| self.operator.matches(&row[index], &self.value));

        tracing::debug!(
            target: crate::node::TRACING_TARGET,
            column = %self.column,
            operator = %self.operator,
            kept = table.num_rows(),
            dropped = before - table.num_rows(),
            "Filtered rows"
        );
        Ok(NodeOutput::Table(table))
    }
}

impl NodeType for FilterRows {
    const TYPE_ID: &'static str = "filter_rows";

    fn metadata() -> NodeMetadata {
        super::metadata("Filter Rows")
    }

    fn schema() -> ConfigSchema {
        ConfigSchema::new()
            .required("column", FieldKind::String)
            .with_default("operator", FieldKind::String, "eq")
            .optional("value", FieldKind::Any)
    }

    fn check(config: &NodeConfig) -> Result<(), ConfigError> {
        operand(config).map(drop)
    }

    fn from_config(config: &NodeConfig) -> Result<Self, ConfigError> {
        let (operator, value) = operand(config)?;
        Ok(Self {
            column: config.get_str("column").unwrap_or_default().to_owned(),
            operator,
            value,
        })
    }
}

/// Reads the operator and its comparison value.
fn operand(config: &NodeConfig) -> Result<(FilterOperator, Value), ConfigError> {
    let operator = config.get_str("operator").unwrap_or("eq");
    let operator: FilterOperator = operator.parse().map_err(|_| {
        ConfigError::single(
            "operator",
            format!(
                "unknown operator '{operator}', expected one of: {}",
                FilterOperator::VARIANTS.join(", ")
            ),
        )
    })?;

    let value = config.get("value").cloned().unwrap_or(Value::Null);
    if operator.takes_value() && value.is_null() {
        return Err(ConfigError::single(
            "value",
            format!("required by operator '{operator}'"),
        ));
    }
    Ok((operator, value))
}
