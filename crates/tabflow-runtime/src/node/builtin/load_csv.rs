use serde_json::Value;

use crate::node::table::{CsvOptions, Table};
use crate::node::{
    ConfigError, ConfigSchema, FieldKind, Node, NodeConfig, NodeInputs, NodeMetadata, NodeOutput,
    NodeResult, NodeType,
};

/// Parses the run's payload as CSV.
///
/// Without an explicit `delimiter`, payloads named `*.tsv` are split on tabs
/// and everything else on commas.
#[derive(Debug)]
pub struct LoadCsv {
    delimiter: Option<char>,
    has_header: bool,
}

impl Node for LoadCsv {
    fn execute(&mut self, inputs: &NodeInputs) -> NodeResult<NodeOutput> {
        let payload = inputs.payload()?;
        let delimiter = self.delimiter.unwrap_or_else(|| {
            match payload.extension().as_deref() {
                Some("tsv") => '\t',
                _ => ',',
            }
        });

        let options = CsvOptions {
            delimiter,
            has_header: self.has_header,
        };
        let table = Table::from_csv(&payload.bytes, &options)?;

        tracing::debug!(
            target: crate::node::TRACING_TARGET,
            payload = payload.name.as_deref().unwrap_or("<unnamed>"),
            rows = table.num_rows(),
            columns = table.num_columns(),
            "Loaded csv payload"
        );
        Ok(NodeOutput::Table(table))
    }
}

impl NodeType for LoadCsv {
    const TYPE_ID: &'static str = "load_csv";

    fn metadata() -> NodeMetadata {
        super::metadata("Load CSV").with_hint("memory", Value::from("proportional to payload"))
    }

    fn schema() -> ConfigSchema {
        ConfigSchema::new()
            .optional("delimiter", FieldKind::String)
            .with_default("has_header", FieldKind::Boolean, true)
    }

    fn check(config: &NodeConfig) -> Result<(), ConfigError> {
        super::delimiter(config, ',').map(drop)
    }

    fn from_config(config: &NodeConfig) -> Result<Self, ConfigError> {
        let delimiter = match config.get("delimiter") {
            Some(_) => Some(super::delimiter(config, ',')?),
            None => None,
        };

        Ok(Self {
            delimiter,
            has_header: config.get_bool("has_header").unwrap_or(true),
        })
    }
}
