use crate::node::{
    ConfigError, ConfigSchema, FieldKind, Node, NodeConfig, NodeInputs, NodeMetadata, NodeOutput,
    NodeResult, NodeType, Payload,
};

/// Serializes the input table to CSV bytes.
#[derive(Debug)]
pub struct WriteCsv {
    file_name: String,
    delimiter: char,
}

impl Node for WriteCsv {
    fn execute(&mut self, inputs: &NodeInputs) -> NodeResult<NodeOutput> {
        let table = inputs.single_table()?;
        let text = table.to_csv(self.delimiter);

        let payload = Payload::new(text.into_bytes())
            .with_name(self.file_name.clone())
            .with_content_type("text/csv");
        Ok(NodeOutput::Binary(payload))
    }
}

impl NodeType for WriteCsv {
    const TYPE_ID: &'static str = "write_csv";

    fn metadata() -> NodeMetadata {
        super::metadata("Write CSV")
    }

    fn schema() -> ConfigSchema {
        ConfigSchema::new()
            .with_default("file_name", FieldKind::String, "output.csv")
            .with_default("delimiter", FieldKind::String, ",")
    }

    fn check(config: &NodeConfig) -> Result<(), ConfigError> {
        file_name(config)?;
        super::delimiter(config, ',').map(drop)
    }

    fn from_config(config: &NodeConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            file_name: file_name(config)?.to_owned(),
            delimiter: super::delimiter(config, ',')?,
        })
    }
}

fn file_name(config: &NodeConfig) -> Result<&str, ConfigError> {
    let file_name = config.get_str("file_name").unwrap_or("output.csv").trim();
    if file_name.is_empty() {
        return Err(ConfigError::single("file_name", "must not be empty"));
    }
    Ok(file_name)
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
    fn writes_named_csv() {
        let table = Table::from_rows(
            vec!["a".into(), "b".into()],
            vec![vec![json!(1), json!("x;y")]],
        );

        let mut node = instance::<WriteCsv>(
            "write",
            json!({ "file_name": "report.csv", "delimiter": ";" }),
        );
        node.set_input(DEFAULT_SLOT, Arc::new(NodeOutput::Table(table)));

        let output = node.run().unwrap();
        let payload = output.as_binary().unwrap();
        assert_eq!(payload.name.as_deref(), Some("report.csv"));
        assert_eq!(payload.content_type.as_deref(), Some("text/csv"));
        assert_eq!(&payload.bytes[..], b"a;b\n1;\"x;y\"\n");
    }

    #[test]
    fn check_rejects_blank_name_and_long_delimiter() {
        let check = |config: serde_json::Value| {
            let config = WriteCsv::schema().validate(config.as_object().unwrap()).unwrap();
            WriteCsv::check(&config)
        };

        assert!(check(json!({ "file_name": "  " })).unwrap_err().names("file_name"));
        assert!(check(json!({ "delimiter": "::" })).unwrap_err().names("delimiter"));
        assert!(check(json!({ "delimiter": "\t" })).is_ok());
    }
}
