//! Small step types shared by unit tests.

use std::sync::atomic::{AtomicUsize, Ordering};

use semver::Version;
use serde_json::{Map, Value};

use super::{
    ConfigError, ConfigSchema, FieldKind, Node, NodeConfig, NodeError, NodeInputs, NodeInstance,
    NodeMetadata, NodeOutput, NodeResult, NodeType,
};
use crate::registry::NodeRegistry;

/// Number of `counted` nodes constructed so far.
pub static COUNTED: AtomicUsize = AtomicUsize::new(0);

fn metadata(label: &str) -> NodeMetadata {
    NodeMetadata::new(label, "tests", Version::new(0, 1, 0))
}

/// Registry with every test step.
pub fn registry() -> NodeRegistry {
    NodeRegistry::builder()
        .register::<NumberSource>()
        .register::<Double>()
        .register::<Sum>()
        .register::<Collect>()
        .register::<Failing>()
        .register::<Counted>()
        .build()
}

/// Constructs a standalone instance of `T` from a JSON config.
pub fn instance<T: NodeType>(id: &str, config: Value) -> NodeInstance {
    let raw = match config {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    let config = T::schema().validate(&raw).unwrap();
    T::check(&config).unwrap();
    let node = T::from_config(&config).unwrap();
    NodeInstance::new(id.into(), T::TYPE_ID, T::metadata().label, config, Box::new(node))
}

fn scalar_number(value: &NodeOutput) -> NodeResult<&serde_json::Number> {
    match value {
        NodeOutput::Scalar(Value::Number(number)) => Ok(number),
        other => Err(NodeError::failed(format!(
            "expected a number, found {}",
            other.kind()
        ))),
    }
}

/// Parses the payload text as a number.
#[derive(Debug)]
pub struct NumberSource;

impl Node for NumberSource {
    fn execute(&mut self, inputs: &NodeInputs) -> NodeResult<NodeOutput> {
        let payload = inputs.payload()?;
        let text = String::from_utf8_lossy(&payload.bytes);
        let text = text.trim();

        if let Ok(int) = text.parse::<i64>() {
            return Ok(NodeOutput::Scalar(int.into()));
        }
        text.parse::<f64>()
            .map(|float| NodeOutput::Scalar(float.into()))
            .map_err(|_| NodeError::failed(format!("not a number: {text}")))
    }
}

impl NodeType for NumberSource {
    const TYPE_ID: &'static str = "number_source";

    fn metadata() -> NodeMetadata {
        metadata("Number Source")
    }

    fn schema() -> ConfigSchema {
        ConfigSchema::new()
    }

    fn from_config(_: &NodeConfig) -> Result<Self, ConfigError> {
        Ok(Self)
    }
}

/// Doubles its single numeric input.
#[derive(Debug)]
pub struct Double;

impl Node for Double {
    fn execute(&mut self, inputs: &NodeInputs) -> NodeResult<NodeOutput> {
        let number = scalar_number(inputs.require(super::DEFAULT_SLOT)?)?;
        let doubled = match number.as_i64() {
            Some(int) => Value::from(int * 2),
            None => Value::from(number.as_f64().unwrap_or_default() * 2.0),
        };
        Ok(NodeOutput::Scalar(doubled))
    }
}

impl NodeType for Double {
    const TYPE_ID: &'static str = "double";

    fn metadata() -> NodeMetadata {
        metadata("Double")
    }

    fn schema() -> ConfigSchema {
        ConfigSchema::new()
    }

    fn from_config(_: &NodeConfig) -> Result<Self, ConfigError> {
        Ok(Self)
    }
}

/// Adds the numbers on every populated slot.
#[derive(Debug)]
pub struct Sum;

impl Node for Sum {
    fn execute(&mut self, inputs: &NodeInputs) -> NodeResult<NodeOutput> {
        let mut total = 0;
        for (_, value) in inputs.iter() {
            total += scalar_number(value)?.as_i64().unwrap_or_default();
        }
        Ok(NodeOutput::Scalar(total.into()))
    }
}

impl NodeType for Sum {
    const TYPE_ID: &'static str = "sum";

    fn metadata() -> NodeMetadata {
        metadata("Sum")
    }

    fn schema() -> ConfigSchema {
        ConfigSchema::new()
    }

    fn from_config(_: &NodeConfig) -> Result<Self, ConfigError> {
        Ok(Self)
    }
}

/// Echoes its inputs as a record keyed by slot.
#[derive(Debug)]
pub struct Collect;

impl Node for Collect {
    fn execute(&mut self, inputs: &NodeInputs) -> NodeResult<NodeOutput> {
        let record = inputs
            .iter()
            .map(|(slot, value)| (slot.to_owned(), value.to_transport()))
            .collect();
        Ok(NodeOutput::Record(record))
    }
}

impl NodeType for Collect {
    const TYPE_ID: &'static str = "collect";

    fn metadata() -> NodeMetadata {
        metadata("Collect")
    }

    fn schema() -> ConfigSchema {
        ConfigSchema::new()
    }

    fn from_config(_: &NodeConfig) -> Result<Self, ConfigError> {
        Ok(Self)
    }
}

/// Always fails to execute; can also fail to configure or clean up.
#[derive(Debug)]
pub struct Failing {
    message: String,
    fail_configure: bool,
    fail_cleanup: bool,
}

impl Node for Failing {
    fn configure(&mut self) -> NodeResult<()> {
        if self.fail_configure {
            return Err(NodeError::failed("configure boom"));
        }
        Ok(())
    }

    fn execute(&mut self, _: &NodeInputs) -> NodeResult<NodeOutput> {
        Err(NodeError::failed(self.message.clone()))
    }

    fn cleanup(&mut self) -> NodeResult<()> {
        if self.fail_cleanup {
            return Err(NodeError::failed("cleanup boom"));
        }
        Ok(())
    }
}

impl NodeType for Failing {
    const TYPE_ID: &'static str = "failing";

    fn metadata() -> NodeMetadata {
        metadata("Failing")
    }

    fn schema() -> ConfigSchema {
        ConfigSchema::new()
            .with_default("message", FieldKind::String, "boom")
            .with_default("fail_configure", FieldKind::Boolean, false)
            .with_default("fail_cleanup", FieldKind::Boolean, false)
    }

    fn from_config(config: &NodeConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            message: config.get_str("message").unwrap_or("boom").to_owned(),
            fail_configure: config.get_bool("fail_configure").unwrap_or_default(),
            fail_cleanup: config.get_bool("fail_cleanup").unwrap_or_default(),
        })
    }
}

/// Counts its constructions in [`COUNTED`].
#[derive(Debug)]
pub struct Counted;

impl Node for Counted {
    fn execute(&mut self, _: &NodeInputs) -> NodeResult<NodeOutput> {
        Ok(NodeOutput::Scalar(Value::Null))
    }
}

impl NodeType for Counted {
    const TYPE_ID: &'static str = "counted";

    fn metadata() -> NodeMetadata {
        metadata("Counted")
    }

    fn schema() -> ConfigSchema {
        ConfigSchema::new().required("value", FieldKind::Integer)
    }

    fn from_config(_: &NodeConfig) -> Result<Self, ConfigError> {
        COUNTED.fetch_add(1, Ordering::SeqCst);
        Ok(Self)
    }
}
