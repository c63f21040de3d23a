//! Per-step configuration schemas and validated configs.
//!
//! Every step type declares a [`ConfigSchema`]: an ordered allow-list of
//! named, typed fields. The graph builder validates a node's raw config
//! against it once, before the node is constructed, and hands the step an
//! immutable [`NodeConfig`].

use std::fmt;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use strum::{AsRefStr, Display};
use thiserror::Error;

/// Type of a configuration field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, AsRefStr, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FieldKind {
    /// JSON string.
    String,
    /// Whole number.
    Integer,
    /// Any JSON number, integers included.
    Number,
    /// `true` or `false`.
    Boolean,
    /// Array of strings.
    StringList,
    /// Any JSON value.
    Any,
}

impl FieldKind {
    /// Returns whether `value` has this kind.
    pub fn accepts(self, value: &Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Integer => value.is_i64() || value.is_u64(),
            Self::Number => value.is_number(),
            Self::Boolean => value.is_boolean(),
            Self::StringList => value
                .as_array()
                .is_some_and(|items| items.iter().all(Value::is_string)),
            Self::Any => true,
        }
    }
}

/// Whether a field must be supplied, and what it defaults to otherwise.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "requirement", content = "default", rename_all = "snake_case")]
pub enum Requirement {
    /// The field must be present and non-null.
    Required,
    /// The field may be omitted and has no default.
    Optional,
    /// The field may be omitted and then takes this value.
    Default(Value),
}

/// One allow-listed configuration field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldSpec {
    /// Field name.
    pub name: String,
    /// Expected value type.
    pub kind: FieldKind,
    /// Requirement and default.
    #[serde(flatten)]
    pub requirement: Requirement,
}

/// Ordered allow-list of the configuration fields a step type accepts.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ConfigSchema {
    fields: Vec<FieldSpec>,
}

impl ConfigSchema {
    /// Creates a schema that accepts no fields.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a required field.
    pub fn required(self, name: impl Into<String>, kind: FieldKind) -> Self {
        self.field(name, kind, Requirement::Required)
    }

    /// Adds an optional field without a default.
    pub fn optional(self, name: impl Into<String>, kind: FieldKind) -> Self {
        self.field(name, kind, Requirement::Optional)
    }

    /// Adds an optional field that defaults to `default` when omitted.
    pub fn with_default(
        self,
        name: impl Into<String>,
        kind: FieldKind,
        default: impl Into<Value>,
    ) -> Self {
        self.field(name, kind, Requirement::Default(default.into()))
    }

    fn field(mut self, name: impl Into<String>, kind: FieldKind, requirement: Requirement) -> Self {
        self.fields.push(FieldSpec {
            name: name.into(),
            kind,
            requirement,
        });
        self
    }

    /// Returns the declared fields in declaration order.
    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// Returns the declared field with the given name.
    pub fn get(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|field| field.name == name)
    }

    /// Validates a raw config, filling in defaults.
    ///
    /// Every problem is collected: unknown fields, missing required fields
    /// and wrong-typed values. A `null` value counts as absent.
    pub fn validate(&self, raw: &Map<String, Value>) -> Result<NodeConfig, ConfigError> {
        let mut issues = Vec::new();

        for name in raw.keys() {
            if self.get(name).is_none() {
                issues.push(ConfigIssue::new(name, "unknown field"));
            }
        }

        let mut values = Map::new();
        for field in &self.fields {
            match raw.get(&field.name).filter(|value| !value.is_null()) {
                Some(value) if field.kind.accepts(value) => {
                    values.insert(field.name.clone(), value.clone());
                }
                Some(value) => issues.push(ConfigIssue::new(
                    &field.name,
                    format!("expected {}, found {}", field.kind, json_type(value)),
                )),
                None => match &field.requirement {
                    Requirement::Required => {
                        issues.push(ConfigIssue::new(&field.name, "required field is missing"));
                    }
                    Requirement::Default(default) => {
                        values.insert(field.name.clone(), default.clone());
                    }
                    Requirement::Optional => {}
                },
            }
        }

        if issues.is_empty() {
            Ok(NodeConfig { values })
        } else {
            Err(ConfigError { issues })
        }
    }
}

/// Validated, normalized configuration of one node.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct NodeConfig {
    values: Map<String, Value>,
}

impl NodeConfig {
    /// Returns the raw value of a field.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Returns a string field.
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_str)
    }

    /// Returns a boolean field.
    pub fn get_bool(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(Value::as_bool)
    }

    /// Returns an integer field.
    pub fn get_i64(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(Value::as_i64)
    }

    /// Returns a numeric field.
    pub fn get_f64(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(Value::as_f64)
    }

    /// Returns a string-list field.
    pub fn get_string_list(&self, name: &str) -> Option<Vec<String>> {
        let items = self.get(name)?.as_array()?;
        Some(
            items
                .iter()
                .filter_map(|item| item.as_str().map(str::to_owned))
                .collect(),
        )
    }

    /// Returns the normalized fields.
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.values
    }

    /// Deserializes the config into a step's typed configuration.
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T, ConfigError> {
        serde_json::from_value(Value::Object(self.values.clone()))
            .map_err(|err| ConfigError::single("config", err.to_string()))
    }
}

/// One offending configuration field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfigIssue {
    /// Field name.
    pub field: String,
    /// What is wrong with it.
    pub reason: String,
}

impl ConfigIssue {
    /// Creates an issue for a field.
    pub fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for ConfigIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "field '{}': {}", self.field, self.reason)
    }
}

/// A node config failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("{}", render_issues(.issues))]
pub struct ConfigError {
    /// Every offending field.
    pub issues: Vec<ConfigIssue>,
}

impl ConfigError {
    /// Creates an error for a single field.
    pub fn single(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            issues: vec![ConfigIssue::new(field, reason)],
        }
    }

    /// Returns whether the error names the given field.
    pub fn names(&self, field: &str) -> bool {
        self.issues.iter().any(|issue| issue.field == field)
    }
}

fn render_issues(issues: &[ConfigIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_f64() => "number",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;
    use serde_json::json;

    use super::*;

    fn schema() -> ConfigSchema {
        ConfigSchema::new()
            .required("column", FieldKind::String)
            .with_default("threshold", FieldKind::Number, 0.5)
            .with_default("strict", FieldKind::Boolean, false)
            .optional("tags", FieldKind::StringList)
    }

    fn raw(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[test]
    fn defaults_fill_absent_fields() {
        let config = schema().validate(&raw(json!({ "column": "a" }))).unwrap();

        assert_eq!(config.get_str("column"), Some("a"));
        assert_eq!(config.get_f64("threshold"), Some(0.5));
        assert_eq!(config.get_bool("strict"), Some(false));
        assert!(config.get("tags").is_none());
    }

    #[test]
    fn integers_are_numbers() {
        let config = schema()
            .validate(&raw(json!({ "column": "a", "threshold": 3 })))
            .unwrap();
        assert_eq!(config.get_f64("threshold"), Some(3.0));
    }

    #[test]
    fn null_counts_as_absent() {
        let config = schema()
            .validate(&raw(json!({ "column": "a", "strict": null })))
            .unwrap();
        assert_eq!(config.get_bool("strict"), Some(false));

        let error = schema()
            .validate(&raw(json!({ "column": null })))
            .unwrap_err();
        assert!(error.names("column"));
    }

    #[test]
    fn every_issue_is_reported() {
        let error = schema()
            .validate(&raw(json!({
                "threshold": "high",
                "tags": ["x", 1],
                "colour": "red"
            })))
            .unwrap_err();

        let fields: Vec<_> = error.issues.iter().map(|i| i.field.as_str()).collect();
        assert_eq!(fields, ["colour", "column", "threshold", "tags"]);
        assert_eq!(
            error.issues[2].reason,
            "expected number, found string"
        );
        assert!(error.to_string().contains("field 'colour': unknown field"));
    }

    #[test]
    fn integer_kind_rejects_fractions() {
        let schema = ConfigSchema::new().required("limit", FieldKind::Integer);
        assert!(schema.validate(&raw(json!({ "limit": 10 }))).is_ok());

        let error = schema.validate(&raw(json!({ "limit": 1.5 }))).unwrap_err();
        assert_eq!(error.issues[0].reason, "expected integer, found number");
    }

    #[test]
    fn typed_deserialization() {
        #[derive(Deserialize)]
        struct Typed {
            column: String,
            threshold: f64,
            #[serde(default)]
            tags: Vec<String>,
        }

        let config = schema()
            .validate(&raw(json!({ "column": "a", "tags": ["t"] })))
            .unwrap();
        let typed: Typed = config.deserialize().unwrap();

        assert_eq!(typed.column, "a");
        assert_eq!(typed.threshold, 0.5);
        assert_eq!(typed.tags, ["t"]);
        assert_eq!(config.get_string_list("tags"), Some(vec!["t".to_owned()]));
    }

    #[test]
    fn schema_serializes_for_tooling() {
        let value = serde_json::to_value(schema()).unwrap();
        assert_eq!(
            value[0],
            json!({ "name": "column", "kind": "string", "requirement": "required" })
        );
        assert_eq!(
            value[1],
            json!({ "name": "threshold", "kind": "number", "requirement": "default", "default": 0.5 })
        );
    }
}
