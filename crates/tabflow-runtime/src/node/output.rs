//! Tagged node outputs and their canonical transport form.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use bytes::Bytes;
use derive_more::From;
use serde_json::{Map, Value, json};
use strum::{AsRefStr, Display, IntoStaticStr};

use super::table::Table;

/// Opaque bytes with an optional name and content type.
///
/// This is both the shape of the run's external input and of steps that
/// emit files.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Payload {
    /// Name hint, typically the uploaded file name.
    pub name: Option<String>,
    /// MIME type, when known.
    pub content_type: Option<String>,
    /// Raw content.
    pub bytes: Bytes,
}

impl Payload {
    /// Creates an anonymous payload.
    pub fn new(bytes: impl Into<Bytes>) -> Self {
        Self {
            name: None,
            content_type: None,
            bytes: bytes.into(),
        }
    }

    /// Sets the name hint.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the content type.
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Returns the number of bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Returns whether the payload is empty.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Returns the file extension of the name hint, lowercased.
    pub fn extension(&self) -> Option<String> {
        let name = self.name.as_deref()?;
        let (_, extension) = name.rsplit_once('.')?;
        Some(extension.to_ascii_lowercase())
    }
}

/// Shape of a [`NodeOutput`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, AsRefStr, Display, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum OutputKind {
    /// Tabular data.
    Table,
    /// Mapping of named values.
    Record,
    /// Single JSON value.
    Scalar,
    /// Opaque bytes.
    Binary,
}

/// Value produced by a node.
#[derive(Debug, Clone, PartialEq, From)]
pub enum NodeOutput {
    /// Tabular data.
    Table(Table),
    /// Mapping of named values, e.g. summary statistics.
    Record(Map<String, Value>),
    /// Single JSON value.
    Scalar(Value),
    /// Opaque bytes.
    Binary(Payload),
}

impl NodeOutput {
    /// Returns the shape of this output.
    pub const fn kind(&self) -> OutputKind {
        match self {
            Self::Table(_) => OutputKind::Table,
            Self::Record(_) => OutputKind::Record,
            Self::Scalar(_) => OutputKind::Scalar,
            Self::Binary(_) => OutputKind::Binary,
        }
    }

    /// Returns the table, if this is tabular output.
    pub fn as_table(&self) -> Option<&Table> {
        match self {
            Self::Table(table) => Some(table),
            _ => None,
        }
    }

    /// Returns the record, if this is mapping output.
    pub fn as_record(&self) -> Option<&Map<String, Value>> {
        match self {
            Self::Record(record) => Some(record),
            _ => None,
        }
    }

    /// Returns the scalar, if this is a single value.
    pub fn as_scalar(&self) -> Option<&Value> {
        match self {
            Self::Scalar(value) => Some(value),
            _ => None,
        }
    }

    /// Returns the payload, if this is binary output.
    pub fn as_binary(&self) -> Option<&Payload> {
        match self {
            Self::Binary(payload) => Some(payload),
            _ => None,
        }
    }

    /// Reduces the output to its canonical serializable form.
    ///
    /// Tables become arrays of records keyed by column name, records become
    /// objects, scalars are returned as-is and binary output becomes an
    /// object carrying its name, content type, size and base64 content.
    pub fn to_transport(&self) -> Value {
        match self {
            Self::Table(table) => Value::Array(
                table.to_records().into_iter().map(Value::Object).collect(),
            ),
            Self::Record(record) => Value::Object(record.clone()),
            Self::Scalar(value) => value.clone(),
            Self::Binary(payload) => json!({
                "name": payload.name,
                "content_type": payload.content_type,
                "size": payload.len(),
                "base64": STANDARD.encode(&payload.bytes),
            }),
        }
    }
}
