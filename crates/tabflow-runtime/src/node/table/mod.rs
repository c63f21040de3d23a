//! In-memory tabular data.
//!
//! A [`Table`] is a list of named columns and rows of JSON cells. Rows are
//! always exactly as wide as the column list; missing cells are `null`.

mod csv;

use serde_json::{Map, Value};

pub use self::csv::{CsvError, CsvOptions};
use super::error::{NodeError, NodeResult};

/// Rows of JSON cells under named columns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl Table {
    /// Creates an empty table with the given columns.
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Creates a table from columns and rows, normalizing row widths.
    pub fn from_rows(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        let mut table = Self::new(columns);
        for row in rows {
            table.push_row(row);
        }
        table
    }

    /// Parses CSV bytes.
    pub fn from_csv(bytes: &[u8], options: &CsvOptions) -> Result<Self, CsvError> {
        csv::read(bytes, options)
    }

    /// Serializes the table as CSV text.
    pub fn to_csv(&self, delimiter: char) -> String {
        csv::write(self, delimiter)
    }

    /// Returns the column names.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Returns the rows.
    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    /// Returns the number of rows.
    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    /// Returns the number of columns.
    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    /// Returns whether the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Appends a row, padding with `null` or truncating to the column count.
    pub fn push_row(&mut self, mut row: Vec<Value>) {
        row.resize(self.columns.len(), Value::Null);
        self.rows.push(row);
    }

    /// Returns the position of a column.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column == name)
    }

    /// Returns the position of a column or a [`NodeError::ColumnNotFound`].
    pub fn require_column(&self, name: &str) -> NodeResult<usize> {
        self.column_index(name)
            .ok_or_else(|| NodeError::ColumnNotFound {
                column: name.to_owned(),
                available: self.columns.clone(),
            })
    }

    /// Iterates over the cells of one column.
    pub fn column_values(&self, index: usize) -> impl Iterator<Item = &Value> {
        self.rows.iter().filter_map(move |row| row.get(index))
    }

    /// Keeps only the rows for which `keep` returns true.
    pub fn retain_rows(&mut self, keep: impl FnMut(&Vec<Value>) -> bool) {
        self.rows.retain(keep);
    }

    /// Returns a new table with the named columns, in the given order.
    pub fn select(&self, columns: &[String]) -> NodeResult<Self> {
        let indices = columns
            .iter()
            .map(|name| self.require_column(name))
            .collect::<NodeResult<Vec<_>>>()?;

        let rows = self
            .rows
            .iter()
            .map(|row| indices.iter().map(|&i| row[i].clone()).collect())
            .collect();

        Ok(Self {
            columns: columns.to_vec(),
            rows,
        })
    }

    /// Converts rows into objects keyed by column name.
    pub fn to_records(&self) -> Vec<Map<String, Value>> {
        self.rows
            .iter()
            .map(|row| {
                self.columns
                    .iter()
                    .cloned()
                    .zip(row.iter().cloned())
                    .collect()
            })
            .collect()
    }
}
