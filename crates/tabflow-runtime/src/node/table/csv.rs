//! Quote-aware CSV reading and writing.

use std::borrow::Cow;
use std::collections::HashMap;

use serde_json::{Number, Value};
use thiserror::Error;

use super::Table;

/// Cell texts read as missing values.
const NULL_MARKERS: &[&str] = &["NA", "N/A", "NaN", "nan", "null", "NULL", "None"];

/// Failure to parse CSV input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CsvError {
    /// The input holds no records at all.
    #[error("csv input is empty")]
    Empty,

    /// A quoted field is never closed.
    #[error("unterminated quoted field starting on line {line}")]
    UnterminatedQuote {
        /// Line on which the quote opened.
        line: usize,
    },

    /// A record has more fields than the header.
    #[error("line {line} has {found} fields, expected at most {expected}")]
    RaggedRow {
        /// Line of the record.
        line: usize,
        /// Number of header columns.
        expected: usize,
        /// Number of fields on the line.
        found: usize,
    },
}

/// How to read CSV input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CsvOptions {
    /// Field separator.
    pub delimiter: char,
    /// Whether the first record names the columns.
    pub has_header: bool,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            delimiter: ',',
            has_header: true,
        }
    }
}

pub(super) fn read(bytes: &[u8], options: &CsvOptions) -> Result<Table, CsvError> {
    let text = decode(bytes);
    let mut records = split_records(&text, options.delimiter)?.into_iter();

    let columns = if options.has_header {
        let (_, header) = records.next().ok_or(CsvError::Empty)?;
        header_names(header)
    } else {
        Vec::new()
    };

    let mut rows = Vec::new();
    let mut width = columns.len();
    for (line, fields) in records {
        if options.has_header && fields.len() > columns.len() {
            return Err(CsvError::RaggedRow {
                line,
                expected: columns.len(),
                found: fields.len(),
            });
        }
        width = width.max(fields.len());
        rows.push(fields.iter().map(|field| infer_cell(field)).collect());
    }

    let columns = if options.has_header {
        columns
    } else if rows.is_empty() {
        return Err(CsvError::Empty);
    } else {
        (1..=width).map(|i| format!("column_{i}")).collect()
    };

    Ok(Table::from_rows(columns, rows))
}

pub(super) fn write(table: &Table, delimiter: char) -> String {
    let mut out = String::new();
    write_record(&mut out, table.columns().iter().map(Cow::from), delimiter);
    for row in table.rows() {
        write_record(&mut out, row.iter().map(render_cell), delimiter);
    }
    out
}

/// Decodes UTF-8 (dropping a byte order mark), falling back to Latin-1.
fn decode(bytes: &[u8]) -> Cow<'_, str> {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    match std::str::from_utf8(bytes) {
        Ok(text) => Cow::Borrowed(text),
        Err(_) => Cow::Owned(bytes.iter().map(|&b| char::from(b)).collect()),
    }
}

/// Splits text into records, each tagged with the line it starts on.
fn split_records(text: &str, delimiter: char) -> Result<Vec<(usize, Vec<String>)>, CsvError> {
    let mut records = Vec::new();
    let mut record = Vec::new();
    let mut field = String::new();
    let mut line = 1;
    let mut record_line = 1;
    let mut quote_line = 1;
    let mut in_quotes = false;
    let mut touched = false;

    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    field.push('"');
                }
                '"' => in_quotes = false,
                _ => {
                    if c == '\n' {
                        line += 1;
                    }
                    field.push(c);
                }
            }
            continue;
        }

        match c {
            '"' => {
                in_quotes = true;
                quote_line = line;
                touched = true;
            }
            '\r' if chars.peek() == Some(&'\n') => {}
            '\r' | '\n' => {
                if touched {
                    record.push(std::mem::take(&mut field));
                    records.push((record_line, std::mem::take(&mut record)));
                }
                touched = false;
                line += 1;
                record_line = line;
            }
            c if c == delimiter => {
                record.push(std::mem::take(&mut field));
                touched = true;
            }
            _ => {
                field.push(c);
                touched = true;
            }
        }
    }

    if in_quotes {
        return Err(CsvError::UnterminatedQuote { line: quote_line });
    }
    if touched {
        record.push(field);
        records.push((record_line, record));
    }

    Ok(records)
}

/// Names blank header cells by position and disambiguates repeats.
fn header_names(header: Vec<String>) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    header
        .into_iter()
        .enumerate()
        .map(|(i, name)| {
            let name = name.trim();
            let name = if name.is_empty() {
                format!("column_{}", i + 1)
            } else {
                name.to_owned()
            };

            let count = seen.entry(name.clone()).or_insert(0);
            *count += 1;
            if *count == 1 {
                name
            } else {
                format!("{name}.{}", *count - 1)
            }
        })
        .collect()
}

fn infer_cell(raw: &str) -> Value {
    let text = raw.trim();
    if text.is_empty() || NULL_MARKERS.contains(&text) {
        return Value::Null;
    }
    if text.eq_ignore_ascii_case("true") {
        return Value::Bool(true);
    }
    if text.eq_ignore_ascii_case("false") {
        return Value::Bool(false);
    }
    if let Ok(int) = text.parse::<i64>() {
        return Value::from(int);
    }
    if let Some(number) = text.parse::<f64>().ok().and_then(Number::from_f64) {
        return Value::Number(number);
    }
    Value::String(raw.to_owned())
}

fn render_cell(value: &Value) -> Cow<'_, str> {
    match value {
        Value::Null => Cow::Borrowed(""),
        Value::String(text) => Cow::Borrowed(text),
        other => Cow::Owned(other.to_string()),
    }
}

fn write_record<'a>(out: &mut String, cells: impl Iterator<Item = Cow<'a, str>>, delimiter: char) {
    for (i, cell) in cells.enumerate() {
        if i > 0 {
            out.push(delimiter);
        }
        let needs_quotes = cell
            .chars()
            .any(|c| c == delimiter || c == '"' || c == '\n' || c == '\r');
        if needs_quotes {
            out.push('"');
            out.push_str(&cell.replace('"', "\"\""));
            out.push('"');
        } else {
            out.push_str(&cell);
        }
    }
    out.push('\n');
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn infers_cell_types() {
        let table = read(
            b"name,qty,price,active,note\nwidget,3,2.5,TRUE,\n",
            &CsvOptions::default(),
        )
        .unwrap();

        assert_eq!(table.columns(), ["name", "qty", "price", "active", "note"]);
        assert_eq!(
            table.rows()[0],
            vec![json!("widget"), json!(3), json!(2.5), json!(true), Value::Null]
        );
    }

    #[test]
    fn handles_quotes_and_crlf() {
        let input = b"\xEF\xBB\xBFcity,comment\r\n\"Oslo, NO\",\"said \"\"hi\"\"\r\nbye\"\r\n\r\nRome,ok\r\n";
        let table = read(input, &CsvOptions::default()).unwrap();

        assert_eq!(table.num_rows(), 2);
        assert_eq!(table.rows()[0][0], json!("Oslo, NO"));
        assert_eq!(table.rows()[0][1], json!("said \"hi\"\r\nbye"));
        assert_eq!(table.rows()[1], vec![json!("Rome"), json!("ok")]);
    }

    #[test]
    fn falls_back_to_latin1() {
        let table = read(b"city\nM\xFCnchen\n", &CsvOptions::default()).unwrap();
        assert_eq!(table.rows()[0][0], json!("München"));
    }

    #[test]
    fn headerless_input_gets_positional_names() {
        let options = CsvOptions {
            delimiter: ';',
            has_header: false,
        };
        let table = read(b"1;2\n3;4;5\n", &options).unwrap();

        assert_eq!(table.columns(), ["column_1", "column_2", "column_3"]);
        assert_eq!(table.rows()[0], vec![json!(1), json!(2), Value::Null]);
    }

    #[test]
    fn header_names_are_normalized() {
        let table = read(b"a,,a\n1,2,3\n", &CsvOptions::default()).unwrap();
        assert_eq!(table.columns(), ["a", "column_2", "a.1"]);
    }

    #[test]
    fn rejects_malformed_input() {
        let options = CsvOptions::default();
        assert_eq!(read(b"", &options), Err(CsvError::Empty));
        assert_eq!(
            read(b"a\n\"open\n", &options),
            Err(CsvError::UnterminatedQuote { line: 2 })
        );
        assert_eq!(
            read(b"a,b\n1,2\n1,2,3\n", &options),
            Err(CsvError::RaggedRow {
                line: 3,
                expected: 2,
                found: 3
            })
        );
    }

    #[test]
    fn writes_quoted_cells() {
        let table = Table::from_rows(
            vec!["city".into(), "sales".into()],
            vec![
                vec![json!("Oslo, NO"), json!(10)],
                vec![json!("say \"hi\""), Value::Null],
            ],
        );

        assert_eq!(
            write(&table, ','),
            "city,sales\n\"Oslo, NO\",10\n\"say \"\"hi\"\"\",\n"
        );
    }
}
