//! Built-in step vocabulary.
//!
//! | type id          | role      | output   |
//! |------------------|-----------|----------|
//! | `load_csv`       | source    | table    |
//! | `clean_data`     | transform | table    |
//! | `filter_rows`    | transform | table    |
//! | `select_columns` | transform | table    |
//! | `concat_rows`    | transform | table    |
//! | `analyze_data`   | sink      | record   |
//! | `write_csv`      | sink      | binary   |

mod analyze_data;
mod clean_data;
mod concat_rows;
mod filter_rows;
mod load_csv;
mod select_columns;
mod write_csv;

use semver::Version;

pub use self::analyze_data::AnalyzeData;
pub use self::clean_data::CleanData;
pub use self::concat_rows::ConcatRows;
pub use self::filter_rows::{FilterOperator, FilterRows};
pub use self::load_csv::LoadCsv;
pub use self::select_columns::SelectColumns;
pub use self::write_csv::WriteCsv;
use super::{ConfigError, NodeConfig, NodeMetadata};
use crate::registry::NodeRegistryBuilder;

const AUTHOR: &str = "tabflow";
const VERSION: Version = Version::new(0, 1, 0);

/// Adds every built-in step to a registry builder.
pub(crate) fn register(builder: NodeRegistryBuilder) -> NodeRegistryBuilder {
    builder
        .register::<LoadCsv>()
        .register::<CleanData>()
        .register::<FilterRows>()
        .register::<SelectColumns>()
        .register::<ConcatRows>()
        .register::<AnalyzeData>()
        .register::<WriteCsv>()
}

fn metadata(label: &str) -> NodeMetadata {
    NodeMetadata::new(label, AUTHOR, VERSION)
}

/// Reads a single-character delimiter field.
fn delimiter(config: &NodeConfig, default: char) -> Result<char, ConfigError> {
    let Some(text) = config.get_str("delimiter") else {
        return Ok(default);
    };

    let mut chars = text.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c != '"' && c != '\n' && c != '\r' => Ok(c),
        _ => Err(ConfigError::single(
            "delimiter",
            format!("expected a single character, found '{text}'"),
        )),
    }
}
