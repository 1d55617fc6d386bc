//! Parsing of impala-shell text output.
//!
//! The shell prints results as a boxed, pipe-separated table:
//!
//! ```text
//! +------------+--------+-------+
//! | time       | icao24 | lat   |
//! +------------+--------+-------+
//! | 1530450000 | 3c6444 | 51.2  |
//! +------------+--------+-------+
//! ```
//!
//! Only lines containing the `|` separator are table rows. On long results
//! the header is printed again further down; those repeats are dropped.

use std::sync::OnceLock;

use csv::ReaderBuilder;
use regex::Regex;
use tracing::debug;

use crate::error::{ImpalaError, Result};

use super::builder::PARTITION_COLUMN;
use super::types::{ColumnInfo, RecordSet, Row, Value};

/// Column separator glyph in shell tables.
pub const COLUMN_SEPARATOR: char = '|';

/// Aircraft identifier column, never converted to a number.
pub const IDENTIFIER_COLUMN: &str = "icao24";

/// Header rows at or before this line index are kept.
const HEADER_REPEAT_AFTER_LINE: usize = 10;

/// Columns the records may be ordered by, in order of preference.
const TIME_COLUMNS: [&str; 2] = ["time", "mintime"];

/// Field delimiter of the normalized table.
const FIELD_DELIMITER: u8 = b'\t';

fn integer_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\d+").expect("valid regex"))
}

/// Extracts the row count from the output of a `COUNT(*)` query.
///
/// The first integer in the text is the count.
pub fn parse_count(output: &str) -> Result<u64> {
    let digits = integer_pattern()
        .find(output)
        .ok_or_else(|| ImpalaError::parse(format!("no row count in output: {:?}", output.trim())))?;
    digits
        .as_str()
        .parse()
        .map_err(|e| ImpalaError::parse(format!("invalid row count '{}': {e}", digits.as_str())))
}

/// Splits one table row into trimmed fields, without the outer separators.
fn split_fields(line: &str) -> Vec<&str> {
    let inner = line.trim();
    let inner = inner.strip_prefix(COLUMN_SEPARATOR).unwrap_or(inner);
    let inner = inner.strip_suffix(COLUMN_SEPARATOR).unwrap_or(inner);
    inner.split(COLUMN_SEPARATOR).map(str::trim).collect()
}

/// Keeps the table rows of `output` and rewrites them as delimited text.
///
/// Lines without a separator are noise. A row naming the partition column
/// after the first [`HEADER_REPEAT_AFTER_LINE`] lines is a repeated header.
pub fn normalize_table(output: &str) -> String {
    let mut table = String::new();
    for (index, line) in output.split('\n').enumerate() {
        if !line.contains(COLUMN_SEPARATOR) {
            continue;
        }
        let fields = split_fields(line);
        if index > HEADER_REPEAT_AFTER_LINE && fields.contains(&PARTITION_COLUMN) {
            continue;
        }
        table.push_str(&fields.join("\t"));
        table.push('\n');
    }
    table
}

/// Inferred type of a whole column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnKind {
    Int,
    Float,
    Bool,
    Text,
}

impl ColumnKind {
    fn type_name(self) -> &'static str {
        match self {
            Self::Int => "bigint",
            Self::Float => "double",
            Self::Bool => "boolean",
            Self::Text => "string",
        }
    }
}

fn is_null(cell: &str) -> bool {
    cell.is_empty() || cell.eq_ignore_ascii_case("null")
}

fn parse_bool(cell: &str) -> Option<bool> {
    if cell.eq_ignore_ascii_case("true") {
        Some(true)
    } else if cell.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

fn infer_kind<'a>(cells: impl Iterator<Item = &'a str>) -> ColumnKind {
    let present: Vec<&str> = cells.filter(|c| !is_null(c)).collect();
    if present.is_empty() {
        ColumnKind::Text
    } else if present.iter().all(|c| c.parse::<i64>().is_ok()) {
        ColumnKind::Int
    } else if present.iter().all(|c| c.parse::<f64>().is_ok()) {
        ColumnKind::Float
    } else if present.iter().all(|c| parse_bool(c).is_some()) {
        ColumnKind::Bool
    } else {
        ColumnKind::Text
    }
}

fn convert(cell: &str, kind: ColumnKind) -> Value {
    if is_null(cell) {
        return Value::Null;
    }
    match kind {
        ColumnKind::Int => cell.parse().map(Value::Int).unwrap_or(Value::Null),
        ColumnKind::Float => cell.parse().map(Value::Float).unwrap_or(Value::Null),
        ColumnKind::Bool => parse_bool(cell).map(Value::Bool).unwrap_or(Value::Null),
        ColumnKind::Text => Value::String(cell.to_string()),
    }
}

/// Parses a normalized delimited table; the first row is the header.
fn read_table(table: &str) -> Result<RecordSet> {
    let mut reader = ReaderBuilder::new()
        .delimiter(FIELD_DELIMITER)
        .quoting(false)
        .has_headers(true)
        .from_reader(table.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| ImpalaError::parse(format!("invalid table header: {e}")))?
        .iter()
        .map(String::from)
        .collect();

    let mut raw_rows: Vec<Vec<String>> = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| ImpalaError::parse(format!("invalid table row: {e}")))?;
        raw_rows.push(record.iter().map(String::from).collect());
    }

    let kinds: Vec<ColumnKind> = headers
        .iter()
        .enumerate()
        .map(|(idx, name)| {
            if name == IDENTIFIER_COLUMN {
                ColumnKind::Text
            } else {
                infer_kind(raw_rows.iter().map(move |r| r[idx].as_str()))
            }
        })
        .collect();

    let columns = headers
        .iter()
        .zip(&kinds)
        .map(|(name, kind)| ColumnInfo::new(name.as_str(), kind.type_name()))
        .collect();

    let rows: Vec<Row> = raw_rows
        .iter()
        .map(|raw| {
            raw.iter()
                .zip(&kinds)
                .map(|(cell, kind)| convert(cell, *kind))
                .collect()
        })
        .collect();

    Ok(RecordSet::with_data(columns, rows))
}

/// Parses the raw output of a fetch into records ordered by time.
///
/// Output with no table rows yields an empty record set.
pub fn parse_records(output: &str) -> Result<RecordSet> {
    let table = normalize_table(output);
    if table.is_empty() {
        debug!("No table rows in shell output");
        return Ok(RecordSet::new());
    }

    let mut records = read_table(&table)?;
    match TIME_COLUMNS.iter().find(|c| records.has_column(c)) {
        Some(time_col) => {
            records.sort_by_column(time_col);
        }
        None => debug!("No time column in result, keeping server order"),
    }

    debug!(
        "Parsed {} records with {} columns",
        records.len(),
        records.columns.len()
    );
    Ok(records)
}
