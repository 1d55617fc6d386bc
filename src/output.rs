//! Rendering of record sets for the command line.

use crate::error::{ImpalaError, Result};
use crate::query::{RecordSet, Value};

/// Output format for query results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Aligned plain-text table.
    #[default]
    Table,
    /// Comma-separated values with a header row.
    Csv,
    /// One JSON object per record (JSON Lines).
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" | "text" => Ok(Self::Table),
            "csv" => Ok(Self::Csv),
            "json" | "jsonl" => Ok(Self::Json),
            _ => Err(format!(
                "Invalid output format: {s}. Expected: table, csv, or json"
            )),
        }
    }
}

/// Renders `records` in the requested format.
pub fn render(records: &RecordSet, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Table => Ok(render_table(records)),
        OutputFormat::Csv => render_csv(records),
        OutputFormat::Json => render_json(records),
    }
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        other => other.to_display_string(),
    }
}

fn pad_row(fields: &[&str], widths: &[usize]) -> String {
    fields
        .iter()
        .zip(widths)
        .map(|(f, &w)| format!("{f:<w$}"))
        .collect::<Vec<_>>()
        .join("  ")
        .trim_end()
        .to_string()
}

fn render_table(records: &RecordSet) -> String {
    let mut widths: Vec<usize> = records.columns.iter().map(|c| c.name.len()).collect();
    let cells: Vec<Vec<String>> = records
        .rows
        .iter()
        .map(|row| row.iter().map(Value::to_display_string).collect())
        .collect();
    for row in &cells {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let header: Vec<&str> = records.columns.iter().map(|c| c.name.as_str()).collect();
    let rules: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();

    let mut out = String::new();
    out.push_str(&pad_row(&header, &widths));
    out.push('\n');
    out.push_str(&pad_row(&rules.iter().map(String::as_str).collect::<Vec<_>>(), &widths));
    out.push('\n');
    for row in &cells {
        out.push_str(&pad_row(&row.iter().map(String::as_str).collect::<Vec<_>>(), &widths));
        out.push('\n');
    }
    out
}

fn render_csv(records: &RecordSet) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    let csv_err = |e: csv::Error| ImpalaError::internal(format!("CSV output failed: {e}"));

    writer
        .write_record(records.columns.iter().map(|c| c.name.as_str()))
        .map_err(csv_err)?;
    for row in &records.rows {
        writer
            .write_record(row.iter().map(cell_text))
            .map_err(csv_err)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| ImpalaError::internal(format!("CSV output failed: {e}")))?;
    String::from_utf8(bytes).map_err(|e| ImpalaError::internal(format!("CSV output failed: {e}")))
}

fn render_json(records: &RecordSet) -> Result<String> {
    let mut out = String::new();
    for row in &records.rows {
        let object: serde_json::Map<String, serde_json::Value> = records
            .columns
            .iter()
            .zip(row)
            .map(|(col, value)| (col.name.clone(), value.to_json()))
            .collect();
        let line = serde_json::to_string(&object)
            .map_err(|e| ImpalaError::internal(format!("JSON output failed: {e}")))?;
        out.push_str(&line);
        out.push('\n');
    }
    Ok(out)
}
