//! Output formatting for command results.

use dbgrid_sqlite::{ColumnInfo, ExecuteResult, QueryResult, SqlOutcome};
use serde::Serialize;

/// Supported output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Json,
    Yaml,
    Table,
}

fn serialize<T: Serialize + ?Sized>(value: &T, format: OutputFormat) -> Option<Result<String, String>> {
    match format {
        OutputFormat::Json => Some(
            serde_json::to_string_pretty(value).map_err(|e| format!("JSON serialization failed: {e}")),
        ),
        OutputFormat::Yaml => {
            Some(serde_yaml::to_string(value).map_err(|e| format!("YAML serialization failed: {e}")))
        }
        OutputFormat::Table => None,
    }
}

/// Formats a table listing.
pub fn format_tables(tables: &[String], format: OutputFormat) -> Result<String, String> {
    serialize(tables, format).unwrap_or_else(|| {
        let mut out = tables.join("\n");
        out.push('\n');
        Ok(out)
    })
}

/// Formats column metadata for one table.
pub fn format_columns(columns: &[ColumnInfo], format: OutputFormat) -> Result<String, String> {
    serialize(columns, format).unwrap_or_else(|| Ok(columns_to_table(columns)))
}

/// Formats a page of rows or an ad-hoc read.
pub fn format_query(result: &QueryResult, format: OutputFormat) -> Result<String, String> {
    serialize(result, format).unwrap_or_else(|| Ok(query_to_table(result)))
}

/// Formats the outcome of a write.
pub fn format_execute(result: &ExecuteResult, format: OutputFormat) -> Result<String, String> {
    serialize(result, format).unwrap_or_else(|| Ok(execute_to_table(result)))
}

/// Formats whatever an ad-hoc statement produced.
pub fn format_outcome(outcome: &SqlOutcome, format: OutputFormat) -> Result<String, String> {
    match outcome {
        SqlOutcome::Query(result) => format_query(result, format),
        SqlOutcome::Execute(result) => format_execute(result, format),
    }
}

fn columns_to_table(columns: &[ColumnInfo]) -> String {
    let headers = ["cid", "name", "type", "notnull", "dflt_value", "pk"];
    let rows: Vec<Vec<String>> = columns
        .iter()
        .map(|c| {
            vec![
                c.ordinal_position.to_string(),
                c.name.clone(),
                c.declared_type.clone(),
                u8::from(c.not_null).to_string(),
                c.default_value.to_string(),
                u8::from(c.is_primary_key).to_string(),
            ]
        })
        .collect();
    grid(&headers, &rows)
}

fn query_to_table(result: &QueryResult) -> String {
    let headers: Vec<&str> = match result.rows.first() {
        Some(row) => row.columns().collect(),
        None => result.columns.iter().map(|c| c.name.as_str()).collect(),
    };
    let rows: Vec<Vec<String>> = result
        .rows
        .iter()
        .map(|row| row.iter().map(|(_, value)| value.to_string()).collect())
        .collect();

    let mut out = grid(&headers, &rows);
    match result.total {
        Some(total) => out.push_str(&format!("({} of {total} rows)\n", rows.len())),
        None => out.push_str(&format!("({} rows)\n", rows.len())),
    }
    out
}

fn execute_to_table(result: &ExecuteResult) -> String {
    match result {
        ExecuteResult::Applied { changes } => format!("OK: {changes} row(s) changed\n"),
        ExecuteResult::Failed { error } => format!("Failed: {error}\n"),
    }
}

/// Renders left-aligned columns separated by two spaces, with a rule under
/// the header.
fn grid(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    let line = |cells: Vec<&str>| {
        let padded: Vec<String> = cells
            .iter()
            .zip(&widths)
            .map(|(cell, width)| format!("{cell:<width$}"))
            .collect();
        format!("{}\n", padded.join("  ").trim_end())
    };

    out.push_str(&line(headers.to_vec()));
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    out.push_str(&line(rule.iter().map(String::as_str).collect()));
    for row in rows {
        out.push_str(&line(row.iter().map(String::as_str).collect()));
    }
    out
}
