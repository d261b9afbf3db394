use serde_json::Value;

use super::{ident, quote_literal};
use crate::catalog::Row;
use crate::error::RenderError;
use crate::schema::{ColumnDefinition, TableDefinition};
use crate::typemap::split_array;

/// A rendered data file and what went into it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataSection {
    pub sql: String,
    pub rows_written: usize,
    pub rows_skipped: usize,
}

/// Render one multi-row `INSERT` for a table's rows.
///
/// Values are looked up by column name in table order; absent keys become
/// `NULL`. A row holding a value PostgreSQL cannot store is replaced by a
/// `-- skipped row` comment.
pub fn render_table_data(table: &TableDefinition, rows: &[Row]) -> Result<DataSection, RenderError> {
    if table.columns.is_empty() {
        return Err(RenderError::NoColumns {
            table: table.name.clone(),
        });
    }

    let mut out = format!("-- Data for {}\n\n", table.name);
    if rows.is_empty() {
        out.push_str(&format!("-- No data for table {}\n", table.name));
        return Ok(DataSection {
            sql: out,
            rows_written: 0,
            rows_skipped: 0,
        });
    }

    let mut tuples = Vec::with_capacity(rows.len());
    let mut rows_skipped = 0;
    for (n, row) in rows.iter().enumerate() {
        match render_row(table, row) {
            Ok(tuple) => tuples.push(tuple),
            Err(err) => {
                tracing::warn!("Skipping row {} of {}: {err}", n + 1, table.name);
                out.push_str(&format!("-- skipped row {}: {err}\n", n + 1));
                rows_skipped += 1;
            }
        }
    }

    if tuples.is_empty() {
        out.push_str(&format!("-- No data for table {}\n", table.name));
    } else {
        let columns: Vec<String> = table.columns.iter().map(|c| ident(&c.name)).collect();
        out.push_str(&format!(
            "INSERT INTO {} ({}) VALUES\n",
            ident(&table.name),
            columns.join(", ")
        ));
        out.push_str(
            &tuples
                .iter()
                .map(|t| format!("    ({t})"))
                .collect::<Vec<_>>()
                .join(",\n"),
        );
        out.push_str(";\n");
    }

    Ok(DataSection {
        sql: out,
        rows_written: tuples.len(),
        rows_skipped,
    })
}

fn render_row(table: &TableDefinition, row: &Row) -> Result<String, RenderError> {
    let values = table
        .columns
        .iter()
        .map(|col| match row.get(&col.name) {
            Some(value) => render_column_value(col, value).map_err(|reason| {
                RenderError::Unescapable {
                    table: table.name.clone(),
                    column: col.name.clone(),
                    reason,
                }
            }),
            None => Ok("NULL".to_string()),
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(values.join(", "))
}

/// Render a value as a literal the column accepts on insert.
///
/// JSON columns take the JSON text of any value. Array columns carry an
/// explicit element cast, since `ARRAY['...']` alone is typed `text[]`.
fn render_column_value(col: &ColumnDefinition, value: &Value) -> Result<String, String> {
    if value.is_null() {
        return Ok("NULL".to_string());
    }
    let (base, is_array) = split_array(&col.declared_type);
    let json_elements = is_json_type(base);
    match value {
        Value::Array(items) if is_array => {
            let element = match col.udt_name.strip_prefix('_') {
                Some(udt) => ident(udt),
                None => base.to_string(),
            };
            let array = if items.is_empty() {
                "'{}'".to_string()
            } else {
                render_array(items, json_elements)?
            };
            Ok(format!("{array}::{element}[]"))
        }
        _ if json_elements => render_json_text(value),
        _ => render_value(value),
    }
}

fn render_array(items: &[Value], json_elements: bool) -> Result<String, String> {
    let rendered = items
        .iter()
        .map(|item| match item {
            Value::Null => Ok("NULL".to_string()),
            // Each element of a json[] is a whole document.
            _ if json_elements => render_json_text(item),
            Value::Array(inner) => render_array(inner, false),
            _ => render_value(item),
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(format!("ARRAY[{}]", rendered.join(", ")))
}

fn is_json_type(name: &str) -> bool {
    name.eq_ignore_ascii_case("json") || name.eq_ignore_ascii_case("jsonb")
}

/// jsonb rejects `\u0000`, so a NUL anywhere in the document skips the row.
fn render_json_text(value: &Value) -> Result<String, String> {
    if contains_nul(value) {
        return Err("JSON value contains a NUL character".to_string());
    }
    Ok(quote_literal(&value.to_string()))
}

fn contains_nul(value: &Value) -> bool {
    match value {
        Value::String(s) => s.contains('\0'),
        Value::Array(items) => items.iter().any(contains_nul),
        Value::Object(map) => map.iter().any(|(k, v)| k.contains('\0') || contains_nul(v)),
        _ => false,
    }
}

/// Render a JSON value as a SQL literal.
fn render_value(value: &Value) -> Result<String, String> {
    match value {
        Value::Null => Ok("NULL".to_string()),
        Value::Bool(true) => Ok("TRUE".to_string()),
        Value::Bool(false) => Ok("FALSE".to_string()),
        Value::Number(n) => Ok(n.to_string()),
        Value::String(s) => {
            if s.contains('\0') {
                return Err("string contains a NUL character".to_string());
            }
            Ok(quote_literal(s))
        }
        Value::Array(items) if items.is_empty() => Ok("'{}'".to_string()),
        Value::Array(items) => render_array(items, false),
        Value::Object(_) => Ok(quote_literal(&value.to_string())),
    }
}
