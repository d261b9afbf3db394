pub mod dart;
pub mod imports;
pub mod sql;

use std::path::PathBuf;

use crate::check_clause::{parse_check_enum, CheckEnum};
use crate::schema::{ConstraintDefinition, ConstraintKind, SchemaSnapshot, TableDefinition};
use crate::typemap::TargetType;

/// One rendered output file, path relative to its output directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
    pub path: PathBuf,
    pub contents: String,
}

impl GeneratedFile {
    pub fn new(path: impl Into<PathBuf>, contents: String) -> Self {
        Self {
            path: path.into(),
            contents,
        }
    }
}

/// Trait for code generators driven by a snapshot.
pub trait Generator {
    fn generate(&self, snapshot: &SchemaSnapshot) -> Vec<GeneratedFile>;
}

/// A column default the model generator knows how to bake in.
#[derive(Debug, Clone, PartialEq)]
pub enum DefaultValue {
    /// Sequence-backed; the server assigns the value.
    Sequence,
    /// Current timestamp at construction.
    Now,
    Text(String),
    Integer(i64),
    /// Kept as source text so the rendered literal matches the catalog.
    Double(String),
    Boolean(bool),
    Unrecognized,
}

const NOW_DEFAULTS: &[&str] = &[
    "now()",
    "current_timestamp",
    "current_timestamp()",
    "current_date",
    "localtimestamp",
    "transaction_timestamp()",
    "statement_timestamp()",
    "clock_timestamp()",
    "timezone('utc',now())",
    "timezone('utc'::text,now())",
    "(now()attimezone'utc'::text)",
    "(now()attimezone'utc')",
];

/// Translate a catalog default expression for a field of type `target`.
pub fn translate_default(default: &str, target: &TargetType) -> DefaultValue {
    let trimmed = default.trim();
    if is_serial_default(trimmed) {
        return DefaultValue::Sequence;
    }

    let compact: String = trimmed
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_ascii_lowercase();
    if *target == TargetType::DateTime && NOW_DEFAULTS.contains(&compact.as_str()) {
        return DefaultValue::Now;
    }

    let expr = strip_pg_typecast(trimmed);
    let quoted = unquote_sql_string(expr);
    match target {
        TargetType::Text => match quoted {
            Some(text) => DefaultValue::Text(text),
            None => DefaultValue::Unrecognized,
        },
        TargetType::Integer => {
            let raw = quoted.as_deref().unwrap_or(expr);
            match strip_parens(raw).parse::<i64>() {
                Ok(n) => DefaultValue::Integer(n),
                Err(_) => DefaultValue::Unrecognized,
            }
        }
        TargetType::Double => {
            let raw = strip_parens(quoted.as_deref().unwrap_or(expr));
            match raw.parse::<f64>() {
                Ok(n) if n.is_finite() => {
                    if raw.contains(['.', 'e', 'E']) {
                        DefaultValue::Double(raw.to_string())
                    } else {
                        DefaultValue::Double(format!("{raw}.0"))
                    }
                }
                _ => DefaultValue::Unrecognized,
            }
        }
        TargetType::Boolean => match quoted.as_deref().unwrap_or(expr).to_ascii_lowercase().as_str() {
            "true" => DefaultValue::Boolean(true),
            "false" => DefaultValue::Boolean(false),
            _ => DefaultValue::Unrecognized,
        },
        _ => DefaultValue::Unrecognized,
    }
}

fn strip_parens(expr: &str) -> &str {
    let mut s = expr.trim();
    while s.starts_with('(') && s.ends_with(')') {
        s = s[1..s.len() - 1].trim();
    }
    s
}

/// Unquote a single-quoted SQL string literal, undoubling `''`.
fn unquote_sql_string(expr: &str) -> Option<String> {
    let inner = expr.strip_prefix('\'')?.strip_suffix('\'')?;
    if inner.replace("''", "").contains('\'') {
        return None;
    }
    Some(inner.replace("''", "'"))
}

/// Strip PostgreSQL type casts from a default expression.
/// e.g. "'hello'::character varying" -> "'hello'"
/// e.g. "0::integer" -> "0"
pub fn strip_pg_typecast(expr: &str) -> &str {
    // Find the last :: that's not inside quotes
    if let Some(pos) = find_typecast_pos(expr) {
        expr[..pos].trim()
    } else {
        expr.trim()
    }
}

fn find_typecast_pos(expr: &str) -> Option<usize> {
    let bytes = expr.as_bytes();
    let mut in_quotes = false;
    let mut in_parens = 0u32;
    let mut i = 0;
    let mut last_cast_pos = None;

    while i < bytes.len() {
        match bytes[i] {
            b'\'' => in_quotes = !in_quotes,
            b'(' if !in_quotes => in_parens += 1,
            b')' if !in_quotes => in_parens = in_parens.saturating_sub(1),
            b':' if !in_quotes && in_parens == 0 && i + 1 < bytes.len() && bytes[i + 1] == b':' => {
                last_cast_pos = Some(i);
                i += 1; // skip second ':'
            }
            _ => {}
        }
        i += 1;
    }

    last_cast_pos
}

/// Check if a column default is a serial/sequence default.
pub fn is_serial_default(default: &str) -> bool {
    default.trim_start().starts_with("nextval(")
}

/// Check if a column is part of the primary key.
pub fn is_primary_key_column(col_name: &str, table: &TableDefinition) -> bool {
    table
        .primary_key()
        .is_some_and(|pk| pk.columns.iter().any(|n| n == col_name))
}

/// Check if a column has a single-column unique constraint.
pub fn has_unique_constraint(col_name: &str, constraints: &[ConstraintDefinition]) -> bool {
    constraints
        .iter()
        .any(|c| c.kind == ConstraintKind::Unique && c.columns.len() == 1 && c.columns[0] == col_name)
}

/// The foreign key target `(table, column)` for a column, if it has one.
pub fn get_foreign_key_for_column<'a>(
    col_name: &str,
    constraints: &'a [ConstraintDefinition],
) -> Option<(&'a str, &'a str)> {
    constraints.iter().find_map(|c| match &c.kind {
        ConstraintKind::ForeignKey {
            referenced_table,
            referenced_columns,
            ..
        } => {
            let pos = c.columns.iter().position(|n| n == col_name)?;
            let referenced = referenced_columns.get(pos)?;
            Some((referenced_table.as_str(), referenced.as_str()))
        }
        _ => None,
    })
}

/// The enumerated values a CHECK constraint allows for a column, if any.
pub fn check_enum_for_column(col_name: &str, table: &TableDefinition) -> Option<CheckEnum> {
    table.constraints.iter().find_map(|c| match &c.kind {
        ConstraintKind::Check { clause } => {
            parse_check_enum(clause).filter(|parsed| parsed.column == col_name)
        }
        _ => None,
    })
}
