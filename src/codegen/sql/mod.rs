//! SQL script rendering.
//!
//! The snapshot is rendered into section files that replay in order:
//! enum types, tables, per-table data, functions, triggers. A manifest
//! includes them with psql's `\i`.

mod data;
mod ddl;
mod routines;

use chrono::{DateTime, SecondsFormat, Utc};

pub use data::render_table_data;
pub use ddl::{render_tables, render_types};
pub use routines::{render_functions, render_triggers};

use crate::codegen::{GeneratedFile, Generator};
use crate::schema::SchemaSnapshot;

pub const TYPES_FILE: &str = "01_types.sql";
pub const TABLES_FILE: &str = "02_tables.sql";
pub const FUNCTIONS_FILE: &str = "04_functions.sql";
pub const TRIGGERS_FILE: &str = "05_triggers.sql";
pub const MANIFEST_FILE: &str = "manifest.sql";

/// PostgreSQL reserved key words. These cannot be used as bare identifiers.
const RESERVED_WORDS: &[&str] = &[
    "all", "analyse", "analyze", "and", "any", "array", "as", "asc", "asymmetric",
    "authorization", "binary", "both", "case", "cast", "check", "collate", "collation",
    "column", "concurrently", "constraint", "create", "cross", "current_catalog",
    "current_date", "current_role", "current_schema", "current_time", "current_timestamp",
    "current_user", "default", "deferrable", "desc", "distinct", "do", "else", "end",
    "except", "false", "fetch", "for", "foreign", "freeze", "from", "full", "grant", "group",
    "having", "ilike", "in", "initially", "inner", "intersect", "into", "is", "isnull", "join",
    "lateral", "leading", "left", "like", "limit", "localtime", "localtimestamp", "natural",
    "not", "notnull", "null", "offset", "on", "only", "or", "order", "outer", "overlaps",
    "placing", "primary", "references", "returning", "right", "select", "session_user",
    "similar", "some", "symmetric", "table", "tablesample", "then", "to", "trailing", "true",
    "union", "unique", "user", "using", "variadic", "verbose", "when", "where", "window",
    "with",
];

/// File name of a table's data section.
pub fn data_file_name(table: &str) -> String {
    let safe: String = table
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!("03_data_{safe}.sql")
}

/// Always double-quote an identifier.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Emit an identifier bare when PostgreSQL would read it back unchanged.
pub fn ident(name: &str) -> String {
    if is_bare_identifier(name) {
        name.to_string()
    } else {
        quote_ident(name)
    }
}

fn is_bare_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    let starts_ok = chars
        .next()
        .is_some_and(|c| c.is_ascii_lowercase() || c == '_');
    starts_ok
        && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '$')
        && !RESERVED_WORDS.contains(&name)
}

/// Single-quote a string literal, doubling embedded quotes.
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Terminate a statement with `;` unless it already is.
pub(crate) fn terminate(statement: &str) -> String {
    let trimmed = statement.trim_end();
    if trimmed.ends_with(';') {
        trimmed.to_string()
    } else {
        format!("{trimmed};")
    }
}

/// Renders the schema sections that do not depend on table data.
pub struct SqlSchemaGenerator;

impl Generator for SqlSchemaGenerator {
    fn generate(&self, snapshot: &SchemaSnapshot) -> Vec<GeneratedFile> {
        vec![
            GeneratedFile::new(TYPES_FILE, render_types(&snapshot.enums)),
            GeneratedFile::new(TABLES_FILE, render_tables(&snapshot.tables)),
            GeneratedFile::new(FUNCTIONS_FILE, render_functions(&snapshot.functions)),
            GeneratedFile::new(TRIGGERS_FILE, render_triggers(&snapshot.triggers)),
        ]
    }
}

/// Render the manifest replaying `files` in order.
pub fn render_manifest(files: &[String], table_count: usize, generated_at: DateTime<Utc>) -> String {
    let mut out = String::new();
    out.push_str("-- pgexport manifest\n");
    out.push_str(&format!(
        "-- Generated at: {}\n",
        generated_at.to_rfc3339_opts(SecondsFormat::Secs, true)
    ));
    out.push_str(&format!("-- Tables: {table_count}\n\n"));
    for file in files {
        out.push_str(&format!("\\i {file}\n"));
    }
    out
}
