use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use crate::builder::build;
use crate::catalog::{
    CatalogProvider, RawCatalog, RawColumn, RawConstraint, RawEnumType, RawFunction, RawIndex,
    RawTable, RawTrigger, Row, TableFilter,
};
use crate::error::{ProviderError, WriteError};
use crate::schema::{ColumnDefinition, SchemaSnapshot};
use crate::sink::OutputSink;

/// Create a ColumnDefinition with sensible defaults for testing.
/// Returns a non-nullable integer column with no default.
pub fn test_column(name: &str) -> ColumnDefinition {
    ColumnDefinition {
        name: name.to_string(),
        declared_type: "integer".to_string(),
        udt_name: "int4".to_string(),
        character_max_length: None,
        numeric_precision: None,
        numeric_scale: None,
        is_nullable: false,
        default_literal: None,
    }
}

/// A raw `information_schema.columns` row.
pub fn raw_column(
    name: &str,
    ordinal: i32,
    data_type: &str,
    nullable: bool,
    default: Option<&str>,
) -> RawColumn {
    let udt_name = match data_type {
        "integer" => "int4",
        "bigint" => "int8",
        "boolean" => "bool",
        "character varying" => "varchar",
        "timestamp without time zone" => "timestamp",
        "timestamp with time zone" => "timestamptz",
        other => other,
    };
    RawColumn {
        column_name: name.to_string(),
        ordinal_position: ordinal,
        data_type: data_type.to_string(),
        udt_name: udt_name.to_string(),
        character_maximum_length: None,
        numeric_precision: None,
        numeric_scale: None,
        is_nullable: if nullable { "YES" } else { "NO" }.to_string(),
        column_default: default.map(str::to_string),
    }
}

/// One key-column row of a PRIMARY KEY, UNIQUE or FOREIGN KEY constraint.
pub fn raw_key_constraint(
    name: &str,
    constraint_type: &str,
    column: &str,
    ordinal: i32,
) -> RawConstraint {
    RawConstraint {
        constraint_name: name.to_string(),
        constraint_type: constraint_type.to_string(),
        column_name: Some(column.to_string()),
        ordinal_position: Some(ordinal),
        foreign_table: None,
        foreign_column: None,
        update_rule: None,
        delete_rule: None,
        check_clause: None,
    }
}

/// A CHECK constraint row.
pub fn raw_check_constraint(name: &str, clause: &str) -> RawConstraint {
    RawConstraint {
        constraint_name: name.to_string(),
        constraint_type: "CHECK".to_string(),
        column_name: None,
        ordinal_position: None,
        foreign_table: None,
        foreign_column: None,
        update_rule: None,
        delete_rule: None,
        check_clause: Some(clause.to_string()),
    }
}

/// `users(id integer NOT NULL PK, email text NULL, created_at timestamp NOT NULL DEFAULT now())`
pub fn users_catalog() -> RawCatalog {
    let mut raw = RawCatalog {
        tables: vec![RawTable {
            name: "users".to_string(),
        }],
        ..RawCatalog::default()
    };
    raw.columns.insert(
        "users".to_string(),
        vec![
            raw_column("id", 1, "integer", false, None),
            raw_column("email", 2, "text", true, None),
            raw_column(
                "created_at",
                3,
                "timestamp without time zone",
                false,
                Some("now()"),
            ),
        ],
    );
    raw.constraints.insert(
        "users".to_string(),
        vec![raw_key_constraint("users_pkey", "PRIMARY KEY", "id", 1)],
    );
    raw
}

pub fn users_snapshot() -> SchemaSnapshot {
    build(users_catalog(), None).unwrap()
}

/// In-memory catalog provider serving a fixed [`RawCatalog`] and data rows.
#[derive(Debug, Default)]
pub struct StaticCatalog {
    pub raw: RawCatalog,
    pub rows: HashMap<String, Vec<Row>>,
    /// Table whose row fetch fails.
    pub failing_table: Option<String>,
}

impl StaticCatalog {
    pub fn new(raw: RawCatalog) -> Self {
        Self {
            raw,
            ..Self::default()
        }
    }

    pub fn with_rows(mut self, table: &str, rows: Vec<Value>) -> Self {
        let rows = rows
            .into_iter()
            .filter_map(|v| match v {
                Value::Object(map) => Some(map),
                _ => None,
            })
            .collect();
        self.rows.insert(table.to_string(), rows);
        self
    }
}

#[async_trait]
impl CatalogProvider for StaticCatalog {
    async fn list_enum_types(&self) -> Result<Vec<RawEnumType>, ProviderError> {
        Ok(self.raw.types.clone())
    }

    async fn list_tables(
        &self,
        filter: Option<&TableFilter>,
    ) -> Result<Vec<RawTable>, ProviderError> {
        Ok(self
            .raw
            .tables
            .iter()
            .filter(|t| filter.is_none_or(|f| f.contains(&t.name)))
            .cloned()
            .collect())
    }

    async fn get_table_columns(&self, table: &str) -> Result<Vec<RawColumn>, ProviderError> {
        Ok(self.raw.columns.get(table).cloned().unwrap_or_default())
    }

    async fn get_table_constraints(
        &self,
        table: &str,
    ) -> Result<Vec<RawConstraint>, ProviderError> {
        Ok(self.raw.constraints.get(table).cloned().unwrap_or_default())
    }

    async fn get_table_indexes(&self, table: &str) -> Result<Vec<RawIndex>, ProviderError> {
        Ok(self.raw.indexes.get(table).cloned().unwrap_or_default())
    }

    async fn list_functions(&self) -> Result<Vec<RawFunction>, ProviderError> {
        Ok(self.raw.functions.clone())
    }

    async fn list_triggers(&self) -> Result<Vec<RawTrigger>, ProviderError> {
        Ok(self.raw.triggers.clone())
    }

    async fn fetch_rows(&self, table: &str) -> Result<Vec<Row>, ProviderError> {
        if self.failing_table.as_deref() == Some(table) {
            return Err(ProviderError::Other(format!("cannot read {table}")));
        }
        Ok(self.rows.get(table).cloned().unwrap_or_default())
    }
}

/// Output sink that records writes in order.
#[derive(Debug, Default)]
pub struct MemorySink {
    files: Mutex<Vec<(PathBuf, String)>>,
}

impl MemorySink {
    pub fn paths(&self) -> Vec<String> {
        self.files
            .lock()
            .unwrap()
            .iter()
            .map(|(p, _)| p.display().to_string())
            .collect()
    }

    pub fn contents(&self, path: &str) -> Option<String> {
        self.files
            .lock()
            .unwrap()
            .iter()
            .find(|(p, _)| p == Path::new(path))
            .map(|(_, c)| c.clone())
    }
}

#[async_trait]
impl OutputSink for MemorySink {
    async fn write(&self, relative_path: &Path, contents: &str) -> Result<(), WriteError> {
        self.files
            .lock()
            .unwrap()
            .push((relative_path.to_path_buf(), contents.to_string()));
        Ok(())
    }
}
