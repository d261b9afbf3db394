//! Catalog data provider contract.
//!
//! A [`CatalogProvider`] runs the introspection queries and hands back raw,
//! un-normalized rows. The [`builder`](crate::builder) turns those rows into a
//! [`SchemaSnapshot`](crate::schema::SchemaSnapshot).

pub mod pg;

use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::ProviderError;

/// Allow-list of table names.
pub type TableFilter = BTreeSet<String>;

/// One data row, keyed by physical column name.
pub type Row = Map<String, Value>;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RawEnumType {
    pub name: String,
    pub values: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RawTable {
    pub name: String,
}

/// A row of `information_schema.columns`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RawColumn {
    pub column_name: String,
    pub ordinal_position: i32,
    pub data_type: String,
    pub udt_name: String,
    #[serde(default)]
    pub character_maximum_length: Option<i32>,
    #[serde(default)]
    pub numeric_precision: Option<i32>,
    #[serde(default)]
    pub numeric_scale: Option<i32>,
    /// `YES` or `NO`.
    pub is_nullable: String,
    #[serde(default)]
    pub column_default: Option<String>,
}

/// One constrained column of one constraint. Composite constraints repeat
/// across rows; CHECK constraints come as a single row without a column.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RawConstraint {
    pub constraint_name: String,
    /// `PRIMARY KEY`, `FOREIGN KEY`, `UNIQUE` or `CHECK`.
    pub constraint_type: String,
    #[serde(default)]
    pub column_name: Option<String>,
    #[serde(default)]
    pub ordinal_position: Option<i32>,
    #[serde(default)]
    pub foreign_table: Option<String>,
    #[serde(default)]
    pub foreign_column: Option<String>,
    #[serde(default)]
    pub update_rule: Option<String>,
    #[serde(default)]
    pub delete_rule: Option<String>,
    #[serde(default)]
    pub check_clause: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RawIndex {
    pub index_name: String,
    pub index_definition: String,
    pub is_primary: bool,
    pub is_unique: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RawFunction {
    pub name: String,
    pub definition: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RawTrigger {
    pub name: String,
    pub table: String,
    pub definition: String,
}

/// Everything a provider returned for one run, before normalization.
#[derive(Debug, Clone, Default)]
pub struct RawCatalog {
    pub types: Vec<RawEnumType>,
    pub tables: Vec<RawTable>,
    pub columns: HashMap<String, Vec<RawColumn>>,
    pub constraints: HashMap<String, Vec<RawConstraint>>,
    pub indexes: HashMap<String, Vec<RawIndex>>,
    pub functions: Vec<RawFunction>,
    pub triggers: Vec<RawTrigger>,
}

/// Source of raw catalog rows.
///
/// One implementation exists per connectivity mode; the rest of the crate
/// never parses catalog text itself.
#[async_trait]
pub trait CatalogProvider: Send + Sync {
    async fn list_enum_types(&self) -> Result<Vec<RawEnumType>, ProviderError>;

    /// List base tables, restricted to `filter` when given.
    async fn list_tables(
        &self,
        filter: Option<&TableFilter>,
    ) -> Result<Vec<RawTable>, ProviderError>;

    /// Columns ordered by physical position.
    async fn get_table_columns(&self, table: &str) -> Result<Vec<RawColumn>, ProviderError>;

    async fn get_table_constraints(
        &self,
        table: &str,
    ) -> Result<Vec<RawConstraint>, ProviderError>;

    async fn get_table_indexes(&self, table: &str) -> Result<Vec<RawIndex>, ProviderError>;

    async fn list_functions(&self) -> Result<Vec<RawFunction>, ProviderError>;

    async fn list_triggers(&self) -> Result<Vec<RawTrigger>, ProviderError>;

    /// All rows of a table as JSON objects.
    async fn fetch_rows(&self, table: &str) -> Result<Vec<Row>, ProviderError>;

    /// Fetch everything the builder needs.
    ///
    /// Template method over the per-object queries; per-table details are only
    /// fetched for the tables `list_tables` returned.
    async fn fetch_catalog(
        &self,
        filter: Option<&TableFilter>,
    ) -> Result<RawCatalog, ProviderError> {
        let types = self.list_enum_types().await?;
        let tables = self.list_tables(filter).await?;
        tracing::info!("Found {} tables, {} enum types", tables.len(), types.len());

        let mut raw = RawCatalog {
            types,
            ..RawCatalog::default()
        };
        for table in &tables {
            tracing::debug!("Introspecting table {}", table.name);
            let columns = self.get_table_columns(&table.name).await?;
            let constraints = self.get_table_constraints(&table.name).await?;
            let indexes = self.get_table_indexes(&table.name).await?;
            raw.columns.insert(table.name.clone(), columns);
            raw.constraints.insert(table.name.clone(), constraints);
            raw.indexes.insert(table.name.clone(), indexes);
        }
        raw.tables = tables;
        raw.functions = self.list_functions().await?;
        raw.triggers = self.list_triggers().await?;
        Ok(raw)
    }
}
