//! Direct-connection catalog provider backed by a `sqlx` PostgreSQL pool.

mod columns;
mod constraints;
mod indexes;
mod routines;
mod rows;
mod tables;
mod types;

use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use super::{
    CatalogProvider, RawColumn, RawConstraint, RawEnumType, RawFunction, RawIndex, RawTable,
    RawTrigger, Row, TableFilter,
};
use crate::error::ProviderError;

/// Introspects one schema of a PostgreSQL database.
pub struct PgCatalog {
    pool: PgPool,
    schema: String,
}

impl PgCatalog {
    /// Open a single-connection pool; introspection is strictly sequential.
    pub async fn connect(url: &str, schema: &str) -> Result<Self, ProviderError> {
        let pool = PgPoolOptions::new().max_connections(1).connect(url).await?;
        Ok(Self::with_pool(pool, schema))
    }

    pub fn with_pool(pool: PgPool, schema: &str) -> Self {
        Self {
            pool,
            schema: schema.to_string(),
        }
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl CatalogProvider for PgCatalog {
    async fn list_enum_types(&self) -> Result<Vec<RawEnumType>, ProviderError> {
        types::query_enum_types(&self.pool, &self.schema).await
    }

    async fn list_tables(
        &self,
        filter: Option<&TableFilter>,
    ) -> Result<Vec<RawTable>, ProviderError> {
        let mut tables = tables::query_tables(&self.pool, &self.schema).await?;
        if let Some(filter) = filter {
            tables.retain(|t| filter.contains(&t.name));
        }
        Ok(tables)
    }

    async fn get_table_columns(&self, table: &str) -> Result<Vec<RawColumn>, ProviderError> {
        columns::query_columns(&self.pool, &self.schema, table).await
    }

    async fn get_table_constraints(
        &self,
        table: &str,
    ) -> Result<Vec<RawConstraint>, ProviderError> {
        constraints::query_constraints(&self.pool, &self.schema, table).await
    }

    async fn get_table_indexes(&self, table: &str) -> Result<Vec<RawIndex>, ProviderError> {
        indexes::query_indexes(&self.pool, &self.schema, table).await
    }

    async fn list_functions(&self) -> Result<Vec<RawFunction>, ProviderError> {
        routines::query_functions(&self.pool, &self.schema).await
    }

    async fn list_triggers(&self) -> Result<Vec<RawTrigger>, ProviderError> {
        routines::query_triggers(&self.pool, &self.schema).await
    }

    async fn fetch_rows(&self, table: &str) -> Result<Vec<Row>, ProviderError> {
        rows::query_rows(&self.pool, &self.schema, table).await
    }
}
