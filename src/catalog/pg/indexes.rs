use sqlx::PgPool;

use crate::catalog::RawIndex;
use crate::error::ProviderError;

pub async fn query_indexes(
    pool: &PgPool,
    schema: &str,
    table_name: &str,
) -> Result<Vec<RawIndex>, ProviderError> {
    let rows = sqlx::query_as::<_, IndexRow>(
        r#"
        SELECT i.relname::text AS index_name,
               pg_get_indexdef(ix.indexrelid) AS index_definition,
               ix.indisprimary AS is_primary, ix.indisunique AS is_unique
        FROM pg_index ix
        JOIN pg_class t ON t.oid = ix.indrelid
        JOIN pg_class i ON i.oid = ix.indexrelid
        JOIN pg_namespace n ON n.oid = t.relnamespace
        WHERE n.nspname = $1 AND t.relname = $2
        ORDER BY i.relname
        "#,
    )
    .bind(schema)
    .bind(table_name)
    .fetch_all(pool)
    .await
    .map_err(|e| ProviderError::query("indexes", table_name, e))?;

    let indexes = rows
        .into_iter()
        .map(|row| RawIndex {
            index_name: row.index_name,
            index_definition: row.index_definition,
            is_primary: row.is_primary,
            is_unique: row.is_unique,
        })
        .collect();

    Ok(indexes)
}

#[derive(sqlx::FromRow)]
struct IndexRow {
    index_name: String,
    index_definition: String,
    is_primary: bool,
    is_unique: bool,
}
