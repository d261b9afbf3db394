use sqlx::PgPool;

use crate::catalog::RawTable;
use crate::error::ProviderError;

pub async fn query_tables(pool: &PgPool, schema: &str) -> Result<Vec<RawTable>, ProviderError> {
    let rows = sqlx::query_as::<_, TableRow>(
        r#"
        SELECT t.table_name::text AS table_name
        FROM information_schema.tables t
        WHERE t.table_schema = $1
          AND t.table_type = 'BASE TABLE'
        ORDER BY t.table_name
        "#,
    )
    .bind(schema)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| RawTable {
            name: row.table_name,
        })
        .collect())
}

#[derive(sqlx::FromRow)]
struct TableRow {
    table_name: String,
}
