use sqlx::PgPool;

use crate::catalog::RawColumn;
use crate::error::ProviderError;

pub async fn query_columns(
    pool: &PgPool,
    schema: &str,
    table_name: &str,
) -> Result<Vec<RawColumn>, ProviderError> {
    let rows = sqlx::query_as::<_, ColumnRow>(
        r#"
        SELECT c.column_name::text AS column_name, c.ordinal_position::int4 AS ordinal_position,
               c.data_type::text AS data_type, c.udt_name::text AS udt_name,
               c.character_maximum_length::int4 AS character_maximum_length,
               c.numeric_precision::int4 AS numeric_precision,
               c.numeric_scale::int4 AS numeric_scale,
               c.is_nullable::text AS is_nullable, c.column_default::text AS column_default
        FROM information_schema.columns c
        WHERE c.table_schema = $1 AND c.table_name = $2
        ORDER BY c.ordinal_position
        "#,
    )
    .bind(schema)
    .bind(table_name)
    .fetch_all(pool)
    .await
    .map_err(|e| ProviderError::query("columns", table_name, e))?;

    Ok(rows.into_iter().map(RawColumn::from).collect())
}

#[derive(sqlx::FromRow)]
struct ColumnRow {
    column_name: String,
    ordinal_position: i32,
    data_type: String,
    udt_name: String,
    character_maximum_length: Option<i32>,
    numeric_precision: Option<i32>,
    numeric_scale: Option<i32>,
    is_nullable: String,
    column_default: Option<String>,
}

impl From<ColumnRow> for RawColumn {
    fn from(row: ColumnRow) -> Self {
        RawColumn {
            column_name: row.column_name,
            ordinal_position: row.ordinal_position,
            data_type: row.data_type,
            udt_name: row.udt_name,
            character_maximum_length: row.character_maximum_length,
            numeric_precision: row.numeric_precision,
            numeric_scale: row.numeric_scale,
            is_nullable: row.is_nullable,
            column_default: row.column_default,
        }
    }
}
