use sqlx::PgPool;

use crate::catalog::RawEnumType;
use crate::error::ProviderError;

pub async fn query_enum_types(
    pool: &PgPool,
    schema: &str,
) -> Result<Vec<RawEnumType>, ProviderError> {
    let rows = sqlx::query_as::<_, EnumRow>(
        r#"
        SELECT t.typname::text AS name,
               array_agg(e.enumlabel::text ORDER BY e.enumsortorder) AS labels
        FROM pg_type t
        JOIN pg_enum e ON e.enumtypid = t.oid
        JOIN pg_namespace n ON n.oid = t.typnamespace
        WHERE n.nspname = $1
        GROUP BY t.typname
        ORDER BY t.typname
        "#,
    )
    .bind(schema)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| RawEnumType {
            name: row.name,
            values: row.labels,
        })
        .collect())
}

#[derive(sqlx::FromRow)]
struct EnumRow {
    name: String,
    labels: Vec<String>,
}
