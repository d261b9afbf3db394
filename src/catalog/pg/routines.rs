use sqlx::PgPool;

use crate::catalog::{RawFunction, RawTrigger};
use crate::error::ProviderError;

/// Plain functions of the schema, excluding those owned by extensions.
pub async fn query_functions(
    pool: &PgPool,
    schema: &str,
) -> Result<Vec<RawFunction>, ProviderError> {
    let rows = sqlx::query_as::<_, FunctionRow>(
        r#"
        SELECT p.proname::text AS name, pg_get_functiondef(p.oid) AS definition
        FROM pg_proc p
        JOIN pg_namespace n ON n.oid = p.pronamespace
        WHERE n.nspname = $1
          AND p.prokind = 'f'
          AND NOT EXISTS (
              SELECT 1 FROM pg_depend d WHERE d.objid = p.oid AND d.deptype = 'e'
          )
        ORDER BY p.proname, p.oid
        "#,
    )
    .bind(schema)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| RawFunction {
            name: row.name,
            definition: row.definition,
        })
        .collect())
}

pub async fn query_triggers(
    pool: &PgPool,
    schema: &str,
) -> Result<Vec<RawTrigger>, ProviderError> {
    let rows = sqlx::query_as::<_, TriggerRow>(
        r#"
        SELECT tg.tgname::text AS name, c.relname::text AS table_name,
               pg_get_triggerdef(tg.oid) AS definition
        FROM pg_trigger tg
        JOIN pg_class c ON c.oid = tg.tgrelid
        JOIN pg_namespace n ON n.oid = c.relnamespace
        WHERE n.nspname = $1 AND NOT tg.tgisinternal
        ORDER BY c.relname, tg.tgname
        "#,
    )
    .bind(schema)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| RawTrigger {
            name: row.name,
            table: row.table_name,
            definition: row.definition,
        })
        .collect())
}

#[derive(sqlx::FromRow)]
struct FunctionRow {
    name: String,
    definition: String,
}

#[derive(sqlx::FromRow)]
struct TriggerRow {
    name: String,
    table_name: String,
    definition: String,
}
