use serde_json::Value;
use sqlx::PgPool;

use crate::catalog::Row;
use crate::codegen::sql::quote_ident;
use crate::error::ProviderError;

/// Read every row of a table as a JSON object keyed by column name.
pub async fn query_rows(
    pool: &PgPool,
    schema: &str,
    table_name: &str,
) -> Result<Vec<Row>, ProviderError> {
    let sql = format!(
        "SELECT row_to_json(t) FROM {}.{} t",
        quote_ident(schema),
        quote_ident(table_name)
    );
    let values = sqlx::query_scalar::<_, Value>(&sql)
        .fetch_all(pool)
        .await
        .map_err(|e| ProviderError::query("rows", table_name, e))?;

    values
        .into_iter()
        .map(|value| match value {
            Value::Object(map) => Ok(map),
            other => Err(ProviderError::Other(format!(
                "row_to_json returned a non-object for table {table_name}: {other}"
            ))),
        })
        .collect()
}
