use sqlx::PgPool;

use crate::catalog::RawConstraint;
use crate::error::ProviderError;

pub async fn query_constraints(
    pool: &PgPool,
    schema: &str,
    table_name: &str,
) -> Result<Vec<RawConstraint>, ProviderError> {
    // One row per key column; the builder collapses composite keys.
    let key_rows = sqlx::query_as::<_, KeyRow>(
        r#"
        SELECT con.conname::text AS constraint_name,
               CASE con.contype
                   WHEN 'p' THEN 'PRIMARY KEY'
                   WHEN 'u' THEN 'UNIQUE'
                   ELSE 'FOREIGN KEY'
               END AS constraint_type,
               a.attname::text AS column_name,
               k.ord::int4 AS ordinal_position,
               ft.relname::text AS foreign_table,
               fa.attname::text AS foreign_column,
               CASE con.confupdtype
                   WHEN 'a' THEN 'NO ACTION' WHEN 'r' THEN 'RESTRICT' WHEN 'c' THEN 'CASCADE'
                   WHEN 'n' THEN 'SET NULL' WHEN 'd' THEN 'SET DEFAULT'
               END AS update_rule,
               CASE con.confdeltype
                   WHEN 'a' THEN 'NO ACTION' WHEN 'r' THEN 'RESTRICT' WHEN 'c' THEN 'CASCADE'
                   WHEN 'n' THEN 'SET NULL' WHEN 'd' THEN 'SET DEFAULT'
               END AS delete_rule
        FROM pg_constraint con
        JOIN pg_class t ON t.oid = con.conrelid
        JOIN pg_namespace n ON n.oid = t.relnamespace
        CROSS JOIN LATERAL unnest(con.conkey) WITH ORDINALITY AS k(attnum, ord)
        JOIN pg_attribute a ON a.attrelid = t.oid AND a.attnum = k.attnum
        LEFT JOIN pg_class ft ON ft.oid = con.confrelid
        LEFT JOIN pg_attribute fa ON fa.attrelid = con.confrelid AND fa.attnum = con.confkey[k.ord]
        WHERE n.nspname = $1 AND t.relname = $2 AND con.contype IN ('p', 'u', 'f')
        ORDER BY CASE con.contype WHEN 'p' THEN 0 WHEN 'u' THEN 1 ELSE 2 END,
                 con.conname, k.ord
        "#,
    )
    .bind(schema)
    .bind(table_name)
    .fetch_all(pool)
    .await
    .map_err(|e| ProviderError::query("key constraints", table_name, e))?;

    let check_rows = sqlx::query_as::<_, CheckRow>(
        r#"
        SELECT con.conname::text AS constraint_name,
               pg_get_constraintdef(con.oid) AS definition
        FROM pg_constraint con
        JOIN pg_class t ON t.oid = con.conrelid
        JOIN pg_namespace n ON n.oid = t.relnamespace
        WHERE n.nspname = $1 AND t.relname = $2 AND con.contype = 'c'
        ORDER BY con.conname
        "#,
    )
    .bind(schema)
    .bind(table_name)
    .fetch_all(pool)
    .await
    .map_err(|e| ProviderError::query("check constraints", table_name, e))?;

    let mut constraints: Vec<RawConstraint> = key_rows
        .into_iter()
        .map(|row| RawConstraint {
            constraint_name: row.constraint_name,
            constraint_type: row.constraint_type,
            column_name: Some(row.column_name),
            ordinal_position: Some(row.ordinal_position),
            foreign_table: row.foreign_table,
            foreign_column: row.foreign_column,
            update_rule: row.update_rule,
            delete_rule: row.delete_rule,
            check_clause: None,
        })
        .collect();

    constraints.extend(check_rows.into_iter().map(|row| RawConstraint {
        check_clause: Some(check_clause_from_definition(&row.definition).to_string()),
        constraint_name: row.constraint_name,
        constraint_type: "CHECK".to_string(),
        column_name: None,
        ordinal_position: None,
        foreign_table: None,
        foreign_column: None,
        update_rule: None,
        delete_rule: None,
    }));

    Ok(constraints)
}

/// Reduce `pg_get_constraintdef` output to the bare boolean expression.
/// e.g. "CHECK ((price > 0)) NO INHERIT NOT VALID" -> "(price > 0)"
fn check_clause_from_definition(definition: &str) -> &str {
    let mut s = definition.trim();
    if let Some(rest) = s.strip_prefix("CHECK ") {
        s = rest.trim();
    }
    // Either modifier may follow the expression, in any order.
    while let Some(rest) = s
        .strip_suffix(" NOT VALID")
        .or_else(|| s.strip_suffix(" NO INHERIT"))
    {
        s = rest.trim_end();
    }
    if s.starts_with('(') && s.ends_with(')') {
        s = &s[1..s.len() - 1];
    }
    s.trim()
}

#[derive(sqlx::FromRow)]
struct KeyRow {
    constraint_name: String,
    constraint_type: String,
    column_name: String,
    ordinal_position: i32,
    foreign_table: Option<String>,
    foreign_column: Option<String>,
    update_rule: Option<String>,
    delete_rule: Option<String>,
}

#[derive(sqlx::FromRow)]
struct CheckRow {
    constraint_name: String,
    definition: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_clause_from_definition() {
        assert_eq!(
            check_clause_from_definition(
                "CHECK ((status = ANY (ARRAY['a'::text, 'b'::text])))"
            ),
            "(status = ANY (ARRAY['a'::text, 'b'::text]))"
        );
        assert_eq!(
            check_clause_from_definition("CHECK ((price > 0)) NOT VALID"),
            "(price > 0)"
        );
        assert_eq!(
            check_clause_from_definition("CHECK ((qty > 0)) NO INHERIT"),
            "(qty > 0)"
        );
        assert_eq!(
            check_clause_from_definition("CHECK ((qty > 0)) NO INHERIT NOT VALID"),
            "(qty > 0)"
        );
        assert_eq!(check_clause_from_definition("price > 0"), "price > 0");
    }
}
