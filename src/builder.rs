//! Normalizes raw provider rows into a [`SchemaSnapshot`].

use std::collections::HashSet;

use indexmap::IndexMap;

use crate::catalog::{RawCatalog, RawColumn, RawConstraint, RawIndex, RawTable, TableFilter};
use crate::error::BuildError;
use crate::schema::{
    ColumnDefinition, ConstraintDefinition, ConstraintKind, EnumType, FunctionDefinition,
    IndexDefinition, ReferentialAction, SchemaSnapshot, TableDefinition, TriggerDefinition,
};

/// Build the snapshot for one export run.
///
/// Tables keep the provider's order; with a filter only allow-listed tables,
/// and the triggers defined on them, are kept. Fails when nothing is left to export or the catalog contradicts
/// itself.
pub fn build(
    mut raw: RawCatalog,
    filter: Option<&TableFilter>,
) -> Result<SchemaSnapshot, BuildError> {
    if let Some(filter) = filter {
        for name in unmatched_filter_names(&raw.tables, filter) {
            tracing::warn!("Requested table {name} was not found in the catalog");
        }
    }

    let mut tables = Vec::new();
    for RawTable { name } in raw.tables.drain(..) {
        if filter.is_some_and(|f| !f.contains(&name)) {
            continue;
        }
        let columns = build_columns(&name, raw.columns.remove(&name).unwrap_or_default())?;
        let constraints =
            build_constraints(&name, raw.constraints.remove(&name).unwrap_or_default())?;
        let indexes = build_indexes(raw.indexes.remove(&name).unwrap_or_default());
        tables.push(TableDefinition {
            name,
            columns,
            constraints,
            indexes,
        });
    }

    if tables.is_empty() {
        return Err(BuildError::NoTables);
    }

    Ok(SchemaSnapshot {
        enums: raw
            .types
            .into_iter()
            .map(|t| EnumType {
                name: t.name,
                values: t.values,
            })
            .collect(),
        tables,
        functions: raw
            .functions
            .into_iter()
            .map(|f| FunctionDefinition {
                name: f.name,
                definition_text: f.definition,
            })
            .collect(),
        triggers: raw
            .triggers
            .into_iter()
            .filter(|t| filter.is_none_or(|f| f.contains(&t.table)))
            .map(|t| TriggerDefinition {
                name: t.name,
                table: t.table,
                definition_text: t.definition,
            })
            .collect(),
    })
}

/// Allow-listed names that match no catalog table, in allow-list order.
pub fn unmatched_filter_names(tables: &[RawTable], filter: &TableFilter) -> Vec<String> {
    filter
        .iter()
        .filter(|name| !tables.iter().any(|t| &t.name == *name))
        .cloned()
        .collect()
}

fn build_columns(table: &str, mut rows: Vec<RawColumn>) -> Result<Vec<ColumnDefinition>, BuildError> {
    rows.sort_by_key(|r| r.ordinal_position);

    let mut seen = HashSet::new();
    let mut columns = Vec::with_capacity(rows.len());
    for row in rows {
        if !seen.insert(row.column_name.clone()) {
            return Err(BuildError::DuplicateColumn {
                table: table.to_string(),
                column: row.column_name,
            });
        }
        columns.push(ColumnDefinition {
            declared_type: declared_type(&row.data_type, &row.udt_name),
            is_nullable: !row.is_nullable.trim().eq_ignore_ascii_case("NO"),
            name: row.column_name,
            udt_name: row.udt_name,
            character_max_length: row.character_maximum_length,
            numeric_precision: row.numeric_precision,
            numeric_scale: row.numeric_scale,
            default_literal: row.column_default,
        });
    }
    Ok(columns)
}

/// Catalog `ARRAY` columns become `<element>[]`, the element taken from the
/// `_`-prefixed udt name.
fn declared_type(data_type: &str, udt_name: &str) -> String {
    if data_type.eq_ignore_ascii_case("ARRAY") {
        let element = udt_name.strip_prefix('_').unwrap_or(udt_name);
        format!("{}[]", udt_to_type_name(element))
    } else {
        data_type.to_string()
    }
}

/// Map internal udt spellings back to the names `information_schema` uses.
fn udt_to_type_name(udt: &str) -> &str {
    match udt {
        "int2" => "smallint",
        "int4" => "integer",
        "int8" => "bigint",
        "float4" => "real",
        "float8" => "double precision",
        "bool" => "boolean",
        "varchar" => "character varying",
        "bpchar" => "character",
        "timestamp" => "timestamp without time zone",
        "timestamptz" => "timestamp with time zone",
        "time" => "time without time zone",
        "timetz" => "time with time zone",
        other => other,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RawKind {
    PrimaryKey,
    Unique,
    ForeignKey,
    Check,
}

impl RawKind {
    fn parse(raw: &str) -> Option<Self> {
        match raw.trim().replace('_', " ").to_ascii_uppercase().as_str() {
            "PRIMARY KEY" => Some(RawKind::PrimaryKey),
            "UNIQUE" => Some(RawKind::Unique),
            "FOREIGN KEY" => Some(RawKind::ForeignKey),
            "CHECK" => Some(RawKind::Check),
            _ => None,
        }
    }
}

struct ConstraintAccumulator {
    kind: RawKind,
    /// (per-column ordinal, local column, referenced column)
    columns: Vec<(i32, String, Option<String>)>,
    foreign_table: Option<String>,
    update_rule: Option<String>,
    delete_rule: Option<String>,
    check_clause: Option<String>,
}

/// Collapse one-row-per-column constraint rows into definitions, keeping the
/// order in which constraints were first reported.
fn build_constraints(
    table: &str,
    rows: Vec<RawConstraint>,
) -> Result<Vec<ConstraintDefinition>, BuildError> {
    let mut grouped: IndexMap<String, ConstraintAccumulator> = IndexMap::new();

    for row in rows {
        let Some(kind) = RawKind::parse(&row.constraint_type) else {
            tracing::warn!(
                "Skipping constraint {} on {table}: unknown type {}",
                row.constraint_name,
                row.constraint_type
            );
            continue;
        };
        let acc = grouped
            .entry(row.constraint_name.clone())
            .or_insert_with(|| ConstraintAccumulator {
                kind,
                columns: Vec::new(),
                foreign_table: None,
                update_rule: None,
                delete_rule: None,
                check_clause: None,
            });

        if let Some(column) = row.column_name {
            if !acc.columns.iter().any(|(_, c, _)| *c == column) {
                let ordinal = row
                    .ordinal_position
                    .unwrap_or(acc.columns.len() as i32 + 1);
                acc.columns.push((ordinal, column, row.foreign_column));
            }
        }
        if acc.foreign_table.is_none() {
            acc.foreign_table = row.foreign_table;
        }
        if acc.update_rule.is_none() {
            acc.update_rule = row.update_rule;
        }
        if acc.delete_rule.is_none() {
            acc.delete_rule = row.delete_rule;
        }
        if acc.check_clause.is_none() {
            acc.check_clause = row.check_clause;
        }
    }

    let mut constraints = Vec::with_capacity(grouped.len());
    let mut primary_key: Option<String> = None;
    for (name, mut acc) in grouped {
        acc.columns.sort_by_key(|(ordinal, _, _)| *ordinal);
        let kind = match acc.kind {
            RawKind::PrimaryKey => {
                if let Some(first) = primary_key.replace(name.clone()) {
                    return Err(BuildError::MultiplePrimaryKeys {
                        table: table.to_string(),
                        first,
                        second: name,
                    });
                }
                ConstraintKind::PrimaryKey
            }
            RawKind::Unique => ConstraintKind::Unique,
            RawKind::Check => {
                let clause = acc
                    .check_clause
                    .filter(|c| !c.trim().is_empty())
                    .ok_or_else(|| BuildError::MissingCheckClause {
                        table: table.to_string(),
                        constraint: name.clone(),
                    })?;
                constraints.push(ConstraintDefinition {
                    name,
                    columns: Vec::new(),
                    kind: ConstraintKind::Check { clause },
                });
                continue;
            }
            RawKind::ForeignKey => {
                let incomplete = || BuildError::IncompleteForeignKey {
                    table: table.to_string(),
                    constraint: name.clone(),
                };
                let referenced_table = acc.foreign_table.take().ok_or_else(incomplete)?;
                let referenced_columns = acc
                    .columns
                    .iter()
                    .map(|(_, _, referenced)| referenced.clone().ok_or_else(incomplete))
                    .collect::<Result<Vec<_>, _>>()?;
                if referenced_columns.is_empty() {
                    return Err(incomplete());
                }
                ConstraintKind::ForeignKey {
                    referenced_table,
                    referenced_columns,
                    on_update: parse_action(table, &name, acc.update_rule.as_deref())?,
                    on_delete: parse_action(table, &name, acc.delete_rule.as_deref())?,
                }
            }
        };
        constraints.push(ConstraintDefinition {
            name,
            columns: acc.columns.into_iter().map(|(_, c, _)| c).collect(),
            kind,
        });
    }

    Ok(constraints)
}

fn parse_action(
    table: &str,
    constraint: &str,
    raw: Option<&str>,
) -> Result<ReferentialAction, BuildError> {
    match raw {
        None => Ok(ReferentialAction::NoAction),
        Some(raw) => {
            ReferentialAction::parse(raw).ok_or_else(|| BuildError::UnknownReferentialAction {
                table: table.to_string(),
                constraint: constraint.to_string(),
                action: raw.to_string(),
            })
        }
    }
}

/// Primary-key indexes duplicate the PRIMARY KEY constraint and are dropped.
fn build_indexes(rows: Vec<RawIndex>) -> Vec<IndexDefinition> {
    rows.into_iter()
        .filter(|r| !r.is_primary)
        .map(|r| IndexDefinition {
            name: r.index_name,
            definition_text: r.index_definition,
            is_primary: r.is_primary,
            is_unique: r.is_unique,
        })
        .collect()
}
