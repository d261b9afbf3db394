use super::{ident, quote_literal, terminate};
use crate::schema::{
    ColumnDefinition, ConstraintDefinition, ConstraintKind, EnumType, ReferentialAction,
    TableDefinition,
};

/// `CREATE TYPE ... AS ENUM` for every catalog enum.
pub fn render_types(enums: &[EnumType]) -> String {
    if enums.is_empty() {
        return "-- No enum types\n".to_string();
    }
    let mut out = String::from("-- Enum types\n\n");
    for e in enums {
        let values: Vec<String> = e.values.iter().map(|v| quote_literal(v)).collect();
        out.push_str(&format!(
            "CREATE TYPE {} AS ENUM ({});\n",
            ident(&e.name),
            values.join(", ")
        ));
    }
    out
}

/// `CREATE TABLE IF NOT EXISTS` for every table, each followed by its
/// secondary indexes.
pub fn render_tables(tables: &[TableDefinition]) -> String {
    if tables.is_empty() {
        return "-- No tables\n".to_string();
    }
    let blocks: Vec<String> = tables.iter().map(render_table).collect();
    format!("-- Tables\n\n{}", blocks.join("\n"))
}

fn render_table(table: &TableDefinition) -> String {
    let mut lines: Vec<String> = table.columns.iter().map(column_line).collect();
    lines.extend(table.constraints.iter().map(constraint_line));

    let mut out = format!("CREATE TABLE IF NOT EXISTS {} (\n", ident(&table.name));
    out.push_str(
        &lines
            .iter()
            .map(|l| format!("    {l}"))
            .collect::<Vec<_>>()
            .join(",\n"),
    );
    out.push_str("\n);\n");

    for index in &table.indexes {
        let backs_constraint = index.is_unique
            && table.constraints.iter().any(|c| {
                c.name == index.name
                    && matches!(c.kind, ConstraintKind::PrimaryKey | ConstraintKind::Unique)
            });
        if index.is_primary || backs_constraint {
            continue;
        }
        out.push_str(&terminate(&index.definition_text));
        out.push('\n');
    }
    out
}

fn column_line(col: &ColumnDefinition) -> String {
    let mut line = format!("{} {}", ident(&col.name), physical_type(col));
    if !col.is_nullable {
        line.push_str(" NOT NULL");
    }
    if let Some(default) = &col.default_literal {
        line.push_str(&format!(" DEFAULT {default}"));
    }
    line
}

/// Physical type with its length or precision suffix.
fn physical_type(col: &ColumnDefinition) -> String {
    if col.is_user_defined() {
        return ident(&col.udt_name);
    }
    let declared = col.declared_type.as_str();
    match declared.to_ascii_lowercase().as_str() {
        "character varying" | "varchar" | "character" | "char" | "bpchar" => {
            match col.character_max_length {
                Some(len) => format!("{declared}({len})"),
                None => declared.to_string(),
            }
        }
        "numeric" | "decimal" => match (col.numeric_precision, col.numeric_scale) {
            (Some(p), Some(s)) => format!("{declared}({p},{s})"),
            (Some(p), None) => format!("{declared}({p})"),
            _ => declared.to_string(),
        },
        _ => declared.to_string(),
    }
}

fn constraint_line(c: &ConstraintDefinition) -> String {
    let columns = ident_list(&c.columns);
    let body = match &c.kind {
        ConstraintKind::PrimaryKey => format!("PRIMARY KEY ({columns})"),
        ConstraintKind::Unique => format!("UNIQUE ({columns})"),
        ConstraintKind::Check { clause } => format!("CHECK ({clause})"),
        ConstraintKind::ForeignKey {
            referenced_table,
            referenced_columns,
            on_update,
            on_delete,
        } => {
            let mut fk = format!(
                "FOREIGN KEY ({columns}) REFERENCES {}({})",
                ident(referenced_table),
                ident_list(referenced_columns)
            );
            if *on_update != ReferentialAction::NoAction {
                fk.push_str(&format!(" ON UPDATE {on_update}"));
            }
            if *on_delete != ReferentialAction::NoAction {
                fk.push_str(&format!(" ON DELETE {on_delete}"));
            }
            fk
        }
    };
    format!("CONSTRAINT {} {body}", ident(&c.name))
}

fn ident_list(names: &[String]) -> String {
    names.iter().map(|n| ident(n)).collect::<Vec<_>>().join(", ")
}
