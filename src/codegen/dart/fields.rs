//! Resolves each column into the Dart field it becomes.

use std::collections::HashSet;

use crate::codegen::{
    check_enum_for_column, get_foreign_key_for_column, has_unique_constraint,
    is_primary_key_column, translate_default, DefaultValue,
};
use crate::naming::{
    check_enum_type_name, claim_name, column_to_field_name, enum_member_names, enum_type_name,
    table_to_class_name, unique_names,
};
use crate::schema::{ColumnDefinition, SchemaSnapshot, TableDefinition};
use crate::typemap::dart::{map_dart_type, nullable};
use crate::typemap::{map_column, split_array, TargetType};

/// A Dart enum declared in a model file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumSpec {
    pub type_name: String,
    /// Catalog literals in declaration order.
    pub values: Vec<String>,
    /// Member names, parallel to `values`.
    pub members: Vec<String>,
    /// Where the values came from, for the doc comment.
    pub origin: String,
}

impl EnumSpec {
    fn new(type_name: String, values: Vec<String>, origin: String) -> Self {
        let members = enum_member_names(&values);
        Self {
            type_name,
            values,
            members,
            origin,
        }
    }

    pub fn member_for(&self, value: &str) -> Option<&str> {
        self.values
            .iter()
            .position(|v| v == value)
            .map(|i| self.members[i].as_str())
    }
}

/// Default applied when the constructor argument is omitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldDefault {
    /// `DateTime.now()` at construction.
    Now,
    /// A constant Dart expression.
    Literal(String),
}

impl FieldDefault {
    pub fn expr(&self) -> &str {
        match self {
            FieldDefault::Now => "DateTime.now()",
            FieldDefault::Literal(expr) => expr,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FieldSpec<'a> {
    pub column: &'a ColumnDefinition,
    pub name: String,
    pub target: TargetType,
    pub enum_type: Option<EnumSpec>,
    /// Dart type without nullability.
    pub dart_type: String,
    pub import: Option<&'static str>,
    pub nullable: bool,
    pub default: Option<FieldDefault>,
    pub primary_key: bool,
    pub references: Option<(String, String)>,
    pub unique: bool,
}

impl FieldSpec<'_> {
    /// Non-nullable with no usable default.
    pub fn is_required(&self) -> bool {
        !self.nullable && self.default.is_none()
    }

    /// Dart type as declared on the field.
    pub fn declared_type(&self) -> String {
        if self.nullable {
            nullable(&self.dart_type)
        } else {
            self.dart_type.clone()
        }
    }
}

/// Resolve every column of `table`, in column order.
///
/// Field names are unique within the class, and enum names are unique
/// within the file and distinct from the class name.
pub fn resolve_fields<'a>(table: &'a TableDefinition, snapshot: &SchemaSnapshot) -> Vec<FieldSpec<'a>> {
    let names = unique_names(table.columns.iter().map(|c| column_to_field_name(&c.name)));
    let mut enum_names = EnumNames::new(&table_to_class_name(&table.name));
    table
        .columns
        .iter()
        .zip(names)
        .map(|(col, name)| {
            let enum_type = enum_override(col, table, snapshot).map(|e| enum_names.assign(e));
            resolve_field(col, name, enum_type, table)
        })
        .collect()
}

/// Hands out enum type names for one model file. The same enum used by
/// several columns keeps a single name; different enums that would share
/// one get a numeric suffix.
struct EnumNames {
    used: HashSet<String>,
    assigned: Vec<(EnumSpec, String)>,
}

impl EnumNames {
    fn new(class_name: &str) -> Self {
        Self {
            used: HashSet::from([class_name.to_string()]),
            assigned: Vec::new(),
        }
    }

    fn assign(&mut self, mut spec: EnumSpec) -> EnumSpec {
        let name = match self.assigned.iter().find(|(seen, _)| *seen == spec) {
            Some((_, name)) => name.clone(),
            None => {
                let name = claim_name(&spec.type_name, &mut self.used);
                self.assigned.push((spec.clone(), name.clone()));
                name
            }
        };
        spec.type_name = name;
        spec
    }
}

fn resolve_field<'a>(
    col: &'a ColumnDefinition,
    name: String,
    enum_type: Option<EnumSpec>,
    table: &TableDefinition,
) -> FieldSpec<'a> {
    let target = map_column(col);

    let mapped = map_dart_type(&target);
    let (dart_type, import) = match &enum_type {
        Some(e) if matches!(target, TargetType::List(_)) => (format!("List<{}>", e.type_name), None),
        Some(e) => (e.type_name.clone(), None),
        None => (mapped.dart_type, mapped.import),
    };

    let default = if col.is_nullable {
        None
    } else {
        col.default_literal
            .as_deref()
            .and_then(|d| resolve_default(d, &target, enum_type.as_ref()))
    };

    FieldSpec {
        name,
        nullable: col.is_nullable,
        primary_key: is_primary_key_column(&col.name, table),
        references: get_foreign_key_for_column(&col.name, &table.constraints)
            .map(|(t, c)| (t.to_string(), c.to_string())),
        unique: has_unique_constraint(&col.name, &table.constraints),
        column: col,
        target,
        enum_type,
        dart_type,
        import,
        default,
    }
}

/// A CHECK-derived enum wins over a native catalog enum.
fn enum_override(
    col: &ColumnDefinition,
    table: &TableDefinition,
    snapshot: &SchemaSnapshot,
) -> Option<EnumSpec> {
    if let Some(check) = check_enum_for_column(&col.name, table) {
        return Some(EnumSpec::new(
            check_enum_type_name(&col.name),
            check.values,
            format!("Allowed values of `{}.{}`.", table.name, col.name),
        ));
    }

    let enum_name = if col.is_user_defined() {
        col.udt_name.as_str()
    } else {
        match split_array(&col.declared_type) {
            (base, true) => base,
            _ => return None,
        }
    };
    snapshot.find_enum(enum_name).map(|e| {
        EnumSpec::new(
            enum_type_name(&e.name),
            e.values.clone(),
            format!("Values of the `{}` enum type.", e.name),
        )
    })
}

fn resolve_default(
    literal: &str,
    target: &TargetType,
    enum_type: Option<&EnumSpec>,
) -> Option<FieldDefault> {
    match (translate_default(literal, target), enum_type) {
        (DefaultValue::Now, _) => Some(FieldDefault::Now),
        (DefaultValue::Text(value), Some(e)) => e
            .member_for(&value)
            .map(|member| FieldDefault::Literal(format!("{}.{member}", e.type_name))),
        (_, Some(_)) => None,
        (DefaultValue::Text(value), None) => Some(FieldDefault::Literal(dart_string(&value))),
        (DefaultValue::Integer(n), None) => Some(FieldDefault::Literal(n.to_string())),
        (DefaultValue::Double(text), None) => Some(FieldDefault::Literal(text)),
        (DefaultValue::Boolean(b), None) => Some(FieldDefault::Literal(b.to_string())),
        (DefaultValue::Sequence | DefaultValue::Unrecognized, None) => None,
    }
}

/// Single-quoted Dart string literal.
pub fn dart_string(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('\'');
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '$' => out.push_str("\\$"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out.push('\'');
    out
}
