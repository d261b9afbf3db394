use std::collections::HashSet;

use heck::{ToLowerCamelCase, ToUpperCamelCase};

/// Dart reserved words and `Object` members a generated field must not shadow.
const DART_RESERVED: &[&str] = &[
    "assert", "await", "break", "case", "catch", "class", "const", "continue", "default", "do",
    "else", "enum", "extends", "false", "final", "finally", "for", "if", "in", "is", "new",
    "null", "rethrow", "return", "super", "switch", "this", "throw", "true", "try", "var",
    "void", "while", "with", "yield", "hashCode", "runtimeType", "toString", "toJson",
    "fromJson", "copyWith", "noSuchMethod",
];

/// Members every generated enum already has.
const ENUM_RESERVED: &[&str] = &["values", "index", "name", "value"];

/// Convert a table name to a PascalCase class name.
/// e.g. "user_profiles" -> "UserProfiles"
pub fn table_to_class_name(table_name: &str) -> String {
    let name = table_name.to_upper_camel_case();
    if starts_with_letter(&name) {
        name
    } else {
        format!("Table{name}")
    }
}

/// Convert a column name to a camelCase Dart field name.
/// e.g. "created_at" -> "createdAt", "class" -> "class_"
pub fn column_to_field_name(column_name: &str) -> String {
    let name = column_name.to_lower_camel_case();
    let name = if starts_with_letter(&name) {
        name
    } else {
        format!("f{}", name.to_upper_camel_case())
    };
    escape_reserved(name)
}

/// Name of the enum synthesized for a CHECK-constrained column.
/// e.g. "status" -> "StatusType"
pub fn check_enum_type_name(column_name: &str) -> String {
    format!("{}Type", table_to_class_name(column_name))
}

/// Name of the Dart enum generated for a native catalog enum.
pub fn enum_type_name(enum_name: &str) -> String {
    table_to_class_name(enum_name)
}

/// Convert enum literals to unique camelCase member names, in order.
/// e.g. ["in-progress", "done", "1st"] -> ["inProgress", "done", "value1st"]
pub fn enum_member_names(values: &[String]) -> Vec<String> {
    unique_names(values.iter().map(|v| enum_member_name(v)))
}

/// Suffix repeated names with 2, 3, ... so that every name is distinct.
pub fn unique_names(bases: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut used = HashSet::new();
    bases
        .into_iter()
        .map(|base| claim_name(&base, &mut used))
        .collect()
}

/// Claim `base`, or the first of `base2`, `base3`, ... not yet in `used`.
pub fn claim_name(base: &str, used: &mut HashSet<String>) -> String {
    let mut candidate = base.to_string();
    let mut n = 2;
    while !used.insert(candidate.clone()) {
        candidate = format!("{base}{n}");
        n += 1;
    }
    candidate
}

fn enum_member_name(value: &str) -> String {
    let name = value.to_lower_camel_case();
    if name.is_empty() {
        return "value".to_string();
    }
    if !starts_with_letter(&name) {
        return format!("value{}", name.to_upper_camel_case());
    }
    if ENUM_RESERVED.contains(&name.as_str()) {
        return format!("{name}_");
    }
    escape_reserved(name)
}

fn starts_with_letter(name: &str) -> bool {
    name.chars().next().is_some_and(|c| c.is_ascii_alphabetic())
}

fn escape_reserved(name: String) -> String {
    if DART_RESERVED.contains(&name.as_str()) {
        format!("{name}_")
    } else {
        name
    }
}
