//! Dart model classes, one file per table.

mod fields;
mod json;

use indexmap::IndexMap;

use self::fields::{dart_string, resolve_fields, EnumSpec, FieldDefault, FieldSpec};
use self::json::{decode_field, encode_field, needs_deep_equality, Helper, Helpers};
use crate::codegen::imports::ImportCollector;
use crate::codegen::{GeneratedFile, Generator};
use crate::config::GeneratorOptions;
use crate::naming::table_to_class_name;
use crate::schema::{SchemaSnapshot, TableDefinition};
use crate::typemap::dart::nullable;

/// Positional-argument limit of `Object.hash`.
const OBJECT_HASH_MAX_ARGS: usize = 20;

pub struct DartModelGenerator {
    pub options: GeneratorOptions,
}

impl Generator for DartModelGenerator {
    fn generate(&self, snapshot: &SchemaSnapshot) -> Vec<GeneratedFile> {
        snapshot
            .tables
            .iter()
            .map(|table| {
                GeneratedFile::new(
                    model_file_name(&table.name),
                    render_model(table, snapshot, &self.options),
                )
            })
            .collect()
    }
}

/// `<table>.dart`, with characters unsafe in file names replaced.
pub fn model_file_name(table: &str) -> String {
    let safe: String = table
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    format!("{safe}.dart")
}

/// Render the model source for one table.
pub fn render_model(table: &TableDefinition, snapshot: &SchemaSnapshot, options: &GeneratorOptions) -> String {
    let class_name = table_to_class_name(&table.name);
    let fields = resolve_fields(table, snapshot);
    let mut helpers = Helpers::new();

    let mut sections: Vec<String> = Vec::new();

    let mut enums: IndexMap<&str, &EnumSpec> = IndexMap::new();
    for spec in fields.iter().filter_map(|f| f.enum_type.as_ref()) {
        enums.entry(spec.type_name.as_str()).or_insert(spec);
    }
    for spec in enums.values() {
        sections.push(render_enum(spec, options));
    }

    sections.push(render_class(&class_name, table, &fields, options, &mut helpers));

    for helper in &helpers {
        sections.push(helper.source().to_string());
    }

    let mut imports = ImportCollector::new();
    for import in fields.iter().filter_map(|f| f.import) {
        imports.add(import);
    }
    if helpers.iter().any(|h| h.needs_typed_data()) {
        imports.add("dart:typed_data");
    }

    let mut out = String::from("// Generated by pgexport. Do not edit by hand.\n\n");
    if !imports.is_empty() {
        out.push_str(&imports.render());
        out.push_str("\n\n");
    }
    out.push_str(&sections.join("\n\n"));
    out.push('\n');
    out
}

fn render_enum(spec: &EnumSpec, options: &GeneratorOptions) -> String {
    let mut lines = Vec::new();
    if options.docs {
        lines.push(format!("/// {}", spec.origin));
    }
    lines.push(format!("enum {} {{", spec.type_name));
    let members: Vec<String> = spec
        .members
        .iter()
        .zip(&spec.values)
        .map(|(member, value)| format!("  {member}({})", dart_string(value)))
        .collect();
    if members.is_empty() {
        // Dart enums need at least one member.
        lines.push("  unknown('');".to_string());
    } else {
        lines.push(format!("{};", members.join(",\n")));
    }
    lines.push(String::new());
    lines.push(format!("  const {}(this.value);", spec.type_name));
    lines.push(String::new());
    lines.push("  final String value;".to_string());
    lines.push(String::new());
    lines.push(format!("  static {} fromValue(String value) {{", spec.type_name));
    lines.push("    for (final member in values) {".to_string());
    lines.push("      if (member.value == value) return member;".to_string());
    lines.push("    }".to_string());
    lines.push(format!(
        "    throw ArgumentError.value(value, 'value', 'Unknown {}');",
        spec.type_name
    ));
    lines.push("  }".to_string());
    lines.push("}".to_string());
    lines.join("\n")
}

fn render_class(
    class_name: &str,
    table: &TableDefinition,
    fields: &[FieldSpec],
    options: &GeneratorOptions,
    helpers: &mut Helpers,
) -> String {
    let mut blocks: Vec<String> = Vec::new();

    // Fields
    let field_lines: Vec<String> = fields
        .iter()
        .map(|f| {
            let mut lines = if options.docs { field_docs(f) } else { Vec::new() };
            lines.push(format!("  final {} {};", f.declared_type(), f.name));
            lines.join("\n")
        })
        .collect();
    if !field_lines.is_empty() {
        blocks.push(field_lines.join("\n\n"));
    }

    blocks.push(render_constructor(class_name, fields));
    blocks.push(render_from_json(class_name, fields, helpers));
    blocks.push(render_to_json(fields, helpers));
    if options.copy_with {
        blocks.push(render_copy_with(class_name, fields));
    }
    if options.equality_and_hash {
        blocks.push(render_equality(class_name, fields, helpers));
    }
    blocks.push(render_to_string(class_name, fields));

    let mut out = String::new();
    if options.docs {
        out.push_str(&format!("/// Row of the `{}` table.\n", table.name));
    }
    out.push_str(&format!("class {class_name} {{\n"));
    out.push_str(&blocks.join("\n\n"));
    out.push_str("\n}");
    out
}

fn field_docs(f: &FieldSpec) -> Vec<String> {
    let mut docs = Vec::new();
    if f.primary_key {
        docs.push("  /// Primary key.".to_string());
    }
    if let Some((table, column)) = &f.references {
        docs.push(format!("  /// References `{table}({column})`."));
    }
    if f.unique {
        docs.push("  /// Unique.".to_string());
    }
    if let Some(default) = &f.column.default_literal {
        docs.push(format!("  /// Defaults to `{default}`."));
    }
    docs
}

fn render_constructor(class_name: &str, fields: &[FieldSpec]) -> String {
    if fields.is_empty() {
        return format!("  const {class_name}();");
    }
    let mut params = Vec::new();
    let mut initializers = Vec::new();
    for f in fields {
        match &f.default {
            Some(FieldDefault::Now) => {
                params.push(format!("    {} {},", nullable(&f.dart_type), f.name));
                initializers.push(format!("{0} = {0} ?? DateTime.now()", f.name));
            }
            Some(FieldDefault::Literal(expr)) => params.push(format!("    this.{} = {expr},", f.name)),
            None if f.is_required() => params.push(format!("    required this.{},", f.name)),
            None => params.push(format!("    this.{},", f.name)),
        }
    }
    let mut out = format!("  {class_name}({{\n{}\n  }})", params.join("\n"));
    if !initializers.is_empty() {
        out.push_str(&format!(" : {}", initializers.join(",\n        ")));
    }
    out.push(';');
    out
}

fn render_from_json(class_name: &str, fields: &[FieldSpec], helpers: &mut Helpers) -> String {
    let args: Vec<String> = fields
        .iter()
        .map(|f| format!("      {}: {},", f.name, decode_field(f, helpers)))
        .collect();
    let mut out = format!("  factory {class_name}.fromJson(Map<String, dynamic> json) {{\n");
    if args.is_empty() {
        out.push_str(&format!("    return {class_name}();\n"));
    } else {
        out.push_str(&format!("    return {class_name}(\n{}\n    );\n", args.join("\n")));
    }
    out.push_str("  }");
    out
}

fn render_to_json(fields: &[FieldSpec], helpers: &mut Helpers) -> String {
    let entries: Vec<String> = fields
        .iter()
        .map(|f| {
            format!(
                "      {}: {},",
                dart_string(&f.column.name),
                encode_field(f, helpers)
            )
        })
        .collect();
    if entries.is_empty() {
        return "  Map<String, dynamic> toJson() => <String, dynamic>{};".to_string();
    }
    format!(
        "  Map<String, dynamic> toJson() {{\n    return <String, dynamic>{{\n{}\n    }};\n  }}",
        entries.join("\n")
    )
}

fn render_copy_with(class_name: &str, fields: &[FieldSpec]) -> String {
    if fields.is_empty() {
        return format!("  {class_name} copyWith() => {class_name}();");
    }
    let params: Vec<String> = fields
        .iter()
        .map(|f| format!("    {} {},", nullable(&f.dart_type), f.name))
        .collect();
    let args: Vec<String> = fields
        .iter()
        .map(|f| format!("      {0}: {0} ?? this.{0},", f.name))
        .collect();
    format!(
        "  {class_name} copyWith({{\n{}\n  }}) {{\n    return {class_name}(\n{}\n    );\n  }}",
        params.join("\n"),
        args.join("\n")
    )
}

fn render_equality(class_name: &str, fields: &[FieldSpec], helpers: &mut Helpers) -> String {
    let mut comparisons = vec![format!("other is {class_name}")];
    let mut hash_terms = Vec::new();
    for f in fields {
        if needs_deep_equality(&f.target) {
            helpers.insert(Helper::DeepEquals);
            helpers.insert(Helper::DeepHash);
            comparisons.push(format!("_deepEquals(other.{0}, {0})", f.name));
            hash_terms.push(format!("_deepHash({})", f.name));
        } else {
            comparisons.push(format!("other.{0} == {0}", f.name));
            hash_terms.push(f.name.clone());
        }
    }

    let hash = match hash_terms.len() {
        0 => "0".to_string(),
        1 if hash_terms[0] == fields[0].name => format!("{}.hashCode", hash_terms[0]),
        1 => hash_terms[0].clone(),
        n if n <= OBJECT_HASH_MAX_ARGS => format!("Object.hash({})", hash_terms.join(", ")),
        _ => format!("Object.hashAll([{}])", hash_terms.join(", ")),
    };

    format!(
        "  @override\n  bool operator ==(Object other) {{\n    if (identical(this, other)) return true;\n    return {};\n  }}\n\n  @override\n  int get hashCode => {hash};",
        comparisons.join(" &&\n        ")
    )
}

fn render_to_string(class_name: &str, fields: &[FieldSpec]) -> String {
    let parts: Vec<String> = fields
        .iter()
        .map(|f| format!("{0}: ${0}", f.name))
        .collect();
    format!(
        "  @override\n  String toString() => '{class_name}({})';",
        parts.join(", ")
    )
}

#[cfg(test)]
mod tests {
    use indoc::indoc;

    use super::*;
    use crate::schema::{ColumnDefinition, ConstraintDefinition, ConstraintKind};
    use crate::testutil::{test_column, users_snapshot};

    fn render_users(options: &GeneratorOptions) -> String {
        let snapshot = users_snapshot();
        render_model(&snapshot.tables[0], &snapshot, options)
    }

    #[test]
    fn test_users_model() {
        let expected = indoc! {r#"
            // Generated by pgexport. Do not edit by hand.

            /// Row of the `users` table.
            class Users {
              /// Primary key.
              final int id;

              final String? email;

              /// Defaults to `now()`.
              final DateTime createdAt;

              Users({
                required this.id,
                this.email,
                DateTime? createdAt,
              }) : createdAt = createdAt ?? DateTime.now();

              factory Users.fromJson(Map<String, dynamic> json) {
                return Users(
                  id: _parseInt(json['id']),
                  email: json['email'] == null ? null : json['email'].toString(),
                  createdAt: json['created_at'] == null ? DateTime.now() : _parseDateTime(json['created_at']),
                );
              }

              Map<String, dynamic> toJson() {
                return <String, dynamic>{
                  'id': id,
                  'email': email,
                  'created_at': createdAt.toIso8601String(),
                };
              }

              Users copyWith({
                int? id,
                String? email,
                DateTime? createdAt,
              }) {
                return Users(
                  id: id ?? this.id,
                  email: email ?? this.email,
                  createdAt: createdAt ?? this.createdAt,
                );
              }

              @override
              bool operator ==(Object other) {
                if (identical(this, other)) return true;
                return other is Users &&
                    other.id == id &&
                    other.email == email &&
                    other.createdAt == createdAt;
              }

              @override
              int get hashCode => Object.hash(id, email, createdAt);

              @override
              String toString() => 'Users(id: $id, email: $email, createdAt: $createdAt)';
            }

            int _parseInt(dynamic value) {
              if (value is int) return value;
              if (value is num) return value.toInt();
              if (value is String) {
                return int.tryParse(value) ?? double.tryParse(value)?.toInt() ?? 0;
              }
              return 0;
            }

            DateTime _parseDateTime(dynamic value) {
              if (value is DateTime) return value;
              if (value is String) {
                return DateTime.tryParse(value) ?? DateTime.fromMillisecondsSinceEpoch(0);
              }
              if (value is int) return DateTime.fromMillisecondsSinceEpoch(value * 1000);
              return DateTime.fromMillisecondsSinceEpoch(0);
            }
        "#};
        assert_eq!(render_users(&GeneratorOptions::default()), expected);
    }

    #[test]
    fn test_required_count_matches_columns() {
        let mut snapshot = users_snapshot();
        snapshot.tables[0].columns.extend([
            ColumnDefinition {
                default_literal: Some("42".to_string()),
                ..test_column("retries")
            },
            ColumnDefinition {
                default_literal: Some("nextval('users_seq_seq'::regclass)".to_string()),
                ..test_column("seq")
            },
            ColumnDefinition {
                declared_type: "text".to_string(),
                default_literal: Some("gen_random_uuid()".to_string()),
                ..test_column("token")
            },
        ]);
        let out = render_model(&snapshot.tables[0], &snapshot, &GeneratorOptions::default());
        // id, seq and token
        assert_eq!(out.matches("required this.").count(), 3);
        assert!(out.contains("    this.retries = 42,\n"));
        assert!(out.contains("required this.seq,"));
        assert!(out.contains("retries: json['retries'] == null ? 42 : _parseInt(json['retries']),"));
    }

    #[test]
    fn test_check_enum_declared_before_class() {
        let mut snapshot = users_snapshot();
        let users = &mut snapshot.tables[0];
        users.columns.push(ColumnDefinition {
            declared_type: "text".to_string(),
            udt_name: "text".to_string(),
            ..test_column("status")
        });
        users.constraints.push(ConstraintDefinition {
            name: "users_status_check".to_string(),
            columns: vec![],
            kind: ConstraintKind::Check {
                clause: "status = ANY (ARRAY['a','b'])".to_string(),
            },
        });
        let out = render_model(&snapshot.tables[0], &snapshot, &GeneratorOptions::default());
        let expected_enum = indoc! {"
            /// Allowed values of `users.status`.
            enum StatusType {
              a('a'),
              b('b');

              const StatusType(this.value);

              final String value;
        "};
        assert!(out.contains(expected_enum));
        assert!(out.find("enum StatusType").unwrap() < out.find("class Users").unwrap());
        assert!(out.contains("  final StatusType status;"));
        assert!(out.contains("status: StatusType.fromValue(json['status'] as String),"));
        assert!(out.contains("'status': status.value,"));
    }

    #[test]
    fn test_hash_all_above_twenty_fields() {
        let mut snapshot = users_snapshot();
        snapshot.tables[0].columns = (0..21).map(|i| test_column(&format!("c{i}"))).collect();
        let out = render_model(&snapshot.tables[0], &snapshot, &GeneratorOptions::default());
        assert!(out.contains("int get hashCode => Object.hashAll([c0, c1,"));

        snapshot.tables[0].columns.truncate(20);
        let out = render_model(&snapshot.tables[0], &snapshot, &GeneratorOptions::default());
        assert!(out.contains("int get hashCode => Object.hash(c0, c1,"));

        snapshot.tables[0].columns.truncate(1);
        let out = render_model(&snapshot.tables[0], &snapshot, &GeneratorOptions::default());
        assert!(out.contains("int get hashCode => c0.hashCode;"));
    }

    #[test]
    fn test_collections_use_deep_helpers() {
        let mut snapshot = users_snapshot();
        snapshot.tables[0].columns.push(ColumnDefinition {
            declared_type: "jsonb".to_string(),
            is_nullable: true,
            ..test_column("settings")
        });
        let out = render_model(&snapshot.tables[0], &snapshot, &GeneratorOptions::default());
        assert!(out.contains("_deepEquals(other.settings, settings)"));
        assert!(out.contains("Object.hash(id, email, createdAt, _deepHash(settings))"));
        assert!(out.contains("bool _deepEquals(Object? a, Object? b) {"));
        assert!(out.contains("int _deepHash(Object? value) {"));
    }

    #[test]
    fn test_bytes_import_typed_data() {
        let mut snapshot = users_snapshot();
        snapshot.tables[0].columns.push(ColumnDefinition {
            declared_type: "bytea".to_string(),
            is_nullable: true,
            ..test_column("avatar")
        });
        let out = render_model(&snapshot.tables[0], &snapshot, &GeneratorOptions::default());
        assert!(out.starts_with(
            "// Generated by pgexport. Do not edit by hand.\n\nimport 'dart:typed_data';\n\n"
        ));
        assert!(out.contains("  final Uint8List? avatar;"));
        assert!(out.contains("Uint8List _parseBytes(dynamic value) {"));
        assert!(out.contains("String _encodeBytes(Uint8List bytes) {"));
    }

    #[test]
    fn test_optional_members_can_be_disabled() {
        let options = GeneratorOptions {
            docs: false,
            equality_and_hash: false,
            copy_with: false,
        };
        let out = render_users(&options);
        assert!(!out.contains("///"));
        assert!(!out.contains("copyWith"));
        assert!(!out.contains("operator =="));
        assert!(!out.contains("hashCode"));
        assert!(out.contains("factory Users.fromJson"));
        assert!(out.contains("String toString()"));
    }

    #[test]
    fn test_generator_is_idempotent() {
        let snapshot = users_snapshot();
        let gen = DartModelGenerator {
            options: GeneratorOptions::default(),
        };
        let first = gen.generate(&snapshot);
        assert_eq!(first, gen.generate(&snapshot));
        assert_eq!(first[0].path.to_str(), Some("users.dart"));
    }
}
