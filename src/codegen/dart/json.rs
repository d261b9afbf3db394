//! `fromJson`/`toJson` expressions and the private helpers they call.

use std::collections::BTreeSet;

use super::fields::FieldSpec;
use crate::typemap::TargetType;

/// A private top-level function a model file may need.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Helper {
    ParseInt,
    ParseDouble,
    ParseBool,
    ParseDateTime,
    ParseBytes,
    EncodeBytes,
    DeepEquals,
    DeepHash,
}

impl Helper {
    pub fn source(self) -> &'static str {
        match self {
            Helper::ParseInt => PARSE_INT,
            Helper::ParseDouble => PARSE_DOUBLE,
            Helper::ParseBool => PARSE_BOOL,
            Helper::ParseDateTime => PARSE_DATE_TIME,
            Helper::ParseBytes => PARSE_BYTES,
            Helper::EncodeBytes => ENCODE_BYTES,
            Helper::DeepEquals => DEEP_EQUALS,
            Helper::DeepHash => DEEP_HASH,
        }
    }

    pub fn needs_typed_data(self) -> bool {
        matches!(self, Helper::ParseBytes | Helper::EncodeBytes)
    }
}

pub type Helpers = BTreeSet<Helper>;

/// Expression reading `json['<column>']` into the field's type.
pub fn decode_field(field: &FieldSpec, helpers: &mut Helpers) -> String {
    let raw = format!("json['{}']", escape_key(&field.column.name));
    let decoded = decode_value(&field.target, field.enum_type.as_ref().map(|e| e.type_name.as_str()), &raw, helpers);

    if let Some(default) = &field.default {
        return format!("{raw} == null ? {} : {decoded}", default.expr());
    }
    if field.nullable && decoded != raw {
        return format!("{raw} == null ? null : {decoded}");
    }
    decoded
}

fn decode_value(target: &TargetType, enum_type: Option<&str>, expr: &str, helpers: &mut Helpers) -> String {
    if let TargetType::List(inner) = target {
        let element = decode_value(inner, enum_type, "e", helpers);
        return format!("({expr} as List).map((e) => {element}).toList()");
    }
    if let Some(enum_type) = enum_type {
        return format!("{enum_type}.fromValue({expr} as String)");
    }
    match target {
        TargetType::Integer => call(Helper::ParseInt, "_parseInt", expr, helpers),
        TargetType::Double => call(Helper::ParseDouble, "_parseDouble", expr, helpers),
        TargetType::Boolean => call(Helper::ParseBool, "_parseBool", expr, helpers),
        TargetType::DateTime => call(Helper::ParseDateTime, "_parseDateTime", expr, helpers),
        TargetType::ByteSequence => call(Helper::ParseBytes, "_parseBytes", expr, helpers),
        TargetType::Text | TargetType::TimeOfDay => format!("{expr}.toString()"),
        TargetType::JsonObject => format!("Map<String, dynamic>.from({expr} as Map)"),
        TargetType::UnknownDynamic | TargetType::List(_) => expr.to_string(),
    }
}

fn call(helper: Helper, name: &str, expr: &str, helpers: &mut Helpers) -> String {
    helpers.insert(helper);
    format!("{name}({expr})")
}

/// Expression writing the field into a JSON-compatible value.
pub fn encode_field(field: &FieldSpec, helpers: &mut Helpers) -> String {
    encode_value(
        &field.target,
        field.enum_type.is_some(),
        &field.name,
        field.nullable,
        helpers,
    )
}

fn encode_value(
    target: &TargetType,
    is_enum: bool,
    expr: &str,
    nullable: bool,
    helpers: &mut Helpers,
) -> String {
    let q = if nullable { "?" } else { "" };
    if let TargetType::List(inner) = target {
        if !needs_encoding(inner, is_enum) {
            return expr.to_string();
        }
        let element = encode_value(inner, is_enum, "e", false, helpers);
        return format!("{expr}{q}.map((e) => {element}).toList()");
    }
    if is_enum {
        return format!("{expr}{q}.value");
    }
    match target {
        TargetType::DateTime => format!("{expr}{q}.toIso8601String()"),
        TargetType::ByteSequence => {
            helpers.insert(Helper::EncodeBytes);
            if nullable {
                format!("{expr} == null ? null : _encodeBytes({expr}!)")
            } else {
                format!("_encodeBytes({expr})")
            }
        }
        _ => expr.to_string(),
    }
}

fn needs_encoding(target: &TargetType, is_enum: bool) -> bool {
    is_enum
        || match target {
            TargetType::DateTime | TargetType::ByteSequence => true,
            TargetType::List(inner) => needs_encoding(inner, false),
            _ => false,
        }
}

/// Fields whose `==` is identity for Dart collections.
pub fn needs_deep_equality(target: &TargetType) -> bool {
    matches!(
        target,
        TargetType::List(_)
            | TargetType::JsonObject
            | TargetType::ByteSequence
            | TargetType::UnknownDynamic
    )
}

fn escape_key(key: &str) -> String {
    key.replace('\\', "\\\\")
        .replace('\'', "\\'")
        .replace('$', "\\$")
}

const PARSE_INT: &str = r#"int _parseInt(dynamic value) {
  if (value is int) return value;
  if (value is num) return value.toInt();
  if (value is String) {
    return int.tryParse(value) ?? double.tryParse(value)?.toInt() ?? 0;
  }
  return 0;
}"#;

const PARSE_DOUBLE: &str = r#"double _parseDouble(dynamic value) {
  if (value is num) return value.toDouble();
  if (value is String) return double.tryParse(value) ?? 0.0;
  return 0.0;
}"#;

const PARSE_BOOL: &str = r#"bool _parseBool(dynamic value) {
  if (value is bool) return value;
  if (value is num) return value != 0;
  if (value is String) return value.toLowerCase() == 'true' || value == '1';
  return false;
}"#;

const PARSE_DATE_TIME: &str = r#"DateTime _parseDateTime(dynamic value) {
  if (value is DateTime) return value;
  if (value is String) {
    return DateTime.tryParse(value) ?? DateTime.fromMillisecondsSinceEpoch(0);
  }
  if (value is int) return DateTime.fromMillisecondsSinceEpoch(value * 1000);
  return DateTime.fromMillisecondsSinceEpoch(0);
}"#;

const PARSE_BYTES: &str = r#"Uint8List _parseBytes(dynamic value) {
  if (value is Uint8List) return value;
  if (value is List) return Uint8List.fromList(value.cast<int>());
  if (value is String && value.startsWith('\\x')) {
    final hex = value.substring(2);
    final bytes = Uint8List(hex.length ~/ 2);
    for (var i = 0; i < bytes.length; i++) {
      bytes[i] = int.parse(hex.substring(i * 2, i * 2 + 2), radix: 16);
    }
    return bytes;
  }
  return Uint8List(0);
}"#;

const ENCODE_BYTES: &str = r#"String _encodeBytes(Uint8List bytes) {
  final buffer = StringBuffer('\\x');
  for (final b in bytes) {
    buffer.write(b.toRadixString(16).padLeft(2, '0'));
  }
  return buffer.toString();
}"#;

const DEEP_EQUALS: &str = r#"bool _deepEquals(Object? a, Object? b) {
  if (identical(a, b)) return true;
  if (a is List && b is List) {
    if (a.length != b.length) return false;
    for (var i = 0; i < a.length; i++) {
      if (!_deepEquals(a[i], b[i])) return false;
    }
    return true;
  }
  if (a is Map && b is Map) {
    if (a.length != b.length) return false;
    for (final key in a.keys) {
      if (!b.containsKey(key) || !_deepEquals(a[key], b[key])) return false;
    }
    return true;
  }
  return a == b;
}"#;

const DEEP_HASH: &str = r#"int _deepHash(Object? value) {
  if (value is List) return Object.hashAll(value.map(_deepHash));
  if (value is Map) {
    return Object.hashAllUnordered(
      value.entries.map((e) => Object.hash(e.key, _deepHash(e.value))),
    );
  }
  return value.hashCode;
}"#;
