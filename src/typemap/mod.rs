pub mod dart;

use crate::schema::ColumnDefinition;

/// Language-neutral field type a column maps to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetType {
    Integer,
    Double,
    Boolean,
    DateTime,
    TimeOfDay,
    Text,
    JsonObject,
    ByteSequence,
    UnknownDynamic,
    List(Box<TargetType>),
}

/// Map a column to its target type.
pub fn map_column(col: &ColumnDefinition) -> TargetType {
    let (base, is_array) = split_array(&col.declared_type);
    map_type(base, is_array)
}

/// Map a declared catalog type. Never fails: unknown types degrade to
/// [`TargetType::UnknownDynamic`].
pub fn map_type(declared_type: &str, is_array: bool) -> TargetType {
    let (base, nested_array) = split_array(declared_type);
    let scalar = map_scalar(base);
    if is_array || nested_array {
        TargetType::List(Box::new(scalar))
    } else {
        scalar
    }
}

/// Split array spellings: `integer[]`, `ARRAY[integer]` and udt-style `_int4`.
pub fn split_array(declared_type: &str) -> (&str, bool) {
    let t = declared_type.trim();
    if let Some(base) = t.strip_suffix("[]") {
        return (base.trim(), true);
    }
    let array_prefix = t
        .get(..6)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("ARRAY["));
    if array_prefix && t.len() > 7 && t.ends_with(']') {
        return (t[6..t.len() - 1].trim(), true);
    }
    if let Some(base) = t.strip_prefix('_') {
        return (base, true);
    }
    (t, false)
}

fn map_scalar(declared: &str) -> TargetType {
    let lower = declared.to_ascii_lowercase();
    // Drop a length/precision suffix: "numeric(10,2)" -> "numeric"
    let name = match lower.find('(') {
        Some(pos) => lower[..pos].trim_end(),
        None => lower.as_str(),
    };

    match name {
        "smallint" | "integer" | "bigint" | "int" | "int2" | "int4" | "int8" | "smallserial"
        | "serial" | "bigserial" | "serial2" | "serial4" | "serial8" => TargetType::Integer,
        "numeric" | "decimal" | "real" | "double precision" | "float4" | "float8" | "money" => {
            TargetType::Double
        }
        "boolean" | "bool" => TargetType::Boolean,
        "json" | "jsonb" => TargetType::JsonObject,
        "uuid" | "text" | "character varying" | "varchar" | "character" | "char" | "bpchar"
        | "citext" | "name" => TargetType::Text,
        "bytea" => TargetType::ByteSequence,
        "user-defined" => TargetType::Text,
        "date" => TargetType::DateTime,
        n if n.starts_with("timestamp") => TargetType::DateTime,
        n if n.starts_with("time") => TargetType::TimeOfDay,
        _ => TargetType::UnknownDynamic,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::test_column;

    fn col(declared: &str) -> ColumnDefinition {
        ColumnDefinition {
            declared_type: declared.to_string(),
            ..test_column("test")
        }
    }

    #[test]
    fn test_integer_types() {
        for t in ["smallint", "integer", "bigint", "serial", "bigserial", "INTEGER"] {
            assert_eq!(map_type(t, false), TargetType::Integer, "{t}");
        }
    }

    #[test]
    fn test_float_types() {
        for t in ["numeric", "decimal", "real", "double precision", "float4", "float8"] {
            assert_eq!(map_type(t, false), TargetType::Double, "{t}");
        }
        assert_eq!(map_type("numeric(10,2)", false), TargetType::Double);
    }

    #[test]
    fn test_datetime_types() {
        assert_eq!(map_type("timestamp", false), TargetType::DateTime);
        assert_eq!(
            map_type("timestamp with time zone", false),
            TargetType::DateTime
        );
        assert_eq!(map_type("date", false), TargetType::DateTime);
        assert_eq!(
            map_type("time without time zone", false),
            TargetType::TimeOfDay
        );
        assert_eq!(map_type("timetz", false), TargetType::TimeOfDay);
    }

    #[test]
    fn test_text_json_bytes() {
        for t in ["uuid", "text", "character varying", "varchar", "character", "char"] {
            assert_eq!(map_type(t, false), TargetType::Text, "{t}");
        }
        assert_eq!(map_type("json", false), TargetType::JsonObject);
        assert_eq!(map_type("jsonb", false), TargetType::JsonObject);
        assert_eq!(map_type("bytea", false), TargetType::ByteSequence);
        assert_eq!(map_type("boolean", false), TargetType::Boolean);
    }

    #[test]
    fn test_user_defined_and_unknown() {
        assert_eq!(map_type("USER-DEFINED", false), TargetType::Text);
        assert_eq!(map_type("tsvector", false), TargetType::UnknownDynamic);
        assert_eq!(map_type("interval", false), TargetType::UnknownDynamic);
    }

    #[test]
    fn test_array_spellings() {
        let ints = TargetType::List(Box::new(TargetType::Integer));
        assert_eq!(map_column(&col("integer[]")), ints);
        assert_eq!(map_type("ARRAY[integer]", false), ints);
        assert_eq!(map_type("_int4", false), ints);
        assert_eq!(map_type("integer", true), ints);
        assert_eq!(
            map_column(&col("text[]")),
            TargetType::List(Box::new(TargetType::Text))
        );
    }
}
