use super::TargetType;

/// The result of mapping a target type to its Dart representation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappedType {
    /// Dart type annotation without nullability (e.g. "int", "List<String>").
    pub dart_type: String,
    /// Library the type has to be imported from, if not `dart:core`.
    pub import: Option<&'static str>,
}

pub fn map_dart_type(target: &TargetType) -> MappedType {
    match target {
        TargetType::Integer => simple("int"),
        TargetType::Double => simple("double"),
        TargetType::Boolean => simple("bool"),
        TargetType::DateTime => simple("DateTime"),
        // No time-of-day type in dart:core; carried as "HH:MM:SS" text.
        TargetType::TimeOfDay => simple("String"),
        TargetType::Text => simple("String"),
        TargetType::JsonObject => simple("Map<String, dynamic>"),
        TargetType::ByteSequence => MappedType {
            dart_type: "Uint8List".to_string(),
            import: Some("dart:typed_data"),
        },
        TargetType::UnknownDynamic => simple("dynamic"),
        TargetType::List(inner) => {
            let element = map_dart_type(inner);
            MappedType {
                dart_type: format!("List<{}>", element.dart_type),
                import: element.import,
            }
        }
    }
}

/// Append `?` unless the type is already nullable (`dynamic`).
pub fn nullable(dart_type: &str) -> String {
    if dart_type == "dynamic" {
        dart_type.to_string()
    } else {
        format!("{dart_type}?")
    }
}

fn simple(dart_type: &str) -> MappedType {
    MappedType {
        dart_type: dart_type.to_string(),
        import: None,
    }
}
