use std::fmt;

/// The canonical schema model built once per export run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchemaSnapshot {
    pub enums: Vec<EnumType>,
    pub tables: Vec<TableDefinition>,
    pub functions: Vec<FunctionDefinition>,
    pub triggers: Vec<TriggerDefinition>,
}

impl SchemaSnapshot {
    pub fn find_enum(&self, name: &str) -> Option<&EnumType> {
        self.enums.iter().find(|e| e.name == name)
    }
}

/// A native catalog enum.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumType {
    pub name: String,
    pub values: Vec<String>,
}

/// Metadata for a single table.
#[derive(Debug, Clone, PartialEq)]
pub struct TableDefinition {
    pub name: String,
    pub columns: Vec<ColumnDefinition>,
    pub constraints: Vec<ConstraintDefinition>,
    pub indexes: Vec<IndexDefinition>,
}

impl TableDefinition {
    pub fn primary_key(&self) -> Option<&ConstraintDefinition> {
        self.constraints
            .iter()
            .find(|c| c.kind == ConstraintKind::PrimaryKey)
    }
}

/// Metadata for a single column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDefinition {
    pub name: String,
    /// Physical type as reported by the catalog, `<element>[]` for arrays.
    pub declared_type: String,
    /// Underlying catalog type name (the enum name for `USER-DEFINED` columns).
    pub udt_name: String,
    pub character_max_length: Option<i32>,
    pub numeric_precision: Option<i32>,
    pub numeric_scale: Option<i32>,
    pub is_nullable: bool,
    pub default_literal: Option<String>,
}

impl ColumnDefinition {
    pub fn is_user_defined(&self) -> bool {
        self.declared_type.eq_ignore_ascii_case("USER-DEFINED")
    }
}

/// A table constraint. CHECK constraints carry no columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstraintDefinition {
    pub name: String,
    pub columns: Vec<String>,
    pub kind: ConstraintKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConstraintKind {
    PrimaryKey,
    Unique,
    Check {
        clause: String,
    },
    ForeignKey {
        referenced_table: String,
        referenced_columns: Vec<String>,
        on_update: ReferentialAction,
        on_delete: ReferentialAction,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferentialAction {
    Cascade,
    SetNull,
    SetDefault,
    Restrict,
    NoAction,
}

impl ReferentialAction {
    /// Parse the catalog spelling (`CASCADE`, `SET NULL`, `NO ACTION`, ...).
    pub fn parse(raw: &str) -> Option<Self> {
        let normalized = raw.trim().replace('_', " ").to_ascii_uppercase();
        match normalized.as_str() {
            "CASCADE" => Some(ReferentialAction::Cascade),
            "SET NULL" => Some(ReferentialAction::SetNull),
            "SET DEFAULT" => Some(ReferentialAction::SetDefault),
            "RESTRICT" => Some(ReferentialAction::Restrict),
            "NO ACTION" => Some(ReferentialAction::NoAction),
            _ => None,
        }
    }

    pub fn as_sql(&self) -> &'static str {
        match self {
            ReferentialAction::Cascade => "CASCADE",
            ReferentialAction::SetNull => "SET NULL",
            ReferentialAction::SetDefault => "SET DEFAULT",
            ReferentialAction::Restrict => "RESTRICT",
            ReferentialAction::NoAction => "NO ACTION",
        }
    }
}

impl fmt::Display for ReferentialAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// Metadata for a database index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexDefinition {
    pub name: String,
    pub definition_text: String,
    pub is_primary: bool,
    pub is_unique: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionDefinition {
    pub name: String,
    pub definition_text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerDefinition {
    pub name: String,
    pub table: String,
    pub definition_text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_referential_action_spellings() {
        assert_eq!(
            ReferentialAction::parse("CASCADE"),
            Some(ReferentialAction::Cascade)
        );
        assert_eq!(
            ReferentialAction::parse("set null"),
            Some(ReferentialAction::SetNull)
        );
        assert_eq!(
            ReferentialAction::parse("NO_ACTION"),
            Some(ReferentialAction::NoAction)
        );
        assert_eq!(ReferentialAction::parse("EXPLODE"), None);
        assert_eq!(ReferentialAction::SetDefault.to_string(), "SET DEFAULT");
    }
}
