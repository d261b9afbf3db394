use std::path::PathBuf;

use thiserror::Error;

/// Failure talking to the catalog provider.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Failed to fetch {what} for table {table}: {source}")]
    Query {
        what: &'static str,
        table: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("Catalog provider error: {0}")]
    Other(String),
}

impl ProviderError {
    pub fn query(what: &'static str, table: impl Into<String>, source: sqlx::Error) -> Self {
        ProviderError::Query {
            what,
            table: table.into(),
            source,
        }
    }
}

/// Empty or inconsistent catalog data.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum BuildError {
    #[error("No tables to export after filtering")]
    NoTables,

    #[error("Table {table} reports column {column} more than once")]
    DuplicateColumn { table: String, column: String },

    #[error("Table {table} has more than one primary key ({first}, {second})")]
    MultiplePrimaryKeys {
        table: String,
        first: String,
        second: String,
    },

    #[error("Foreign key {constraint} on table {table} is missing its referenced table or column")]
    IncompleteForeignKey { table: String, constraint: String },

    #[error("Check constraint {constraint} on table {table} has no clause")]
    MissingCheckClause { table: String, constraint: String },

    #[error("Unknown referential action '{action}' on {constraint} (table {table})")]
    UnknownReferentialAction {
        table: String,
        constraint: String,
        action: String,
    },
}

/// A value or table that could not be rendered safely.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum RenderError {
    #[error("Table {table} has no columns to insert into")]
    NoColumns { table: String },

    #[error("Value for {table}.{column} cannot be rendered: {reason}")]
    Unescapable {
        table: String,
        column: String,
        reason: String,
    },
}

#[derive(Error, Debug)]
pub enum WriteError {
    #[error("Failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Error, Debug)]
pub enum ExportError {
    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Build(#[from] BuildError),

    #[error(transparent)]
    Write(#[from] WriteError),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Unsupported URL scheme: {0}")]
    UnsupportedScheme(String),
}

impl ExportError {
    /// Pipeline stage the error came from, for the failure summary.
    pub fn stage(&self) -> &'static str {
        match self {
            ExportError::Provider(_) => "fetch",
            ExportError::Build(_) => "build",
            ExportError::Write(_) => "write",
            ExportError::Connection(_) | ExportError::UnsupportedScheme(_) => "connect",
        }
    }
}
