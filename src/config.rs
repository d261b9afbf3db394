use std::path::PathBuf;

use crate::catalog::TableFilter;

/// Options for the Dart model generator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorOptions {
    /// Per-field and per-class doc comments.
    pub docs: bool,
    pub equality_and_hash: bool,
    pub copy_with: bool,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self {
            docs: true,
            equality_and_hash: true,
            copy_with: true,
        }
    }
}

/// Everything one export run needs to know.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportConfig {
    pub output_directory: PathBuf,
    /// Skip the data INSERT files.
    pub schema_only: bool,
    pub table_filter: Option<TableFilter>,
    pub generate_model_source: bool,
    pub model_output_directory: PathBuf,
    pub generator: GeneratorOptions,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_directory: PathBuf::from("export"),
            schema_only: false,
            table_filter: None,
            generate_model_source: false,
            model_output_directory: PathBuf::from("models"),
            generator: GeneratorOptions::default(),
        }
    }
}
