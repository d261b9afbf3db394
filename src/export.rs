//! Runs one export: fetch, build, render, write.

use std::path::Path;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};

use crate::builder::{build, unmatched_filter_names};
use crate::catalog::CatalogProvider;
use crate::codegen::dart::DartModelGenerator;
use crate::codegen::sql::{
    data_file_name, render_manifest, render_table_data, SqlSchemaGenerator, MANIFEST_FILE,
};
use crate::codegen::{GeneratedFile, Generator};
use crate::config::ExportConfig;
use crate::error::ExportError;
use crate::sink::OutputSink;

/// Statistics collected during one export run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExportStats {
    /// Enum types exported.
    pub types: usize,

    pub tables: usize,

    pub functions: usize,

    pub triggers: usize,

    /// Rows written to data files.
    pub rows_exported: usize,

    /// Rows replaced by a `-- skipped row` comment.
    pub rows_skipped: usize,

    /// Tables whose data file was omitted after a render error.
    pub failed_data_tables: Vec<String>,

    /// Model source files written.
    pub models: usize,

    /// All files written, manifest included.
    pub files: usize,

    /// Allow-listed names that matched no table.
    pub unmatched_filter: Vec<String>,

    /// Total elapsed wall-clock time.
    pub elapsed: Duration,
}

/// Export the catalog behind `provider`.
///
/// Everything is fetched and rendered before the first write, so provider
/// and build errors leave the output untouched. SQL files are written in
/// replay order, then model files, then the manifest.
pub async fn run_export(
    provider: &dyn CatalogProvider,
    sql_sink: &dyn OutputSink,
    model_sink: &dyn OutputSink,
    config: &ExportConfig,
    generated_at: DateTime<Utc>,
) -> Result<ExportStats, ExportError> {
    let started = Instant::now();
    let filter = config.table_filter.as_ref();
    let mut stats = ExportStats::default();

    tracing::info!("Fetching catalog...");
    let raw = provider.fetch_catalog(filter).await?;
    if let Some(filter) = filter {
        stats.unmatched_filter = unmatched_filter_names(&raw.tables, filter);
    }

    tracing::info!("Building schema snapshot...");
    let snapshot = build(raw, filter)?;
    stats.types = snapshot.enums.len();
    stats.tables = snapshot.tables.len();
    stats.functions = snapshot.functions.len();
    stats.triggers = snapshot.triggers.len();

    tracing::info!("Rendering SQL...");
    let mut schema_files = SqlSchemaGenerator.generate(&snapshot).into_iter();
    let mut sql_files: Vec<GeneratedFile> = schema_files.by_ref().take(2).collect();

    if config.schema_only {
        tracing::info!("Schema-only export, skipping table data");
    } else {
        for table in &snapshot.tables {
            tracing::debug!("Fetching rows of {}", table.name);
            let rows = provider.fetch_rows(&table.name).await?;
            match render_table_data(table, &rows) {
                Ok(section) => {
                    stats.rows_exported += section.rows_written;
                    stats.rows_skipped += section.rows_skipped;
                    sql_files.push(GeneratedFile::new(data_file_name(&table.name), section.sql));
                }
                Err(e) => {
                    tracing::warn!("Omitting data file for {}: {e}", table.name);
                    stats.failed_data_tables.push(table.name.clone());
                }
            }
        }
    }
    sql_files.extend(schema_files);

    let model_files = if config.generate_model_source {
        tracing::info!("Rendering model source...");
        let generator = DartModelGenerator {
            options: config.generator.clone(),
        };
        generator.generate(&snapshot)
    } else {
        Vec::new()
    };

    tracing::info!("Writing {} SQL files", sql_files.len() + 1);
    for file in &sql_files {
        sql_sink.write(&file.path, &file.contents).await?;
        stats.files += 1;
    }
    for file in &model_files {
        model_sink.write(&file.path, &file.contents).await?;
        stats.files += 1;
        stats.models += 1;
    }

    let listed: Vec<String> = sql_files
        .iter()
        .map(|f| f.path.display().to_string())
        .collect();
    let manifest = render_manifest(&listed, stats.tables, generated_at);
    sql_sink.write(Path::new(MANIFEST_FILE), &manifest).await?;
    stats.files += 1;

    stats.elapsed = started.elapsed();
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::catalog::{RawColumn, RawTable, TableFilter};
    use crate::error::BuildError;
    use crate::testutil::{users_catalog, MemorySink, StaticCatalog};

    fn generated_at() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2024-05-01T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn users_provider() -> StaticCatalog {
        StaticCatalog::new(users_catalog()).with_rows(
            "users",
            vec![
                json!({"id": 1, "email": "a@example.com", "created_at": "2024-01-01T00:00:00"}),
                json!({"id": 2, "email": "nul\u{0}", "created_at": "2024-01-01T00:00:00"}),
            ],
        )
    }

    #[tokio::test]
    async fn test_files_written_in_replay_order() {
        let provider = users_provider();
        let (sql, models) = (MemorySink::default(), MemorySink::default());
        let config = ExportConfig {
            generate_model_source: true,
            ..ExportConfig::default()
        };
        let stats = run_export(&provider, &sql, &models, &config, generated_at())
            .await
            .unwrap();

        assert_eq!(
            sql.paths(),
            vec![
                "01_types.sql",
                "02_tables.sql",
                "03_data_users.sql",
                "04_functions.sql",
                "05_triggers.sql",
                "manifest.sql",
            ]
        );
        assert_eq!(models.paths(), vec!["users.dart"]);
        assert_eq!(stats.tables, 1);
        assert_eq!(stats.models, 1);
        assert_eq!(stats.files, 7);

        let manifest = sql.contents("manifest.sql").unwrap();
        assert!(manifest.contains("-- Generated at: 2024-05-01T12:00:00Z\n"));
        assert!(manifest.ends_with("\\i 03_data_users.sql\n\\i 04_functions.sql\n\\i 05_triggers.sql\n"));
    }

    #[tokio::test]
    async fn test_bad_row_is_skipped_not_fatal() {
        let provider = users_provider();
        let (sql, models) = (MemorySink::default(), MemorySink::default());
        let stats = run_export(&provider, &sql, &models, &ExportConfig::default(), generated_at())
            .await
            .unwrap();

        assert_eq!(stats.rows_exported, 1);
        assert_eq!(stats.rows_skipped, 1);
        let data = sql.contents("03_data_users.sql").unwrap();
        assert!(data.contains("-- skipped row 2:"));
        assert!(data.contains("(1, 'a@example.com', '2024-01-01T00:00:00');"));
        assert!(models.paths().is_empty());
    }

    #[tokio::test]
    async fn test_schema_only_omits_data() {
        let provider = users_provider();
        let (sql, models) = (MemorySink::default(), MemorySink::default());
        let config = ExportConfig {
            schema_only: true,
            ..ExportConfig::default()
        };
        run_export(&provider, &sql, &models, &config, generated_at())
            .await
            .unwrap();

        assert!(!sql.paths().iter().any(|p| p.starts_with("03_data_")));
        assert!(!sql.contents("manifest.sql").unwrap().contains("03_data_"));
    }

    #[tokio::test]
    async fn test_zero_tables_writes_nothing() {
        let provider = users_provider();
        let (sql, models) = (MemorySink::default(), MemorySink::default());
        let config = ExportConfig {
            table_filter: Some(TableFilter::from(["missing".to_string()])),
            ..ExportConfig::default()
        };
        let err = run_export(&provider, &sql, &models, &config, generated_at())
            .await
            .unwrap_err();

        assert!(matches!(err, ExportError::Build(BuildError::NoTables)));
        assert_eq!(err.stage(), "build");
        assert!(sql.paths().is_empty());
    }

    #[tokio::test]
    async fn test_row_fetch_failure_aborts_before_writing() {
        let mut provider = users_provider();
        provider.failing_table = Some("users".to_string());
        let (sql, models) = (MemorySink::default(), MemorySink::default());
        let err = run_export(&provider, &sql, &models, &ExportConfig::default(), generated_at())
            .await
            .unwrap_err();

        assert_eq!(err.stage(), "fetch");
        assert!(sql.paths().is_empty());
    }

    #[tokio::test]
    async fn test_table_without_columns_loses_only_its_data_file() {
        let mut raw = users_catalog();
        raw.tables.push(RawTable {
            name: "empty".to_string(),
        });
        raw.columns.insert("empty".to_string(), Vec::<RawColumn>::new());
        let provider = StaticCatalog::new(raw);
        let (sql, models) = (MemorySink::default(), MemorySink::default());
        let stats = run_export(&provider, &sql, &models, &ExportConfig::default(), generated_at())
            .await
            .unwrap();

        assert_eq!(stats.failed_data_tables, vec!["empty"]);
        assert!(sql.paths().contains(&"03_data_users.sql".to_string()));
        assert!(!sql.paths().contains(&"03_data_empty.sql".to_string()));
        assert_eq!(sql.paths().last().map(String::as_str), Some("manifest.sql"));
    }

    #[tokio::test]
    async fn test_unmatched_filter_names_are_reported() {
        let provider = users_provider();
        let (sql, models) = (MemorySink::default(), MemorySink::default());
        let config = ExportConfig {
            schema_only: true,
            table_filter: Some(TableFilter::from(["users".to_string(), "ghost".to_string()])),
            ..ExportConfig::default()
        };
        let stats = run_export(&provider, &sql, &models, &config, generated_at())
            .await
            .unwrap();
        assert_eq!(stats.unmatched_filter, vec!["ghost"]);
        assert_eq!(stats.tables, 1);
    }
}
