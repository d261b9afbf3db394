mod builder;
mod catalog;
mod check_clause;
mod cli;
mod codegen;
mod config;
mod error;
mod export;
mod naming;
mod schema;
mod sink;
#[cfg(test)]
mod testutil;
mod typemap;

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::catalog::pg::PgCatalog;
use crate::cli::Cli;
use crate::error::ExportError;
use crate::export::{run_export, ExportStats};
use crate::sink::FsSink;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // A missing .env file is fine.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    match export(&cli).await {
        Ok(stats) => {
            print_summary(&cli, &stats);
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            eprintln!("Export failed during {}: {e}", e.stage());
            if cli.verbose {
                eprintln!("{e:?}");
            }
            Ok(ExitCode::FAILURE)
        }
    }
}

async fn export(cli: &Cli) -> Result<ExportStats, ExportError> {
    let url = cli.parse_connection()?;
    let config = cli.export_config();

    match cli::url_user(&url) {
        Some(user) => tracing::debug!("Connecting to {} as {user}...", cli::redacted(&url)),
        None => tracing::debug!("Connecting to {}...", cli::redacted(&url)),
    }
    let catalog = PgCatalog::connect(&url, &cli.schema)
        .await
        .map_err(|e| ExportError::Connection(e.to_string()))?;

    let sql_sink = FsSink::new(&config.output_directory);
    let model_sink = FsSink::new(&config.model_output_directory);
    let result = run_export(
        &catalog,
        &sql_sink,
        &model_sink,
        &config,
        chrono::Utc::now(),
    )
    .await;
    catalog.close().await;
    result
}

fn print_summary(cli: &Cli, stats: &ExportStats) {
    println!(
        "Exported {} types, {} tables, {} functions, {} triggers",
        stats.types, stats.tables, stats.functions, stats.triggers
    );
    if !cli.schema_only {
        println!(
            "Rows: {} exported, {} skipped",
            stats.rows_exported, stats.rows_skipped
        );
    }
    if !stats.failed_data_tables.is_empty() {
        println!("Data omitted for: {}", stats.failed_data_tables.join(", "));
    }
    if !stats.unmatched_filter.is_empty() {
        println!("Not found: {}", stats.unmatched_filter.join(", "));
    }
    if cli.models {
        println!("Models: {} written to {}", stats.models, cli.models_out.display());
    }
    println!(
        "Files: {} written to {} in {:.2?}",
        stats.files,
        cli.out.display(),
        stats.elapsed
    );
}
