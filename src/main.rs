mod cli;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use wf_core::config::Config;
use wf_db::pool::init_pool;
use wf_db::SqliteStore;
use wf_server::audit::{audit, AuditReport};
use wf_server::logging::init_logging;
use wf_server::storage::StorageLayout;

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Start {
            host,
            port,
            app_dir,
        } => {
            let mut config = Config::load_or_default(cli.config.as_deref());
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            apply_app_dir(&mut config, app_dir);

            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(async {
                let _log = init_logging(&config, cli.verbose).await?;
                tracing::info!(
                    "Starting watchify on {}:{} (app dir {})",
                    config.server.host,
                    config.server.port,
                    config.storage.app_dir.display()
                );
                wf_server::start(config).await?;
                Ok::<(), anyhow::Error>(())
            })
        }
        Commands::Audit { app_dir, json } => {
            let mut config = Config::load_or_default(cli.config.as_deref());
            apply_app_dir(&mut config, app_dir);
            let rt = tokio::runtime::Runtime::new()?;
            let report = rt.block_on(run_audit(&config))?;
            print_audit(&report, json)
        }
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("watchify {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn apply_app_dir(config: &mut Config, app_dir: Option<PathBuf>) {
    if let Some(dir) = app_dir {
        config.storage.app_dir = dir;
    }
}

async fn run_audit(config: &Config) -> Result<AuditReport> {
    let db_path = config.db_path();
    if !db_path.exists() {
        anyhow::bail!("No database at {}", db_path.display());
    }
    let pool = init_pool(&db_path.to_string_lossy())
        .with_context(|| format!("Failed to open {}", db_path.display()))?;
    let store = SqliteStore::new(pool);
    let layout = StorageLayout::new(config.storage.app_dir.clone());
    Ok(audit(&store, &layout).await?)
}

fn print_audit(report: &AuditReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    if report.is_clean() {
        println!("Storage is consistent.");
        return Ok(());
    }

    if !report.dangling_rows.is_empty() {
        println!("Rows without a blob:");
        for dangling in &report.dangling_rows {
            println!(
                "  {} {} -> {}/{}",
                dangling.row.table, dangling.row.id, dangling.collection, dangling.row.file_name
            );
        }
    }
    if !report.orphaned_blobs.is_empty() {
        println!("Blobs without a row:");
        for orphan in &report.orphaned_blobs {
            println!("  {}/{}", orphan.collection, orphan.file_name);
        }
    }
    Ok(())
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    let Some(path) = path else {
        println!("No config file given; defaults are valid.");
        return Ok(());
    };

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let config = Config::from_json(&content)?;

    let warnings = config.validate();
    if warnings.is_empty() {
        println!("Configuration is valid.");
    } else {
        println!("Configuration has warnings:");
        for warning in warnings {
            println!("  - {warning}");
        }
    }
    Ok(())
}
